//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub run_migrations: bool,
    /// Key for the chat-completion backend. Without it both AI endpoints
    /// answer with an error instead of results.
    pub ai_api_key: Option<String>,
    /// Base URL of an OpenAI-compatible gateway, if not talking to OpenAI directly.
    pub ai_api_base: Option<String>,
    pub search_model: String,
    pub suggestion_model: String,
    /// `None` allows any origin.
    pub allowed_origin: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Load Server and Database Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let run_migrations = match lookup("RUN_MIGRATIONS") {
            None => true,
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                ConfigError::InvalidValue("RUN_MIGRATIONS".to_string(), raw.clone())
            })?,
        };

        // --- Load AI Settings (key is optional) ---
        let ai_api_key = lookup("AI_API_KEY").filter(|k| !k.trim().is_empty());
        let ai_api_base = lookup("AI_API_BASE").filter(|b| !b.trim().is_empty());
        let search_model = lookup("SEARCH_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());
        let suggestion_model =
            lookup("SUGGESTION_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

        let allowed_origin = lookup("ALLOWED_ORIGIN").filter(|o| o.trim() != "*" && !o.is_empty());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            run_migrations,
            ai_api_key,
            ai_api_base,
            search_model,
            suggestion_model,
            allowed_origin,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

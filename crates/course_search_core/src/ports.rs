//! crates/course_search_core/src/ports.rs
//!
//! Defines the service contracts (traits) the search pipeline depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! pipeline independent of the database and of the language-model vendor.

use crate::domain::{Course, CourseProgress, Favorite};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Upstream service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read access to the course catalog and to per-user history.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Every course in the catalog.
    async fn list_courses(&self) -> PortResult<Vec<Course>>;

    /// Courses whose title or category contains `needle`, case-insensitively.
    async fn find_by_title_or_category(&self, needle: &str, limit: usize)
        -> PortResult<Vec<Course>>;

    async fn get_progress_for_user(&self, user_id: &str) -> PortResult<Vec<CourseProgress>>;

    async fn get_favorites_for_user(&self, user_id: &str) -> PortResult<Vec<Favorite>>;
}

/// A single-turn request to a chat-completion model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub user: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[async_trait]
pub trait ChatCompletionService: Send + Sync {
    /// Sends one prompt and returns the text of the first choice.
    ///
    /// `Ok(None)` means the call succeeded but carried no text. Transport failures
    /// and non-success statuses are reported as [`PortError::Unavailable`].
    async fn complete(&self, request: ChatRequest) -> PortResult<Option<String>>;
}

pub mod protocol;
pub mod rest;
pub mod state;

use crate::config::Config;
use crate::error::ApiError;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub use rest::{
    autocomplete_handler, list_courses_handler, semantic_search_handler, suggestions_handler,
};
use state::AppState;

/// Builds the API router with CORS and request tracing applied to every route.
pub fn router(state: Arc<AppState>) -> Result<Router, ApiError> {
    let cors = cors_layer(&state.config)?;
    Ok(Router::new()
        .route("/functions/semantic-search", post(semantic_search_handler))
        .route("/functions/suggestions", post(suggestions_handler))
        .route("/courses", get(list_courses_handler))
        .route("/courses/autocomplete", get(autocomplete_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Browser clients call the functions cross-origin and send the hosted
/// platform's client headers along with the request.
fn cors_layer(config: &Config) -> Result<CorsLayer, ApiError> {
    let origin = match &config.allowed_origin {
        None => AllowOrigin::any(),
        Some(origin) => AllowOrigin::exact(HeaderValue::from_str(origin).map_err(|e| {
            ApiError::Internal(format!("Invalid ALLOWED_ORIGIN '{}': {}", origin, e))
        })?),
    };
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]))
}

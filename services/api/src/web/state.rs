//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::error::ApiError;
use course_search_core::catalog::CandidateFetcher;
use course_search_core::composer::SuggestionComposer;
use course_search_core::ports::{ChatCompletionService, CourseRepository};
use course_search_core::resolver::RelevanceResolver;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The AI-backed components are `None` when no chat backend is configured; the
/// endpoints that need them then fail with an explicit error.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: CandidateFetcher,
    pub resolver: Option<Arc<RelevanceResolver>>,
    pub composer: Option<Arc<SuggestionComposer>>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        repo: Arc<dyn CourseRepository>,
        search_chat: Option<Arc<dyn ChatCompletionService>>,
        suggestion_chat: Option<Arc<dyn ChatCompletionService>>,
    ) -> Self {
        let resolver = search_chat.map(|chat| Arc::new(RelevanceResolver::new(repo.clone(), chat)));
        let composer =
            suggestion_chat.map(|chat| Arc::new(SuggestionComposer::new(repo.clone(), chat)));
        Self {
            config,
            catalog: CandidateFetcher::new(repo),
            resolver,
            composer,
        }
    }

    pub fn resolver(&self) -> Result<&RelevanceResolver, ApiError> {
        self.resolver
            .as_deref()
            .ok_or_else(|| ApiError::ServiceUnavailable("AI service unavailable".to_string()))
    }

    pub fn composer(&self) -> Result<&SuggestionComposer, ApiError> {
        self.composer
            .as_deref()
            .ok_or_else(|| ApiError::ServiceUnavailable("AI service unavailable".to_string()))
    }
}

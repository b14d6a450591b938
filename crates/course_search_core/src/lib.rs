pub mod ai_output;
pub mod catalog;
pub mod client;
pub mod composer;
pub mod domain;
pub mod materializer;
pub mod memory;
pub mod normalizer;
pub mod ports;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use catalog::CandidateFetcher;
pub use client::{AutocompleteGate, SearchSession, SuggestionCache, Ticket};
pub use composer::{SuggestionComposer, SUGGESTION_COUNT};
pub use domain::{
    CatalogFilters, Course, CourseLevel, CourseProgress, DurationBucket, Favorite,
    ResolvedSuggestion, SearchMethod, SearchProfile, SearchQuery, SearchResult, SuggestedCourse,
    UserProfile, GENERIC_REASON, REASON_MAX_CHARS,
};
pub use memory::InMemoryCourseRepository;
pub use ports::{ChatCompletionService, ChatRequest, CourseRepository, PortError, PortResult};
pub use resolver::{RelevanceResolver, SEARCH_RESULT_CAP};

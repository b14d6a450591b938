//! crates/course_search_core/src/resolver.rs
//!
//! The relevance resolver: turns a free-text query (and an optional user profile)
//! into an ordered list of courses.
//!
//! Each request makes exactly one model call. When that call fails, returns no
//! text, or returns something that is not a JSON array of identifiers, the
//! resolver answers with keyword matching instead. Callers therefore only see an
//! error when the catalog itself cannot be read.

use crate::ai_output::parse_id_array;
use crate::catalog::{keyword_matches, CandidateFetcher};
use crate::domain::{Course, SearchMethod, SearchQuery, SearchResult};
use crate::materializer::materialize;
use crate::ports::{ChatCompletionService, ChatRequest, CourseRepository, PortResult};
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Hard maximum of courses a search returns.
pub const SEARCH_RESULT_CAP: usize = 8;

const SYSTEM_INSTRUCTIONS: &str = "You are a semantic course search system. Analyse the \
user's intent and reply with nothing but a valid JSON array of the IDs of the most \
relevant courses.";

/// Why the model path was abandoned for a request.
#[derive(Debug, thiserror::Error)]
enum AiFailure {
    #[error("model call failed: {0}")]
    Call(String),
    #[error("model returned no text")]
    EmptyReply,
    #[error("model reply could not be parsed: {0}")]
    Unparsable(String),
}

pub struct RelevanceResolver {
    fetcher: CandidateFetcher,
    chat: Arc<dyn ChatCompletionService>,
}

impl RelevanceResolver {
    pub fn new(repo: Arc<dyn CourseRepository>, chat: Arc<dyn ChatCompletionService>) -> Self {
        Self {
            fetcher: CandidateFetcher::new(repo),
            chat,
        }
    }

    /// Normalizes `raw_query` and resolves it.
    ///
    /// Blank queries short-circuit to an empty result: neither the catalog nor
    /// the model is consulted.
    pub async fn search(
        &self,
        raw_query: &str,
        profile: Option<serde_json::Value>,
    ) -> PortResult<SearchResult> {
        match SearchQuery::parse(raw_query, profile) {
            Some(query) => self.resolve(&query).await,
            None => {
                debug!("Blank search query, skipping resolution");
                Ok(SearchResult::empty())
            }
        }
    }

    /// Resolves an already-normalized query.
    pub async fn resolve(&self, query: &SearchQuery) -> PortResult<SearchResult> {
        let catalog = self.fetcher.fetch_catalog().await?;

        match self.rank_with_model(query, &catalog).await {
            Ok(ids) => {
                let mut courses = materialize(&ids, &catalog);
                courses.truncate(SEARCH_RESULT_CAP);
                info!(
                    query = query.text(),
                    returned_ids = ids.len(),
                    matched = courses.len(),
                    "Resolved search with model ranking"
                );
                Ok(SearchResult {
                    courses,
                    method: SearchMethod::Ai,
                })
            }
            Err(failure) => {
                warn!(
                    query = query.text(),
                    %failure,
                    "Model ranking failed, using keyword fallback"
                );
                Ok(SearchResult {
                    courses: keyword_matches(&catalog, query.text(), SEARCH_RESULT_CAP),
                    method: SearchMethod::Fallback,
                })
            }
        }
    }

    async fn rank_with_model(
        &self,
        query: &SearchQuery,
        catalog: &[Course],
    ) -> Result<Vec<String>, AiFailure> {
        let request =
            ChatRequest::new(build_search_prompt(query, catalog)).with_system(SYSTEM_INSTRUCTIONS);

        let reply = self
            .chat
            .complete(request)
            .await
            .map_err(|e| AiFailure::Call(e.to_string()))?
            .filter(|text| !text.trim().is_empty())
            .ok_or(AiFailure::EmptyReply)?;

        parse_id_array(&reply).map_err(|e| AiFailure::Unparsable(format!("{e}; reply: {reply}")))
    }
}

/// Builds the user message: the query, the optional profile, and one line per
/// candidate course.
pub fn build_search_prompt(query: &SearchQuery, catalog: &[Course]) -> String {
    let mut prompt = format!("The user searched for: \"{}\"\n\n", query.text());

    if let Some(profile) = query.profile() {
        let _ = writeln!(prompt, "User profile: {profile}\n");
    }

    prompt.push_str("Available courses:\n");
    for course in catalog {
        let _ = writeln!(
            prompt,
            "- [{}] {} ({}, {}) - {}",
            course.id,
            course.title,
            course.category.as_deref().unwrap_or("uncategorized"),
            course.level.map(|l| l.as_str()).unwrap_or("any level"),
            course.description.as_deref().unwrap_or(""),
        );
    }

    let _ = write!(
        prompt,
        "\nAnalyse the search and reply ONLY with a JSON array of the IDs (the values in \
square brackets) of the most relevant courses, ordered by relevance.\n\
Consider synonyms, context and the intent behind the search.\n\n\
Expected format: [\"id1\", \"id2\", \"id3\"]\n\
At most {SEARCH_RESULT_CAP} results."
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SearchProfile;
    use crate::memory::InMemoryCourseRepository;
    use crate::ports::PortError;
    use crate::testing::{completed, titled, ScriptedChat};
    use pretty_assertions::assert_eq;

    fn catalog() -> Vec<Course> {
        vec![
            titled("a", "React do Zero", "Programação"),
            titled("b", "Growth Hacking", "Marketing"),
            titled("c", "TypeScript Avançado", "Programação"),
        ]
    }

    fn ids(result: &SearchResult) -> Vec<&str> {
        result.courses.iter().map(|c| c.id.as_str()).collect()
    }

    fn setup(
        chat: ScriptedChat,
    ) -> (Arc<InMemoryCourseRepository>, Arc<ScriptedChat>, RelevanceResolver) {
        let repo = Arc::new(InMemoryCourseRepository::with_courses(catalog()));
        let chat = Arc::new(chat);
        let resolver = RelevanceResolver::new(repo.clone(), chat.clone());
        (repo, chat, resolver)
    }

    #[tokio::test]
    async fn test_blank_query_touches_nothing() {
        let (repo, chat, resolver) = setup(ScriptedChat::reply("[\"a\"]"));

        for raw in ["", "   ", "\t\n"] {
            let result = resolver.search(raw, None).await.unwrap();
            assert!(result.courses.is_empty());
        }

        assert_eq!(repo.catalog_fetches(), 0);
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_order_is_preserved() {
        let (_, _, resolver) = setup(ScriptedChat::reply("```json\n[\"c\", \"a\", \"b\"]\n```"));

        let result = resolver.search("front-end", None).await.unwrap();

        assert_eq!(result.method, SearchMethod::Ai);
        assert_eq!(ids(&result), vec!["c", "a", "b"]);
        assert_eq!(result.total(), 3);
    }

    #[tokio::test]
    async fn test_hallucinated_ids_are_dropped() {
        let (_, _, resolver) = setup(ScriptedChat::reply("[\"zzz\", \"b\", \"deleted-course\"]"));

        let result = resolver.search("marketing", None).await.unwrap();

        assert_eq!(result.method, SearchMethod::Ai);
        assert_eq!(ids(&result), vec!["b"]);
    }

    #[tokio::test]
    async fn test_model_results_are_capped() {
        let many: Vec<_> = (0..12)
            .map(|i| titled(&format!("c{i}"), "Rust", "Programação"))
            .collect();
        let all_ids: Vec<_> = many.iter().map(|c| c.id.clone()).collect();
        let reply = serde_json::to_string(&all_ids).unwrap();
        let repo = Arc::new(InMemoryCourseRepository::with_courses(many));
        let resolver = RelevanceResolver::new(repo, Arc::new(ScriptedChat::reply(&reply)));

        let result = resolver.search("rust", None).await.unwrap();

        assert_eq!(result.courses.len(), SEARCH_RESULT_CAP);
    }

    #[tokio::test]
    async fn test_fallback_results_are_capped() {
        let many: Vec<_> = (0..12)
            .map(|i| titled(&format!("c{i}"), &format!("Rust {i}"), "Programação"))
            .collect();
        let repo = Arc::new(InMemoryCourseRepository::with_courses(many));
        let chat = ScriptedChat::fail(PortError::Unavailable("timeout".into()));
        let resolver = RelevanceResolver::new(repo, Arc::new(chat));

        let result = resolver.search("rust", None).await.unwrap();

        assert_eq!(result.method, SearchMethod::Fallback);
        assert_eq!(result.courses.len(), SEARCH_RESULT_CAP);
        assert_eq!(result.courses[0].id, "c0");
        assert_eq!(result.courses[7].id, "c7");
    }

    #[tokio::test]
    async fn test_call_failure_falls_back_to_keywords() {
        let (_, chat, resolver) =
            setup(ScriptedChat::fail(PortError::Unavailable("502 Bad Gateway".into())));

        let result = resolver.search("react", None).await.unwrap();

        assert_eq!(result.method, SearchMethod::Fallback);
        assert_eq!(ids(&result), vec!["a"]);
        assert_eq!(chat.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_reply_falls_back() {
        for chat in [ScriptedChat::empty(), ScriptedChat::reply("   ")] {
            let (_, _, resolver) = setup(chat);
            let result = resolver.search("programação", None).await.unwrap();
            assert_eq!(result.method, SearchMethod::Fallback);
            assert_eq!(ids(&result), vec!["a", "c"]);
        }
    }

    #[tokio::test]
    async fn test_unparsable_reply_falls_back() {
        let (_, _, resolver) = setup(ScriptedChat::reply("The best course is React do Zero."));

        let result = resolver.search("REACT", None).await.unwrap();

        assert_eq!(result.method, SearchMethod::Fallback);
        assert_eq!(ids(&result), vec!["a"]);
    }

    #[tokio::test]
    async fn test_catalog_failure_is_reported() {
        let (repo, chat, resolver) = setup(ScriptedChat::reply("[]"));
        repo.set_unavailable(true);

        assert!(resolver.search("react", None).await.is_err());
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn test_prompt_carries_query_profile_and_candidates() {
        let (_, chat, resolver) = setup(ScriptedChat::reply("[]"));
        let profile = serde_json::json!({"preferences": ["Marketing"]});

        resolver.search("  growth  ", Some(profile)).await.unwrap();

        let request = chat.last_request().unwrap();
        assert_eq!(request.system.as_deref(), Some(SYSTEM_INSTRUCTIONS));
        assert!(request.user.contains("\"growth\""));
        assert!(request.user.contains(r#"{"preferences":["Marketing"]}"#));
        assert!(request.user.contains("- [b] Growth Hacking (Marketing, any level)"));
        assert!(request.user.contains("At most 8 results."));
    }

    #[tokio::test]
    async fn test_profile_built_from_progress_reaches_prompt() {
        let (repo, chat, resolver) = setup(ScriptedChat::reply("[]"));
        let catalog = repo.list_courses().await.unwrap();
        let profile = SearchProfile::from_progress(&[completed("u1", "b")], &catalog);

        resolver.search("ads", Some(profile.to_json())).await.unwrap();

        let request = chat.last_request().unwrap();
        assert!(request
            .user
            .contains(r#"{"completedCourses":["Growth Hacking"],"preferences":["Marketing"]}"#));
    }
}

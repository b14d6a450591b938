//! crates/course_search_core/src/composer.rs
//!
//! The suggestion composer: picks a handful of courses for a user, each with a
//! short reason, from the user's completion history and favorites.
//!
//! A failed or unusable model reply is answered with a random selection from the
//! catalog. The random source is owned by the composer so tests can seed it.

use crate::ai_output::parse_suggestions;
use crate::catalog::CandidateFetcher;
use crate::domain::{
    Course, ResolvedSuggestion, SuggestedCourse, UserProfile, GENERIC_REASON, REASON_MAX_CHARS,
};
use crate::materializer::materialize_suggestions;
use crate::ports::{ChatCompletionService, ChatRequest, CourseRepository, PortError, PortResult};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How many courses the composer asks for, and the most it returns.
pub const SUGGESTION_COUNT: usize = 4;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 500;

#[derive(Debug, thiserror::Error)]
enum AiFailure {
    #[error("model call failed: {0}")]
    Call(String),
    #[error("model returned no text")]
    EmptyReply,
    #[error("model reply could not be parsed: {0}")]
    Unparsable(String),
}

pub struct SuggestionComposer {
    fetcher: CandidateFetcher,
    chat: Arc<dyn ChatCompletionService>,
    rng: Mutex<StdRng>,
}

impl SuggestionComposer {
    /// Creates a composer whose random fallback is seeded from OS entropy.
    pub fn new(repo: Arc<dyn CourseRepository>, chat: Arc<dyn ChatCompletionService>) -> Self {
        Self::with_rng(repo, chat, StdRng::from_entropy())
    }

    /// Creates a composer with a reproducible random fallback.
    pub fn with_seed(
        repo: Arc<dyn CourseRepository>,
        chat: Arc<dyn ChatCompletionService>,
        seed: u64,
    ) -> Self {
        Self::with_rng(repo, chat, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        repo: Arc<dyn CourseRepository>,
        chat: Arc<dyn ChatCompletionService>,
        rng: StdRng,
    ) -> Self {
        Self {
            fetcher: CandidateFetcher::new(repo),
            chat,
            rng: Mutex::new(rng),
        }
    }

    /// Suggests up to [`SUGGESTION_COUNT`] courses for `user_id`.
    ///
    /// Only a blank `user_id` or an unreadable catalog is an error. Missing
    /// progress or favorites degrade to an empty history.
    pub async fn compose(&self, user_id: &str) -> PortResult<Vec<SuggestedCourse>> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(PortError::InvalidInput("user_id is required".to_string()));
        }

        let repo = self.fetcher.repository();
        let (catalog, progress, favorites) = futures::join!(
            self.fetcher.fetch_catalog(),
            repo.get_progress_for_user(user_id),
            repo.get_favorites_for_user(user_id)
        );
        let catalog = catalog?;
        let progress = progress.unwrap_or_else(|e| {
            warn!(user_id, error = %e, "Could not load progress, assuming none");
            Vec::new()
        });
        let favorites = favorites.unwrap_or_else(|e| {
            warn!(user_id, error = %e, "Could not load favorites, assuming none");
            Vec::new()
        });

        if catalog.is_empty() {
            debug!(user_id, "Catalog is empty, nothing to suggest");
            return Ok(Vec::new());
        }

        let profile = UserProfile::from_history(&progress, &favorites, &catalog);
        let picks = match self.pick_with_model(&profile, &catalog).await {
            Ok(picks) => picks,
            Err(failure) => {
                warn!(user_id, %failure, "Model suggestions failed, picking at random");
                self.random_picks(&catalog)
            }
        };

        let mut suggestions = materialize_suggestions(&picks, &catalog);
        suggestions.truncate(SUGGESTION_COUNT);
        info!(user_id, count = suggestions.len(), "Composed suggestions");
        Ok(suggestions)
    }

    async fn pick_with_model(
        &self,
        profile: &UserProfile,
        catalog: &[Course],
    ) -> Result<Vec<ResolvedSuggestion>, AiFailure> {
        let request = ChatRequest::new(build_suggestion_prompt(profile, catalog))
            .with_temperature(TEMPERATURE)
            .with_max_tokens(MAX_TOKENS);

        let reply = self
            .chat
            .complete(request)
            .await
            .map_err(|e| AiFailure::Call(e.to_string()))?
            .filter(|text| !text.trim().is_empty())
            .ok_or(AiFailure::EmptyReply)?;
        debug!(reply = %reply, "Model suggestion reply");

        parse_suggestions(&reply).map_err(|e| AiFailure::Unparsable(e.to_string()))
    }

    /// Up to [`SUGGESTION_COUNT`] distinct catalog courses in random order.
    fn random_picks(&self, catalog: &[Course]) -> Vec<ResolvedSuggestion> {
        let mut rng = self.rng.lock();
        catalog
            .choose_multiple(&mut *rng, SUGGESTION_COUNT)
            .map(|course| ResolvedSuggestion::new(course.id.clone(), GENERIC_REASON))
            .collect()
    }
}

/// Builds the single user message sent to the model.
pub fn build_suggestion_prompt(profile: &UserProfile, catalog: &[Course]) -> String {
    let favorite_categories = if profile.favorite_categories.is_empty() {
        "None yet".to_string()
    } else {
        profile.favorite_categories.join(", ")
    };

    let mut prompt = format!(
        "You are an assistant that recommends online courses. Based on the user's profile, \
suggest {SUGGESTION_COUNT} specific courses from the list below.\n\n\
User profile:\n\
- Completed courses: {}\n\
- Courses in progress: {}\n\
- Favorite categories: {}\n\
- Preferred level: {}\n\n\
Available courses:\n",
        profile.completed_courses,
        profile.in_progress_courses,
        favorite_categories,
        profile.preferred_level,
    );

    for course in catalog {
        let _ = writeln!(
            prompt,
            "- [{}] {} ({}, {}): {}",
            course.id,
            course.title,
            course.category.as_deref().unwrap_or("uncategorized"),
            course.level.map(|l| l.as_str()).unwrap_or("any level"),
            course.description.as_deref().unwrap_or(""),
        );
    }

    let guidance = if profile.is_experienced() {
        "The user already has experience, so suggest more advanced courses."
    } else {
        "The user is a beginner, so prioritise basic courses."
    };

    let _ = write!(
        prompt,
        "\nReply ONLY with JSON in this format, using the IDs in square brackets:\n\
{{\n  \"suggestions\": [\n    {{\n      \"course_id\": \"course_id\",\n      \
\"reason\": \"Why it fits (at most {REASON_MAX_CHARS} characters)\"\n    }}\n  ]\n}}\n\n\
Choose {SUGGESTION_COUNT} courses that make sense for this profile. {guidance}"
    );
    prompt
}

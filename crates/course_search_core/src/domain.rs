//! crates/course_search_core/src/domain.rs
//!
//! Defines the core data structures for the course search pipeline.
//! These structs are independent of any database or HTTP framework; serde is
//! used only where values are embedded in prompts or parsed back from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Course Catalog
//=========================================================================================

/// The controlled vocabulary for a course's difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => "beginner",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored level label is outside the controlled vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown course level '{0}'")]
pub struct UnknownLevel(pub String);

impl FromStr for CourseLevel {
    type Err = UnknownLevel;

    /// Accepts the English labels plus the Portuguese ones the catalog was
    /// first seeded with.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "iniciante" => Ok(CourseLevel::Beginner),
            "intermediate" | "intermediário" | "intermediario" => Ok(CourseLevel::Intermediate),
            "advanced" | "avançado" | "avancado" => Ok(CourseLevel::Advanced),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

/// One learning unit in the catalog. Read-only from the pipeline's point of view.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub duration_minutes: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Case-insensitive substring match over title, description and category.
    ///
    /// `needle_lower` must already be lowercased.
    pub fn mentions(&self, needle_lower: &str) -> bool {
        contains_lower(Some(&self.title), needle_lower)
            || contains_lower(self.description.as_deref(), needle_lower)
            || contains_lower(self.category.as_deref(), needle_lower)
    }
}

pub(crate) fn contains_lower<S: AsRef<str>>(haystack: Option<S>, needle_lower: &str) -> bool {
    haystack
        .map(|h| h.as_ref().to_lowercase().contains(needle_lower))
        .unwrap_or(false)
}

//=========================================================================================
// User History
//=========================================================================================

/// A user's progress through a single course.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseProgress {
    pub user_id: String,
    pub course_id: String,
    pub progress_percentage: i32,
    pub is_completed: bool,
    pub watch_time_minutes: i32,
}

impl CourseProgress {
    /// Started but not finished.
    pub fn is_in_progress(&self) -> bool {
        !self.is_completed && self.progress_percentage > 0
    }
}

/// A course the user has marked as a favorite.
#[derive(Debug, Clone, PartialEq)]
pub struct Favorite {
    pub user_id: String,
    pub course_id: String,
    pub created_at: DateTime<Utc>,
}

/// Summary of a user's history, derived on demand and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub completed_courses: usize,
    pub in_progress_courses: usize,
    pub favorite_categories: Vec<String>,
    pub preferred_level: CourseLevel,
}

/// Completions above this count move a user past the beginner level.
pub const INTERMEDIATE_THRESHOLD: usize = 3;

impl UserProfile {
    /// Derives the profile from the user's progress and favorite records.
    ///
    /// Favorite categories are resolved through `catalog`; favorites whose course
    /// is gone or has no category are skipped, and repeats keep their first position.
    pub fn from_history(
        progress: &[CourseProgress],
        favorites: &[Favorite],
        catalog: &[Course],
    ) -> Self {
        let completed_courses = progress.iter().filter(|p| p.is_completed).count();
        let in_progress_courses = progress.iter().filter(|p| p.is_in_progress()).count();

        let mut seen = HashSet::new();
        let favorite_categories = favorites
            .iter()
            .filter_map(|fav| catalog.iter().find(|c| c.id == fav.course_id))
            .filter_map(|course| course.category.clone())
            .filter(|category| seen.insert(category.clone()))
            .collect();

        let preferred_level = if completed_courses > INTERMEDIATE_THRESHOLD {
            CourseLevel::Intermediate
        } else {
            CourseLevel::Beginner
        };

        Self {
            completed_courses,
            in_progress_courses,
            favorite_categories,
            preferred_level,
        }
    }

    pub fn is_experienced(&self) -> bool {
        self.completed_courses > INTERMEDIATE_THRESHOLD
    }
}

/// The optional profile a browser attaches to a search request.
///
/// Search treats the profile as opaque context, so this is only a convenience
/// for callers that want to build one from progress records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProfile {
    pub completed_courses: Vec<String>,
    pub preferences: Vec<String>,
}

impl SearchProfile {
    pub fn from_progress(progress: &[CourseProgress], catalog: &[Course]) -> Self {
        let with_course: Vec<(&CourseProgress, &Course)> = progress
            .iter()
            .filter_map(|p| catalog.iter().find(|c| c.id == p.course_id).map(|c| (p, c)))
            .collect();

        let completed_courses = with_course
            .iter()
            .filter(|(p, _)| p.is_completed)
            .map(|(_, c)| c.title.clone())
            .collect();
        let preferences = with_course
            .iter()
            .filter_map(|(_, c)| c.category.clone())
            .collect();

        Self {
            completed_courses,
            preferences,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        // A struct of strings always serializes.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

//=========================================================================================
// Search
//=========================================================================================

/// A validated search request: trimmed, non-empty text plus optional profile.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    text: String,
    profile: Option<serde_json::Value>,
}

impl SearchQuery {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(raw: &str, profile: Option<serde_json::Value>) -> Option<Self> {
        crate::normalizer::normalize_query(raw).map(|text| Self {
            text: text.to_string(),
            profile: profile.filter(|p| !p.is_null()),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn profile(&self) -> Option<&serde_json::Value> {
        self.profile.as_ref()
    }
}

/// Which strategy produced a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Ai,
    Fallback,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMethod::Ai => "ai",
            SearchMethod::Fallback => "fallback",
        }
    }
}

/// Ordered courses plus the method that ordered them.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub courses: Vec<Course>,
    pub method: SearchMethod,
}

impl SearchResult {
    pub fn empty() -> Self {
        Self {
            courses: Vec::new(),
            method: SearchMethod::Fallback,
        }
    }

    pub fn total(&self) -> usize {
        self.courses.len()
    }
}

//=========================================================================================
// Suggestions
//=========================================================================================

/// The longest reason shown next to a suggested course, in characters.
pub const REASON_MAX_CHARS: usize = 50;

/// Shown when the model gave no usable reason, and for random picks.
pub const GENERIC_REASON: &str = "Recommended for you";

/// A course identifier paired with a short justification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSuggestion {
    pub course_id: String,
    pub reason: String,
}

impl ResolvedSuggestion {
    /// Blank reasons become [`GENERIC_REASON`]; long ones are cut to [`REASON_MAX_CHARS`].
    pub fn new(course_id: impl Into<String>, reason: &str) -> Self {
        let reason = reason.trim();
        let reason = if reason.is_empty() {
            GENERIC_REASON.to_string()
        } else {
            reason.chars().take(REASON_MAX_CHARS).collect::<String>().trim_end().to_string()
        };
        Self {
            course_id: course_id.into(),
            reason,
        }
    }
}

/// A full course record carrying the reason it was suggested.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestedCourse {
    pub course: Course,
    pub reason: String,
}

//=========================================================================================
// Catalog Browsing
//=========================================================================================

/// Duration ranges offered by the catalog filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationBucket {
    /// Up to an hour.
    Short,
    /// 61 to 180 minutes.
    Medium,
    /// Over three hours.
    Long,
}

impl DurationBucket {
    pub fn contains(&self, minutes: i32) -> bool {
        match self {
            DurationBucket::Short => minutes <= 60,
            DurationBucket::Medium => (61..=180).contains(&minutes),
            DurationBucket::Long => minutes >= 181,
        }
    }
}

/// Returned when a duration filter is not `short`, `medium` or `long`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown duration bucket '{0}'")]
pub struct UnknownDuration(pub String);

impl FromStr for DurationBucket {
    type Err = UnknownDuration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(DurationBucket::Short),
            "medium" => Ok(DurationBucket::Medium),
            "long" => Ok(DurationBucket::Long),
            _ => Err(UnknownDuration(s.to_string())),
        }
    }
}

/// Exact-match filters for the catalog view. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFilters {
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub instructor: Option<String>,
    pub duration: Option<DurationBucket>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn course(id: &str, category: Option<&str>) -> Course {
        Course {
            id: id.to_string(),
            title: format!("Course {id}"),
            description: None,
            instructor: None,
            category: category.map(str::to_string),
            level: None,
            duration_minutes: None,
            thumbnail_url: None,
            video_url: None,
            is_premium: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn progress(course_id: &str, pct: i32, done: bool) -> CourseProgress {
        CourseProgress {
            user_id: "u1".to_string(),
            course_id: course_id.to_string(),
            progress_percentage: pct,
            is_completed: done,
            watch_time_minutes: 0,
        }
    }

    fn favorite(course_id: &str) -> Favorite {
        Favorite {
            user_id: "u1".to_string(),
            course_id: course_id.to_string(),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[case("beginner", CourseLevel::Beginner)]
    #[case("Iniciante", CourseLevel::Beginner)]
    #[case(" intermediário ", CourseLevel::Intermediate)]
    #[case("ADVANCED", CourseLevel::Advanced)]
    #[case("avancado", CourseLevel::Advanced)]
    fn test_level_parses_known_labels(#[case] raw: &str, #[case] expected: CourseLevel) {
        assert_eq!(raw.parse::<CourseLevel>(), Ok(expected));
    }

    #[test]
    fn test_level_rejects_unknown_label() {
        assert!("expert".parse::<CourseLevel>().is_err());
    }

    #[test]
    fn test_profile_counts_and_level() {
        let catalog = vec![course("a", Some("Marketing")), course("b", Some("Design"))];
        let history = vec![
            progress("a", 100, true),
            progress("b", 40, false),
            progress("c", 0, false),
        ];

        let profile = UserProfile::from_history(&history, &[], &catalog);

        assert_eq!(profile.completed_courses, 1);
        // Zero progress does not count as started.
        assert_eq!(profile.in_progress_courses, 1);
        assert_eq!(profile.preferred_level, CourseLevel::Beginner);
    }

    #[rstest]
    #[case(3, CourseLevel::Beginner)]
    #[case(4, CourseLevel::Intermediate)]
    fn test_profile_level_threshold(#[case] completed: usize, #[case] expected: CourseLevel) {
        let history: Vec<_> = (0..completed)
            .map(|i| progress(&i.to_string(), 100, true))
            .collect();
        let profile = UserProfile::from_history(&history, &[], &[]);
        assert_eq!(profile.preferred_level, expected);
    }

    #[test]
    fn test_profile_favorite_categories_dedup_and_skip_missing() {
        let catalog = vec![
            course("a", Some("Marketing")),
            course("b", Some("Design")),
            course("c", Some("Marketing")),
            course("d", None),
        ];
        let favorites = vec![
            favorite("c"),
            favorite("gone"),
            favorite("b"),
            favorite("a"),
            favorite("d"),
        ];

        let profile = UserProfile::from_history(&[], &favorites, &catalog);

        assert_eq!(profile.favorite_categories, vec!["Marketing", "Design"]);
    }

    #[test]
    fn test_search_query_rejects_blank() {
        assert!(SearchQuery::parse("   \t", None).is_none());
        let q = SearchQuery::parse("  react  ", Some(serde_json::Value::Null)).unwrap();
        assert_eq!(q.text(), "react");
        assert!(q.profile().is_none());
    }

    #[test]
    fn test_reason_is_trimmed_capped_and_defaulted() {
        let long = "x".repeat(80);
        assert_eq!(ResolvedSuggestion::new("a", &long).reason.chars().count(), REASON_MAX_CHARS);
        assert_eq!(ResolvedSuggestion::new("a", "   ").reason, GENERIC_REASON);
        assert_eq!(ResolvedSuggestion::new("a", " Great start ").reason, "Great start");
    }

    #[rstest]
    #[case(DurationBucket::Short, 60, true)]
    #[case(DurationBucket::Short, 61, false)]
    #[case(DurationBucket::Medium, 61, true)]
    #[case(DurationBucket::Medium, 180, true)]
    #[case(DurationBucket::Long, 180, false)]
    #[case(DurationBucket::Long, 181, true)]
    fn test_duration_bucket_bounds(
        #[case] bucket: DurationBucket,
        #[case] minutes: i32,
        #[case] expected: bool,
    ) {
        assert_eq!(bucket.contains(minutes), expected);
    }

    #[test]
    fn test_search_profile_from_progress() {
        let catalog = vec![course("a", Some("Programação")), course("b", Some("Marketing"))];
        let history = vec![progress("a", 100, true), progress("b", 10, false)];

        let profile = SearchProfile::from_progress(&history, &catalog);

        assert_eq!(profile.completed_courses, vec!["Course a"]);
        assert_eq!(profile.preferences, vec!["Programação", "Marketing"]);
        assert_eq!(
            profile.to_json(),
            serde_json::json!({
                "completedCourses": ["Course a"],
                "preferences": ["Programação", "Marketing"],
            })
        );
    }
}

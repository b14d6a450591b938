//! services/api/src/web/protocol.rs
//!
//! Defines the JSON request and response bodies exchanged with browser clients.
//! Domain types from the core crate are mapped onto these DTOs so the wire
//! format and the OpenAPI schema live in one place.

use chrono::{DateTime, Utc};
use course_search_core::domain::{Course, SearchResult, SuggestedCourse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Requests
//=========================================================================================

/// Body of `POST /functions/semantic-search`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    /// Free-form context about the user, passed to the model as-is.
    #[serde(default, rename = "userProfile")]
    #[schema(value_type = Option<Object>)]
    pub user_profile: Option<serde_json::Value>,
}

/// Body of `POST /functions/suggestions`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SuggestionsRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Query string of `GET /courses`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogParams {
    /// Text matched against title, description and instructor.
    pub q: Option<String>,
    pub category: Option<String>,
    /// `beginner`, `intermediate` or `advanced`.
    pub level: Option<String>,
    pub instructor: Option<String>,
    /// `short`, `medium` or `long`.
    pub duration: Option<String>,
}

/// Query string of `GET /courses/autocomplete`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AutocompleteParams {
    pub q: Option<String>,
}

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseDto {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub duration_minutes: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Course> for CourseDto {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            instructor: course.instructor,
            category: course.category,
            level: course.level.map(|l| l.as_str().to_string()),
            duration_minutes: course.duration_minutes,
            thumbnail_url: course.thumbnail_url,
            video_url: course.video_url,
            is_premium: course.is_premium,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub courses: Vec<CourseDto>,
    /// `ai` or `fallback`.
    #[schema(example = "ai")]
    pub method: String,
    pub total: usize,
}

impl From<SearchResult> for SearchResponse {
    fn from(result: SearchResult) -> Self {
        let total = result.total();
        Self {
            method: result.method.as_str().to_string(),
            courses: result.courses.into_iter().map(CourseDto::from).collect(),
            total,
        }
    }
}

/// A course plus the reason it was suggested.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuggestedCourseDto {
    #[serde(flatten)]
    pub course: CourseDto,
    pub reason: String,
}

impl From<SuggestedCourse> for SuggestedCourseDto {
    fn from(suggestion: SuggestedCourse) -> Self {
        Self {
            course: suggestion.course.into(),
            reason: suggestion.reason,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<SuggestedCourseDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AutocompleteResponse {
    pub suggestions: Vec<String>,
}

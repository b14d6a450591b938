//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI document.

use crate::error::{ApiError, ErrorBody};
use crate::web::protocol::{
    AutocompleteParams, AutocompleteResponse, CatalogParams, CourseDto, SearchRequest,
    SearchResponse, SuggestedCourseDto, SuggestionsRequest, SuggestionsResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::Json,
};
use course_search_core::domain::{CatalogFilters, CourseLevel, DurationBucket};
use course_search_core::normalizer::normalize_query;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        semantic_search_handler,
        suggestions_handler,
        list_courses_handler,
        autocomplete_handler,
    ),
    components(
        schemas(
            SearchRequest,
            SearchResponse,
            SuggestionsRequest,
            SuggestionsResponse,
            SuggestedCourseDto,
            CourseDto,
            AutocompleteResponse,
            ErrorBody,
        )
    ),
    tags(
        (name = "Course Search API", description = "Semantic search, personalized suggestions and catalog browsing.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Semantic course search.
///
/// Ranks the catalog with the language model and falls back to keyword
/// matching when the model is unavailable or its reply cannot be used.
#[utoipa::path(
    post,
    path = "/functions/semantic-search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Ordered courses and the method that ranked them", body = SearchResponse),
        (status = 400, description = "Missing query or malformed body", body = ErrorBody),
        (status = 500, description = "AI backend not configured or catalog unreadable", body = ErrorBody)
    )
)]
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn semantic_search_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let query = request
        .query
        .as_deref()
        .and_then(normalize_query)
        .ok_or_else(|| ApiError::BadRequest("Query is required".to_string()))?;

    let result = state.resolver()?.search(query, request.user_profile).await?;
    info!(
        method = result.method.as_str(),
        total = result.total(),
        "Semantic search complete"
    );
    Ok(Json(result.into()))
}

/// Personalized course suggestions.
///
/// Returns up to four courses, each with a short reason. When the model reply
/// cannot be used the courses are picked at random.
#[utoipa::path(
    post,
    path = "/functions/suggestions",
    request_body = SuggestionsRequest,
    responses(
        (status = 200, description = "Suggested courses with reasons", body = SuggestionsResponse),
        (status = 400, description = "Missing user_id or malformed body", body = ErrorBody),
        (status = 500, description = "AI backend not configured or catalog unreadable", body = ErrorBody)
    )
)]
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn suggestions_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SuggestionsRequest>, JsonRejection>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let user_id = request
        .user_id
        .as_deref()
        .and_then(normalize_query)
        .ok_or_else(|| ApiError::BadRequest("User ID is required".to_string()))?;

    let suggestions = state.composer()?.compose(user_id).await?;
    Ok(Json(SuggestionsResponse {
        suggestions: suggestions.into_iter().map(Into::into).collect(),
    }))
}

/// Browse the catalog with optional text search and filters, newest first.
#[utoipa::path(
    get,
    path = "/courses",
    params(CatalogParams),
    responses(
        (status = 200, description = "Matching courses", body = [CourseDto]),
        (status = 400, description = "Unknown level or duration filter", body = ErrorBody),
        (status = 500, description = "Catalog unreadable", body = ErrorBody)
    )
)]
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn list_courses_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<CatalogParams>, QueryRejection>,
) -> Result<Json<Vec<CourseDto>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let filters = catalog_filters(&params)?;

    let courses = state
        .catalog
        .browse(params.q.as_deref().unwrap_or_default(), &filters)
        .await?;
    Ok(Json(courses.into_iter().map(CourseDto::from).collect()))
}

/// Title and category completions for a partially typed query.
#[utoipa::path(
    get,
    path = "/courses/autocomplete",
    params(AutocompleteParams),
    responses(
        (status = 200, description = "Up to five completions", body = AutocompleteResponse),
        (status = 500, description = "Catalog unreadable", body = ErrorBody)
    )
)]
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn autocomplete_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<AutocompleteParams>, QueryRejection>,
) -> Result<Json<AutocompleteResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let suggestions = state
        .catalog
        .autocomplete(params.q.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(AutocompleteResponse { suggestions }))
}

/// Empty filter values mean "any".
fn catalog_filters(params: &CatalogParams) -> Result<CatalogFilters, ApiError> {
    fn present(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    let level = present(&params.level)
        .map(|raw| raw.parse::<CourseLevel>())
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let duration = present(&params.duration)
        .map(|raw| raw.parse::<DurationBucket>())
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(CatalogFilters {
        category: present(&params.category).map(str::to_string),
        level,
        instructor: present(&params.instructor).map(str::to_string),
        duration,
    })
}

//! crates/course_search_core/src/catalog.rs
//!
//! Candidate fetching plus the deterministic, in-memory views over the catalog:
//! keyword fallback matching, filtered browsing and title autocomplete.

use crate::domain::{contains_lower, CatalogFilters, Course};
use crate::normalizer::{normalize_partial, normalize_query};
use crate::ports::{CourseRepository, PortResult};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// How many courses an autocomplete lookup inspects.
pub const AUTOCOMPLETE_CANDIDATES: usize = 5;
/// How many strings an autocomplete lookup returns.
pub const AUTOCOMPLETE_TERMS: usize = 5;

//=========================================================================================
// Candidate Fetcher
//=========================================================================================

/// Reads candidates fresh from the repository on every call; nothing is cached.
#[derive(Clone)]
pub struct CandidateFetcher {
    repo: Arc<dyn CourseRepository>,
}

impl CandidateFetcher {
    pub fn new(repo: Arc<dyn CourseRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<dyn CourseRepository> {
        &self.repo
    }

    /// The full catalog, used as ranking context and as the materialization snapshot.
    pub async fn fetch_catalog(&self) -> PortResult<Vec<Course>> {
        let courses = self.repo.list_courses().await?;
        debug!(count = courses.len(), "Fetched course catalog");
        Ok(courses)
    }

    /// Filtered, newest-first view of the catalog.
    pub async fn browse(&self, query: &str, filters: &CatalogFilters) -> PortResult<Vec<Course>> {
        let catalog = self.fetch_catalog().await?;
        Ok(filter_catalog(catalog, query, filters))
    }

    /// Title and category completions for a partially typed query.
    ///
    /// Partials shorter than two characters return nothing without touching the
    /// repository.
    pub async fn autocomplete(&self, raw_partial: &str) -> PortResult<Vec<String>> {
        let Some(partial) = normalize_partial(raw_partial) else {
            return Ok(Vec::new());
        };
        let candidates = self
            .repo
            .find_by_title_or_category(partial, AUTOCOMPLETE_CANDIDATES)
            .await?;
        Ok(autocomplete_terms(&candidates, partial))
    }
}

//=========================================================================================
// Pure Catalog Views
//=========================================================================================

/// The keyword strategy: case-insensitive substring match of `query` against
/// title, description and category, in catalog order, capped at `cap`.
pub fn keyword_matches(catalog: &[Course], query: &str, cap: usize) -> Vec<Course> {
    let needle = query.to_lowercase();
    catalog
        .iter()
        .filter(|c| c.mentions(&needle))
        .take(cap)
        .cloned()
        .collect()
}

/// Applies the catalog page's text search and exact-match filters.
///
/// The text search covers title, description and instructor. Results are
/// ordered newest first.
pub fn filter_catalog(courses: Vec<Course>, query: &str, filters: &CatalogFilters) -> Vec<Course> {
    let needle = normalize_query(query).map(str::to_lowercase);

    let mut matched: Vec<Course> = courses
        .into_iter()
        .filter(|c| match &needle {
            Some(n) => {
                contains_lower(Some(&c.title), n)
                    || contains_lower(c.description.as_deref(), n)
                    || contains_lower(c.instructor.as_deref(), n)
            }
            None => true,
        })
        .filter(|c| {
            filters
                .category
                .as_ref()
                .map_or(true, |want| c.category.as_ref() == Some(want))
        })
        .filter(|c| filters.level.map_or(true, |want| c.level == Some(want)))
        .filter(|c| {
            filters
                .instructor
                .as_ref()
                .map_or(true, |want| c.instructor.as_ref() == Some(want))
        })
        .filter(|c| {
            filters.duration.map_or(true, |bucket| {
                c.duration_minutes.is_some_and(|m| bucket.contains(m))
            })
        })
        .collect();

    matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    matched
}

/// Matching titles and categories, de-duplicated in first-seen order.
pub fn autocomplete_terms(candidates: &[Course], partial: &str) -> Vec<String> {
    let needle = partial.to_lowercase();
    let mut seen = HashSet::new();
    let mut terms = Vec::new();

    for course in candidates {
        let title = Some(course.title.as_str());
        let category = course.category.as_deref();
        for term in [title, category].into_iter().flatten() {
            if term.to_lowercase().contains(&needle) && seen.insert(term.to_string()) {
                terms.push(term.to_string());
            }
        }
    }

    terms.truncate(AUTOCOMPLETE_TERMS);
    terms
}

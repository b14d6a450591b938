//! Joins resolved identifiers back to full course records.
//!
//! Order always comes from the caller; identifiers that no longer match a course
//! are dropped, and an identifier listed twice is only emitted once.

use crate::domain::{Course, ResolvedSuggestion, SuggestedCourse};
use std::collections::{HashMap, HashSet};

fn index(catalog: &[Course]) -> HashMap<&str, &Course> {
    catalog.iter().map(|c| (c.id.as_str(), c)).collect()
}

/// Materializes `ids` against `catalog`, keeping the order of `ids`.
pub fn materialize<S: AsRef<str>>(ids: &[S], catalog: &[Course]) -> Vec<Course> {
    let by_id = index(catalog);
    let mut seen = HashSet::new();
    ids.iter()
        .map(AsRef::as_ref)
        .filter(|id| seen.insert(*id))
        .filter_map(|id| by_id.get(id).map(|c| (*c).clone()))
        .collect()
}

/// Same as [`materialize`], carrying each pick's reason onto its course.
pub fn materialize_suggestions(
    picks: &[ResolvedSuggestion],
    catalog: &[Course],
) -> Vec<SuggestedCourse> {
    let by_id = index(catalog);
    let mut seen = HashSet::new();
    picks
        .iter()
        .filter(|pick| seen.insert(pick.course_id.as_str()))
        .filter_map(|pick| {
            by_id.get(pick.course_id.as_str()).map(|course| SuggestedCourse {
                course: (*course).clone(),
                reason: pick.reason.clone(),
            })
        })
        .collect()
}

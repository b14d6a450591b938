//! crates/course_search_core/src/client.rs
//!
//! State containers for the views that call the search and suggestion
//! endpoints. Each one is owned by its view; there is no shared singleton.
//!
//! Every request a view starts gets a [`Ticket`]. Results are applied only when
//! their ticket is the most recent one issued by the same container, so a slow
//! response can never overwrite a newer one.

use crate::domain::{Course, SearchMethod, SearchResult, SuggestedCourse};
use crate::normalizer::{normalize_partial, normalize_query};
use crate::ports::PortResult;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Quiet period after the last keystroke before autocomplete fires.
pub const AUTOCOMPLETE_DEBOUNCE: Duration = Duration::from_millis(300);

/// Identifies one request issued by a state container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
struct Sequencer {
    latest: u64,
}

impl Sequencer {
    fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}

//=========================================================================================
// Suggestion Cache
//=========================================================================================

/// The last fetched suggestion list. Only an explicit re-fetch refreshes it.
#[derive(Debug, Default)]
pub struct SuggestionCache {
    suggestions: Vec<SuggestedCourse>,
    loading: bool,
    seq: Sequencer,
}

impl SuggestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a fetch as started.
    pub fn begin_fetch(&mut self) -> Ticket {
        self.loading = true;
        self.seq.issue()
    }

    /// Applies a finished fetch. Returns whether it was applied.
    ///
    /// A successful fetch replaces the whole list; a failed one keeps the
    /// previous list.
    pub fn complete(&mut self, ticket: Ticket, result: PortResult<Vec<SuggestedCourse>>) -> bool {
        if !self.seq.is_current(ticket) {
            debug!(?ticket, "Discarding stale suggestion response");
            return false;
        }
        self.loading = false;
        match result {
            Ok(suggestions) => self.suggestions = suggestions,
            Err(e) => warn!(error = %e, "Fetching suggestions failed"),
        }
        true
    }

    pub fn suggestions(&self) -> &[SuggestedCourse] {
        &self.suggestions
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_suggestions(&self) -> bool {
        !self.suggestions.is_empty()
    }
}

//=========================================================================================
// Search Session
//=========================================================================================

/// Results of the search box.
#[derive(Debug, Default)]
pub struct SearchSession {
    results: Vec<Course>,
    method: Option<SearchMethod>,
    loading: bool,
    seq: Sequencer,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a search for `raw_query`.
    ///
    /// A blank query clears the results and returns `None`: nothing should be
    /// sent. Issuing no ticket still invalidates searches already in flight.
    pub fn begin(&mut self, raw_query: &str) -> Option<(Ticket, String)> {
        let ticket = self.seq.issue();
        match normalize_query(raw_query) {
            Some(query) => {
                self.loading = true;
                Some((ticket, query.to_string()))
            }
            None => {
                self.results.clear();
                self.method = None;
                self.loading = false;
                None
            }
        }
    }

    pub fn complete(&mut self, ticket: Ticket, result: SearchResult) -> bool {
        if !self.seq.is_current(ticket) {
            debug!(?ticket, "Discarding stale search response");
            return false;
        }
        self.loading = false;
        self.results = result.courses;
        self.method = Some(result.method);
        true
    }

    pub fn results(&self) -> &[Course] {
        &self.results
    }

    pub fn method(&self) -> Option<SearchMethod> {
        self.method
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

//=========================================================================================
// Autocomplete Gate
//=========================================================================================

#[derive(Debug)]
struct Pending {
    partial: String,
    typed_at: Instant,
}

/// Debounces keystrokes into autocomplete lookups.
///
/// `type_text` records each keystroke; `poll_due` hands out a lookup once the
/// input has been quiet for [`AUTOCOMPLETE_DEBOUNCE`].
#[derive(Debug, Default)]
pub struct AutocompleteGate {
    terms: Vec<String>,
    pending: Option<Pending>,
    seq: Sequencer,
}

impl AutocompleteGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the current input. Inputs too short to look up clear the list
    /// at once.
    pub fn type_text(&mut self, raw: &str, now: Instant) {
        match normalize_partial(raw) {
            Some(partial) => {
                self.pending = Some(Pending {
                    partial: partial.to_string(),
                    typed_at: now,
                });
            }
            None => {
                self.pending = None;
                self.terms.clear();
                // Lookups already in flight are now stale.
                self.seq.issue();
            }
        }
    }

    /// Returns the lookup to perform if the debounce period has elapsed.
    pub fn poll_due(&mut self, now: Instant) -> Option<(Ticket, String)> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|p| now.saturating_duration_since(p.typed_at) >= AUTOCOMPLETE_DEBOUNCE);
        if !due {
            return None;
        }
        let pending = self.pending.take()?;
        Some((self.seq.issue(), pending.partial))
    }

    pub fn complete(&mut self, ticket: Ticket, terms: Vec<String>) -> bool {
        if !self.seq.is_current(ticket) {
            debug!(?ticket, "Discarding stale autocomplete response");
            return false;
        }
        self.terms = terms;
        true
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortError;
    use crate::testing::titled;
    use pretty_assertions::assert_eq;

    fn suggested(id: &str) -> SuggestedCourse {
        SuggestedCourse {
            course: titled(id, "Course", "Design"),
            reason: "because".to_string(),
        }
    }

    #[test]
    fn test_cache_replaces_contents_on_fetch() {
        let mut cache = SuggestionCache::new();
        assert!(!cache.has_suggestions());

        let t1 = cache.begin_fetch();
        assert!(cache.is_loading());
        assert!(cache.complete(t1, Ok(vec![suggested("a"), suggested("b")])));
        assert!(!cache.is_loading());
        assert_eq!(cache.suggestions().len(), 2);

        let t2 = cache.begin_fetch();
        assert!(cache.complete(t2, Ok(vec![suggested("c")])));
        assert_eq!(cache.suggestions()[0].course.id, "c");
        assert_eq!(cache.suggestions().len(), 1);
    }

    #[test]
    fn test_cache_keeps_previous_list_on_error() {
        let mut cache = SuggestionCache::new();
        let t1 = cache.begin_fetch();
        cache.complete(t1, Ok(vec![suggested("a")]));

        let t2 = cache.begin_fetch();
        assert!(cache.complete(t2, Err(PortError::Unavailable("offline".into()))));

        assert!(!cache.is_loading());
        assert_eq!(cache.suggestions()[0].course.id, "a");
    }

    #[test]
    fn test_cache_ignores_stale_completion() {
        let mut cache = SuggestionCache::new();
        let old = cache.begin_fetch();
        let new = cache.begin_fetch();

        assert!(cache.complete(new, Ok(vec![suggested("new")])));
        assert!(!cache.complete(old, Ok(vec![suggested("old")])));

        assert_eq!(cache.suggestions()[0].course.id, "new");
    }

    #[test]
    fn test_search_session_out_of_order_responses() {
        let mut session = SearchSession::new();
        let (first, q1) = session.begin("reac").unwrap();
        let (second, q2) = session.begin(" react ").unwrap();
        assert_eq!((q1.as_str(), q2.as_str()), ("reac", "react"));

        let newer = SearchResult {
            courses: vec![titled("a", "React do Zero", "Programação")],
            method: SearchMethod::Ai,
        };
        assert!(session.complete(second, newer));
        assert!(!session.complete(first, SearchResult::empty()));

        assert_eq!(session.results()[0].id, "a");
        assert_eq!(session.method(), Some(SearchMethod::Ai));
        assert!(!session.is_loading());
    }

    #[test]
    fn test_search_session_blank_query_clears_and_invalidates() {
        let mut session = SearchSession::new();
        let (t, _) = session.begin("react").unwrap();
        assert!(session.begin("   ").is_none());

        let late = SearchResult {
            courses: vec![titled("a", "React do Zero", "Programação")],
            method: SearchMethod::Fallback,
        };
        assert!(!session.complete(t, late));
        assert!(session.results().is_empty());
        assert_eq!(session.method(), None);
    }

    #[test]
    fn test_autocomplete_waits_for_quiet_period() {
        let start = Instant::now();
        let mut gate = AutocompleteGate::new();

        gate.type_text("re", start);
        gate.type_text("rea", start + Duration::from_millis(100));

        assert!(gate.poll_due(start + Duration::from_millis(350)).is_none());
        let (ticket, partial) = gate.poll_due(start + Duration::from_millis(400)).unwrap();
        assert_eq!(partial, "rea");
        // Taken once.
        assert!(gate.poll_due(start + Duration::from_millis(900)).is_none());

        assert!(gate.complete(ticket, vec!["React do Zero".to_string()]));
        assert_eq!(gate.terms(), ["React do Zero".to_string()]);
    }

    #[test]
    fn test_autocomplete_short_input_clears_and_drops_in_flight() {
        let start = Instant::now();
        let mut gate = AutocompleteGate::new();
        gate.type_text("des", start);
        let (ticket, _) = gate.poll_due(start + AUTOCOMPLETE_DEBOUNCE).unwrap();

        gate.type_text("d", start + Duration::from_millis(500));

        assert!(!gate.complete(ticket, vec!["Design".to_string()]));
        assert!(gate.terms().is_empty());
        assert!(gate.poll_due(start + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_autocomplete_stale_lookup_cannot_overwrite_newer() {
        let start = Instant::now();
        let mut gate = AutocompleteGate::new();

        gate.type_text("ux", start);
        let (slow, _) = gate.poll_due(start + AUTOCOMPLETE_DEBOUNCE).unwrap();
        gate.type_text("ux w", start + Duration::from_millis(400));
        let (fast, _) = gate.poll_due(start + Duration::from_millis(700)).unwrap();

        assert!(gate.complete(fast, vec!["UX Writing".to_string()]));
        assert!(!gate.complete(slow, vec!["UX".to_string(), "UX Writing".to_string()]));
        assert_eq!(gate.terms(), ["UX Writing".to_string()]);
    }
}

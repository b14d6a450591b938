//! Input validation that runs before anything is fetched or sent upstream.

/// Partial queries shorter than this are not worth an autocomplete lookup.
pub const MIN_AUTOCOMPLETE_CHARS: usize = 2;

/// Trims `raw`; `None` means there is nothing to search for.
pub fn normalize_query(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Like [`normalize_query`], but also requires [`MIN_AUTOCOMPLETE_CHARS`] characters.
pub fn normalize_partial(raw: &str) -> Option<&str> {
    normalize_query(raw).filter(|p| p.chars().count() >= MIN_AUTOCOMPLETE_CHARS)
}

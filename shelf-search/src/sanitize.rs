//! Text sanitisation for catalog fields and user queries.
//!
//! Catalog titles occasionally carry HTML fragments (`<i>`, `&amp;`) and
//! stray control characters. Both are stripped before a record leaves an
//! adapter, and whitespace is collapsed so that titles compare cleanly.

use scraper::Html;

/// Placeholder author used when a catalog reports none.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Longest query (in characters) forwarded to the catalogs.
pub const MAX_QUERY_CHARS: usize = 256;

/// Strip markup and control characters from `raw`, collapsing whitespace.
///
/// Returns `None` if nothing printable remains.
pub fn sanitize_text(raw: &str) -> Option<String> {
    let text = if raw.contains('<') || raw.contains('&') {
        let fragment = Html::parse_fragment(raw);
        fragment.root_element().text().collect::<String>()
    } else {
        raw.to_string()
    };

    let cleaned = collapse_whitespace(&strip_control(&text));
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Sanitise every author name, dropping blanks.
///
/// Always returns at least one entry: [`UNKNOWN_AUTHOR`] if no name survives.
pub fn sanitize_authors(raw: &[String]) -> Vec<String> {
    let authors: Vec<String> = raw.iter().filter_map(|a| sanitize_text(a)).collect();
    if authors.is_empty() {
        vec![UNKNOWN_AUTHOR.to_string()]
    } else {
        authors
    }
}

/// Prepare free text typed by the user for use as a catalog query.
///
/// Control characters are removed, whitespace collapsed and the result
/// truncated to [`MAX_QUERY_CHARS`]. Markup is left alone: `<` is a
/// legitimate character in a search.
pub fn sanitize_query(raw: &str) -> String {
    collapse_whitespace(&strip_control(raw))
        .chars()
        .take(MAX_QUERY_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn strip_control(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Core types for normalised catalog records and merged result pages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::sanitize::{sanitize_authors, sanitize_text};

/// A single book record after mapping out of a catalog's own schema.
///
/// Construct through [`NormalizedRecord::new`], which sanitises the title
/// and authors and refuses records whose title is empty afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Identifier, stable within its source catalog.
    pub id: String,
    /// Sanitised, non-empty title.
    pub title: String,
    /// At least one author; `"Unknown"` when the catalog gave none.
    pub authors: Vec<String>,
    /// Cover image URL, if the catalog has one.
    pub thumbnail_url: Option<String>,
    /// Publication date as reported by the catalog (format varies).
    pub published_date: Option<String>,
    /// Which catalog produced this record.
    pub source: Source,
    /// Link kind (e.g. `"preview"`, `"work"`) to URL.
    pub links: BTreeMap<String, String>,
}

impl NormalizedRecord {
    /// Build a record, sanitising `title` and `authors`.
    ///
    /// Returns `None` if the title is empty once control characters and
    /// markup are stripped.
    pub fn new(
        id: impl Into<String>,
        title: &str,
        authors: &[String],
        source: Source,
    ) -> Option<Self> {
        let title = sanitize_text(title)?;
        Some(Self {
            id: id.into(),
            title,
            authors: sanitize_authors(authors),
            thumbnail_url: None,
            published_date: None,
            source,
            links: BTreeMap::new(),
        })
    }

    /// Set the thumbnail URL.
    pub fn with_thumbnail(mut self, url: Option<String>) -> Self {
        self.thumbnail_url = url;
        self
    }

    /// Set the publication date.
    pub fn with_published_date(mut self, date: Option<String>) -> Self {
        self.published_date = date;
        self
    }

    /// Add a link if `url` is present.
    pub fn with_link(mut self, kind: &str, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.links.insert(kind.to_string(), url);
        }
        self
    }
}

/// The remote catalogs shelf-search knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// Google Books volumes API.
    GoogleBooks,
    /// Open Library search API.
    OpenLibrary,
}

impl Source {
    /// Returns the human-readable name of this catalog.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GoogleBooks => "GoogleBooks",
            Self::OpenLibrary => "OpenLibrary",
        }
    }

    /// Merge priority. Lower values are merged first, so their records win
    /// when two catalogs return the same book.
    pub fn priority(&self) -> u8 {
        match self {
            Self::GoogleBooks => 0,
            Self::OpenLibrary => 1,
        }
    }

    /// Returns all catalog variants in priority order.
    pub fn all() -> &'static [Source] {
        &[Self::GoogleBooks, Self::OpenLibrary]
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One merged, deduplicated page of results for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Records in source-priority order with duplicates removed.
    pub records: Vec<NormalizedRecord>,
    /// Whether any catalog reported results beyond this page.
    pub has_more: bool,
    /// Largest total reported by any catalog (0 if none reported one).
    pub total_results: u64,
    /// The sanitised query this page answers.
    pub query: String,
    /// 1-based page number.
    pub page_number: u32,
    /// Unix timestamp (seconds) when the page was fetched.
    pub fetched_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authors(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn record_construction_sanitises_title() {
        let record = NormalizedRecord::new(
            "abc",
            "  The <b>Hobbit</b>\u{0007} ",
            &authors(&["J.R.R. Tolkien"]),
            Source::GoogleBooks,
        )
        .expect("title survives sanitisation");
        assert_eq!(record.title, "The Hobbit");
        assert_eq!(record.authors, vec!["J.R.R. Tolkien"]);
        assert!(record.links.is_empty());
    }

    #[test]
    fn record_with_blank_title_is_rejected() {
        let record = NormalizedRecord::new("x", " <i></i> \n", &[], Source::OpenLibrary);
        assert!(record.is_none());
    }

    #[test]
    fn record_without_authors_gets_placeholder() {
        let record =
            NormalizedRecord::new("x", "Dune", &[], Source::OpenLibrary).expect("valid title");
        assert_eq!(record.authors, vec!["Unknown"]);
    }

    #[test]
    fn builder_methods_fill_optional_fields() {
        let record = NormalizedRecord::new("x", "Dune", &authors(&["Frank Herbert"]), Source::OpenLibrary)
            .expect("valid title")
            .with_thumbnail(Some("https://covers.example/1.jpg".into()))
            .with_published_date(Some("1965".into()))
            .with_link("work", Some("https://openlibrary.org/works/OL1W".into()))
            .with_link("missing", None);
        assert_eq!(record.published_date.as_deref(), Some("1965"));
        assert_eq!(record.links.len(), 1);
        assert_eq!(
            record.links.get("work").map(String::as_str),
            Some("https://openlibrary.org/works/OL1W")
        );
    }

    #[test]
    fn source_display_and_priority() {
        assert_eq!(Source::GoogleBooks.to_string(), "GoogleBooks");
        assert_eq!(Source::OpenLibrary.to_string(), "OpenLibrary");
        assert!(Source::GoogleBooks.priority() < Source::OpenLibrary.priority());
    }

    #[test]
    fn source_all_is_in_priority_order() {
        let all = Source::all();
        assert_eq!(all.len(), 2);
        assert!(all.windows(2).all(|w| w[0].priority() < w[1].priority()));
    }

    #[test]
    fn source_serde_round_trip() {
        let json = serde_json::to_string(&Source::OpenLibrary).expect("serialize");
        assert_eq!(json, "\"OpenLibrary\"");
        let decoded: Source = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, Source::OpenLibrary);
    }
}

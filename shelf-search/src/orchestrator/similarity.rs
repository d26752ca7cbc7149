//! Fuzzy "same book" test used for cross-catalog deduplication.
//!
//! Two records are duplicates when **both** their titles and their authors
//! match:
//!
//! - Titles are lowercased, stripped of punctuation and whitespace-collapsed.
//!   They match if equal, or if one contains the other and both are longer
//!   than [`MIN_CONTAINED_TITLE_CHARS`] characters.
//! - Authors are lowercased. They match if any author of one record is a
//!   substring of any author of the other, in either direction.
//!
//! The substring rules deliberately collapse near-duplicates such as
//! `"J.R.R. Tolkien"` / `"Tolkien"`, at the cost of occasionally merging
//! distinct works that share a long title fragment.

use crate::types::NormalizedRecord;

/// A normalised title must be strictly longer than this to match by containment.
pub const MIN_CONTAINED_TITLE_CHARS: usize = 5;

/// Precomputed comparison form of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    title: String,
    title_chars: usize,
    authors: Vec<String>,
}

impl Fingerprint {
    /// Normalise a record's title and authors for comparison.
    pub fn of(record: &NormalizedRecord) -> Self {
        let title = normalize_title(&record.title);
        Self {
            title_chars: title.chars().count(),
            title,
            authors: record.authors.iter().map(|a| a.to_lowercase()).collect(),
        }
    }

    /// Returns `true` if both titles and authors match.
    pub fn is_similar(&self, other: &Self) -> bool {
        self.title_matches(other) && self.authors_match(other)
    }

    fn title_matches(&self, other: &Self) -> bool {
        if self.title == other.title {
            return true;
        }
        let long_enough = self.title_chars > MIN_CONTAINED_TITLE_CHARS
            && other.title_chars > MIN_CONTAINED_TITLE_CHARS;
        long_enough && (self.title.contains(&other.title) || other.title.contains(&self.title))
    }

    fn authors_match(&self, other: &Self) -> bool {
        self.authors.iter().any(|mine| {
            other
                .authors
                .iter()
                .any(|theirs| mine.contains(theirs.as_str()) || theirs.contains(mine.as_str()))
        })
    }
}

/// Lowercase, drop punctuation, collapse whitespace.
///
/// Letters and digits of any script are kept; everything else that is not
/// whitespace is removed outright (so `"J.R.R."` becomes `"jrr"`).
pub fn normalize_title(title: &str) -> String {
    let stripped: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Convenience wrapper: are `a` and `b` the same book?
pub fn is_similar(a: &NormalizedRecord, b: &NormalizedRecord) -> bool {
    Fingerprint::of(a).is_similar(&Fingerprint::of(b))
}

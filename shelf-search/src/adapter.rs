//! Trait definition for pluggable catalog backends.
//!
//! Each remote catalog (Google Books, Open Library) implements
//! [`CatalogAdapter`] to provide a uniform interface for fetching a page
//! and mapping it into [`NormalizedRecord`]s.

use tokio_util::sync::CancellationToken;

use crate::error::SearchError;
use crate::types::{NormalizedRecord, Source};

/// How many results a catalog claims to have for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalHint {
    /// The catalog reported an exact or estimated total.
    Known(u64),
    /// The catalog gave no count. Pagination assumes no further pages.
    Unknown,
}

impl TotalHint {
    /// The reported total, if any.
    pub fn known(self) -> Option<u64> {
        match self {
            Self::Known(total) => Some(total),
            Self::Unknown => None,
        }
    }
}

/// One catalog's answer for a single page.
#[derive(Debug, Clone)]
pub struct AdapterPage {
    /// Sanitised records in the catalog's own order.
    pub records: Vec<NormalizedRecord>,
    /// The catalog's total-count hint.
    pub total: TotalHint,
}

/// A pluggable catalog backend.
///
/// Implementors own their:
///
/// - URL construction with query encoding and page offsets
/// - HTTP request and status handling
/// - JSON decoding of the catalog's schema
/// - mapping and sanitisation into [`NormalizedRecord`]
///
/// Records should come from [`NormalizedRecord::new`]. Titles are sanitised
/// again before merging, and records whose title ends up empty are dropped.
///
/// All implementations must be `Send + Sync` for concurrent catalog queries.
pub trait CatalogAdapter: Send + Sync {
    /// Fetch one page of results.
    ///
    /// # Arguments
    ///
    /// * `query`: sanitised query text; the implementation handles encoding.
    /// * `page`: 1-based page number.
    /// * `cancel`: resolves when the request has been superseded.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Canceled`] if `cancel` fires first, otherwise
    /// [`SearchError`] if the request fails or the response cannot be decoded.
    fn fetch_page(
        &self,
        query: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = Result<AdapterPage, SearchError>> + Send;

    /// Returns which [`Source`] this implementation represents.
    fn source(&self) -> Source;
}

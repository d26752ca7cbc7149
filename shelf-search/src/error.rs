//! Error types for the shelf-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. Query text never appears in error messages.

use crate::types::Source;

/// Errors that can occur while fetching and merging catalog pages.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// One catalog was unreachable or returned something unusable.
    /// Non-fatal: the other catalog's results are still used.
    #[error("{catalog} adapter failed: {reason}")]
    AdapterFailure {
        /// Which catalog failed.
        catalog: Source,
        /// Underlying failure description.
        reason: String,
    },

    /// Every catalog failed for the requested page.
    #[error("all catalogs failed: {0}")]
    AllSourcesFailed(String),

    /// The request was superseded by a newer one. Never surfaced to users.
    #[error("request canceled")]
    Canceled,

    /// A catalog did not answer within the per-request ceiling.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// An HTTP request to a catalog failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A catalog response body could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Returns `true` if this error only signals cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Returns `true` if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::AllSourcesFailed(_)
                | Self::AdapterFailure { .. }
                | Self::Timeout(_)
                | Self::Http(_)
                | Self::Parse(_)
        )
    }
}

/// Convenience type alias for shelf-search results.
pub type Result<T> = std::result::Result<T, SearchError>;

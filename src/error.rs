//! Error types for shelf search sessions.

use shelf_search::SearchError;

/// Top-level error type for the search session layer.
#[derive(Debug, thiserror::Error)]
pub enum ShelfError {
    /// Catalog fetch, merge or cache error.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The coordinator task is no longer running.
    #[error("search coordinator closed")]
    Closed,
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ShelfError>;

//! Catalog adapter implementations.
//!
//! Each module provides a struct implementing [`crate::adapter::CatalogAdapter`]
//! for one remote catalog. [`Catalog`] closes the set so the configured
//! adapters can live in one `Vec`.

pub mod google_books;
pub mod open_library;

pub use google_books::GoogleBooksAdapter;
pub use open_library::OpenLibraryAdapter;

use tokio_util::sync::CancellationToken;

use crate::adapter::{AdapterPage, CatalogAdapter};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::types::Source;

/// One of the built-in catalog adapters.
#[derive(Debug, Clone)]
pub enum Catalog {
    /// Google Books volumes API.
    GoogleBooks(GoogleBooksAdapter),
    /// Open Library search API.
    OpenLibrary(OpenLibraryAdapter),
}

impl Catalog {
    /// Build the adapter for every source enabled in `config`, sharing one
    /// HTTP client. Repeated sources are built once.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid, or
    /// [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &SearchConfig) -> Result<Vec<Self>, SearchError> {
        config.validate()?;
        let client = http::build_client(config)?;

        let mut sources = config.sources.clone();
        sources.sort_by_key(Source::priority);
        sources.dedup();

        sources
            .into_iter()
            .map(|source| match source {
                Source::GoogleBooks => {
                    GoogleBooksAdapter::new(client.clone(), config).map(Self::GoogleBooks)
                }
                Source::OpenLibrary => {
                    OpenLibraryAdapter::new(client.clone(), config).map(Self::OpenLibrary)
                }
            })
            .collect()
    }
}

impl CatalogAdapter for Catalog {
    async fn fetch_page(
        &self,
        query: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<AdapterPage, SearchError> {
        match self {
            Self::GoogleBooks(adapter) => adapter.fetch_page(query, page, cancel).await,
            Self::OpenLibrary(adapter) => adapter.fetch_page(query, page, cancel).await,
        }
    }

    fn source(&self) -> Source {
        match self {
            Self::GoogleBooks(adapter) => adapter.source(),
            Self::OpenLibrary(adapter) => adapter.source(),
        }
    }
}

//! # shelf-search
//!
//! Multi-catalog book search for Shelf.
//!
//! This crate fetches one page of results from several remote book
//! catalogs at once, maps each catalog's own JSON schema into a shared
//! [`NormalizedRecord`], merges the pages with fuzzy deduplication and
//! caches the merged page.
//!
//! ## Design
//!
//! - Google Books and Open Library adapters behind one [`CatalogAdapter`] trait
//! - Catalogs queried concurrently; one failing catalog never voids the other
//! - Title/author similarity dedup, earlier source priority wins
//! - In-memory [`ResultCache`] with lazy TTL expiry and batch LRU eviction
//! - Cooperative cancellation via [`tokio_util::sync::CancellationToken`]
//!
//! Request lifecycle (debounce, coalescing, retry) lives in the `shelf`
//! crate, which is the only writer of the cache.
//!
//! ## Privacy
//!
//! - Queries are logged only at trace level
//! - Titles and author names are sanitised before leaving an adapter

pub mod adapter;
pub mod adapters;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod sanitize;
pub mod types;

pub use adapter::{AdapterPage, CatalogAdapter, TotalHint};
pub use adapters::Catalog;
pub use cache::{CacheKey, CacheStats, ResultCache};
pub use config::{CacheConfig, SearchConfig};
pub use error::{Result, SearchError};
pub use orchestrator::dedup::{extend_unique, merge};
pub use types::{NormalizedRecord, SearchPage, Source};

use tokio_util::sync::CancellationToken;

/// Fetch one merged page from every adapter.
///
/// Validates `config`, sanitises `query`, then queries all `adapters`
/// concurrently and merges their records in source priority order.
///
/// # Errors
///
/// Returns [`SearchError::AllSourcesFailed`] if every adapter fails, and
/// [`SearchError::Canceled`] if `cancel` fires first. Individual adapter
/// failures are logged but do not fail the page as long as one adapter
/// answers.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> shelf_search::Result<()> {
/// use shelf_search::{Catalog, SearchConfig};
/// use tokio_util::sync::CancellationToken;
///
/// let config = SearchConfig::default();
/// let catalogs = Catalog::from_config(&config)?;
/// let cancel = CancellationToken::new();
/// let page = shelf_search::fetch_page(&catalogs, "dune", 1, &config, &cancel).await?;
/// for record in &page.records {
///     println!("{} by {}", record.title, record.authors.join(", "));
/// }
/// # Ok(())
/// # }
/// ```
pub async fn fetch_page<A: CatalogAdapter>(
    adapters: &[A],
    query: &str,
    page: u32,
    config: &SearchConfig,
    cancel: &CancellationToken,
) -> Result<SearchPage> {
    config.validate()?;
    let query = sanitize::sanitize_query(query);
    if query.is_empty() {
        return Err(SearchError::Config("query must not be empty".into()));
    }
    if page == 0 {
        return Err(SearchError::Config("page numbers start at 1".into()));
    }
    orchestrator::search::fetch_merged_page(adapters, &query, page, config, cancel).await
}

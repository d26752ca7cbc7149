//! # shelf
//!
//! Incremental book search sessions over several remote catalogs.
//!
//! A [`SearchCoordinator`] turns keystrokes into page requests: input is
//! debounced, identical in-flight requests are coalesced, superseded
//! requests are cancelled, and transient failures are retried with
//! exponential backoff. Each page is fetched and merged by
//! [`shelf_search`] and cached in a shared [`ResultCache`].
//!
//! ```no_run
//! # async fn example() -> shelf::Result<()> {
//! use std::sync::Arc;
//!
//! use shelf::{Catalog, ResultCache, SearchCoordinator, ShelfConfig};
//!
//! let config = ShelfConfig::default();
//! let catalogs = Catalog::from_config(&config.search)?;
//! let cache = Arc::new(ResultCache::new(config.cache.clone()));
//! let coordinator = SearchCoordinator::spawn(catalogs, cache, &config)?;
//!
//! let mut views = coordinator.subscribe();
//! coordinator.set_query("the left hand of darkness")?;
//! while views.changed().await.is_ok() {
//!     let view = views.borrow_and_update().clone();
//!     if !view.loading && !view.records.is_empty() {
//!         println!("{} results", view.records.len());
//!         break;
//!     }
//! }
//! coordinator.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;

pub use config::{SessionConfig, ShelfConfig};
pub use coordinator::retry::RetryPolicy;
pub use coordinator::{SearchCoordinator, SearchPhase, SearchView};
pub use error::{Result, ShelfError};

pub use shelf_search::{
    CacheConfig, CacheKey, CacheStats, Catalog, CatalogAdapter, NormalizedRecord, ResultCache,
    SearchConfig, SearchError, SearchPage, Source,
};

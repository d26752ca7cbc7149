//! Search and cache configuration with sensible defaults.
//!
//! [`SearchConfig`] controls which catalogs are queried, page size and
//! request behaviour. [`CacheConfig`] bounds the result cache.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SearchError;
use crate::types::Source;

/// Default Google Books volumes endpoint.
pub const GOOGLE_BOOKS_URL: &str = "https://www.googleapis.com/books/v1/volumes";

/// Default Open Library search endpoint.
pub const OPEN_LIBRARY_URL: &str = "https://openlibrary.org/search.json";

/// Google Books refuses `maxResults` above this.
pub const MAX_PAGE_SIZE: u32 = 40;

/// Configuration for fetching catalog pages.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Which catalogs to query. Queried concurrently; results are merged
    /// in [`Source::priority`] order.
    pub sources: Vec<Source>,
    /// Records requested from each catalog per page.
    pub page_size: u32,
    /// Per-request ceiling in seconds. A timeout counts as a catalog failure.
    pub timeout_seconds: u64,
    /// Custom User-Agent string. If `None`, a crate default is sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Google Books endpoint (overridable for tests and proxies).
    pub google_books_url: String,
    /// Open Library endpoint (overridable for tests and proxies).
    pub open_library_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sources: Source::all().to_vec(),
            page_size: MAX_PAGE_SIZE,
            timeout_seconds: 10,
            user_agent: None,
            google_books_url: GOOGLE_BOOKS_URL.to_string(),
            open_library_url: OPEN_LIBRARY_URL.to_string(),
        }
    }
}

impl SearchConfig {
    /// Per-request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `page_size` must be between 1 and [`MAX_PAGE_SIZE`]
    /// - `timeout_seconds` must be greater than 0
    /// - `sources` must not be empty
    /// - both endpoint URLs must parse
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(SearchError::Config(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.sources.is_empty() {
            return Err(SearchError::Config(
                "at least one source must be enabled".into(),
            ));
        }
        for (name, raw) in [
            ("google_books_url", &self.google_books_url),
            ("open_library_url", &self.open_library_url),
        ] {
            Url::parse(raw)
                .map_err(|e| SearchError::Config(format!("{name} is not a valid URL: {e}")))?;
        }
        Ok(())
    }
}

/// Bounds for the in-memory result cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds an entry stays valid after insertion.
    pub ttl_seconds: u64,
    /// Maximum number of cached pages.
    pub capacity: usize,
    /// Share of `capacity` dropped (least recently accessed first) when a
    /// new key arrives at a full cache. At least one entry is always dropped.
    pub eviction_fraction: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 15 * 60,
            capacity: 100,
            eviction_fraction: 0.2,
        }
    }
}

impl CacheConfig {
    /// Entry lifetime as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Number of entries removed per eviction pass.
    pub fn eviction_batch(&self) -> usize {
        let batch = (self.capacity as f64 * self.eviction_fraction).floor() as usize;
        batch.max(1)
    }

    /// Validates this configuration.
    ///
    /// `capacity` must be non-zero and `eviction_fraction` within `(0, 1]`.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.capacity == 0 {
            return Err(SearchError::Config(
                "cache capacity must be greater than 0".into(),
            ));
        }
        if !(self.eviction_fraction > 0.0 && self.eviction_fraction <= 1.0) {
            return Err(SearchError::Config(
                "cache eviction_fraction must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }
}

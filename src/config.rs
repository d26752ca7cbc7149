//! Configuration types for shelf search sessions.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shelf_search::{CacheConfig, SearchConfig};

use crate::coordinator::retry::RetryPolicy;
use crate::error::{Result, ShelfError};

/// Top-level configuration.
///
/// Every section and field is optional in TOML; missing values fall back
/// to their defaults.
///
/// ```toml
/// [search]
/// sources = ["GoogleBooks", "OpenLibrary"]
/// page_size = 40
///
/// [cache]
/// ttl_seconds = 900
///
/// [session]
/// debounce_ms = 300
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfConfig {
    /// Catalog selection, paging and HTTP settings.
    pub search: SearchConfig,
    /// Result cache bounds.
    pub cache: CacheConfig,
    /// Debounce and retry settings for interactive sessions.
    pub session: SessionConfig,
}

impl ShelfConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Config`] if the text is not valid TOML for
    /// this schema.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ShelfError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first section error found.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.cache.validate()?;
        self.session.validate()
    }
}

/// Interactive session timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Quiet period after the last keystroke before a query is issued.
    pub debounce_ms: u64,
    /// Extra attempts after a failed fetch. `0` disables automatic retry.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_base_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            max_retries: 2,
            retry_base_delay_ms: 1000,
        }
    }
}

impl SessionConfig {
    /// Debounce window as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Retry policy derived from these settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Config`] if retries are enabled with a zero
    /// base delay.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries > 0 && self.retry_base_delay_ms == 0 {
            return Err(ShelfError::Config(
                "retry_base_delay_ms must be greater than 0 when retries are enabled".into(),
            ));
        }
        Ok(())
    }
}

//! Shared HTTP client for catalog requests.
//!
//! Provides a configured [`reqwest::Client`] and a helper that races a
//! GET request against a cancellation token and decodes the JSON body.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::types::Source;

/// User-Agent sent when the config does not override it.
pub const DEFAULT_USER_AGENT: &str = concat!("shelf-search/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] configured for catalog requests.
///
/// The client has:
/// - Timeout from config
/// - Custom or default User-Agent
/// - Brotli and gzip decompression
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// GET `url` and decode the body as `T`, unless `cancel` fires first.
///
/// # Errors
///
/// - [`SearchError::Canceled`] if `cancel` resolves before the body is read
/// - [`SearchError::Timeout`] if the client timeout elapses
/// - [`SearchError::Http`] on connection failures and non-2xx statuses
/// - [`SearchError::Parse`] if the body is not the expected JSON
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: Url,
    source: Source,
    cancel: &CancellationToken,
) -> Result<T, SearchError> {
    let request = async {
        let response = client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| request_error(source, e))?
            .error_for_status()
            .map_err(|e| SearchError::Http(format!("{source} HTTP error: {e}")))?;

        response
            .text()
            .await
            .map_err(|e| request_error(source, e))
    };

    let body = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(SearchError::Canceled),
        body = request => body?,
    };

    tracing::trace!(%source, bytes = body.len(), "catalog response received");

    serde_json::from_str(&body)
        .map_err(|e| SearchError::Parse(format!("{source} response: {e}")))
}

fn request_error(source: Source, err: reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::Timeout(format!("{source} did not respond in time"))
    } else {
        SearchError::Http(format!("{source} request failed: {err}"))
    }
}

//! Core fetch-and-merge: concurrent multi-catalog fan-out, dedup, paging.
//!
//! Queries every adapter concurrently under a per-request timeout, keeps
//! each settled outcome separately, merges surviving record lists in source
//! priority order and derives `has_more` from the totals catalogs reported.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;

use crate::adapter::{AdapterPage, CatalogAdapter};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::sanitize::sanitize_text;
use crate::types::{NormalizedRecord, SearchPage, Source};

use super::dedup::merge;

/// Fetch and merge one page across all `adapters`.
///
/// # Pipeline
///
/// 1. Fan out `fetch_page` to every adapter with [`futures::future::join_all`],
///    each bounded by [`SearchConfig::timeout`]
/// 2. Race the fan-out against `cancel`
/// 3. Log per-catalog failures at warn level; keep successful pages,
///    dropping records whose title does not survive sanitisation
/// 4. Order surviving pages by [`Source::priority`] and merge with dedup
/// 5. Compute `has_more` / `total_results` from the reported totals
///
/// # Errors
///
/// - [`SearchError::Canceled`] if `cancel` fires before the fan-out settles.
///   An adapter reporting `Canceled` on its own counts as a failed catalog.
/// - [`SearchError::AllSourcesFailed`] only if **every** adapter fails.
///   Partial failures are logged and the surviving results returned.
pub async fn fetch_merged_page<A: CatalogAdapter>(
    adapters: &[A],
    query: &str,
    page: u32,
    config: &SearchConfig,
    cancel: &CancellationToken,
) -> Result<SearchPage, SearchError> {
    if cancel.is_cancelled() {
        return Err(SearchError::Canceled);
    }
    if adapters.is_empty() {
        return Err(SearchError::AllSourcesFailed("no catalogs configured".into()));
    }

    // 1. Fan out to all adapters concurrently.
    let timeout = config.timeout();
    let futures: Vec<_> = adapters
        .iter()
        .map(|adapter| async move {
            let source = adapter.source();
            let outcome = match tokio::time::timeout(timeout, adapter.fetch_page(query, page, cancel)).await {
                Ok(result) => result,
                Err(_) => Err(SearchError::Timeout(format!(
                    "{source} exceeded {}s limit",
                    timeout.as_secs()
                ))),
            };
            (source, outcome)
        })
        .collect();

    // 2. A superseded request stops waiting immediately.
    let mut outcomes = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(SearchError::Canceled),
        outcomes = futures::future::join_all(futures) => outcomes,
    };

    // 3. Settle each catalog independently.
    outcomes.sort_by_key(|(source, _)| source.priority());
    let mut pages: Vec<(Source, AdapterPage)> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    for (source, outcome) in outcomes {
        match outcome {
            Ok(mut adapter_page) => {
                adapter_page.records.retain_mut(resanitize_title);
                tracing::debug!(%source, count = adapter_page.records.len(), "catalog returned records");
                pages.push((source, adapter_page));
            }
            Err(err) if err.is_cancellation() && cancel.is_cancelled() => {
                return Err(SearchError::Canceled);
            }
            Err(err) => {
                let failure = SearchError::AdapterFailure {
                    catalog: source,
                    reason: err.to_string(),
                };
                tracing::warn!(%source, error = %err, "catalog query failed");
                errors.push(failure.to_string());
            }
        }
    }

    // 4. Nothing usable at all.
    if pages.is_empty() {
        return Err(SearchError::AllSourcesFailed(errors.join("; ")));
    }

    // 5. Paging derived from whichever catalogs reported a count.
    let shown = u64::from(page) * u64::from(config.page_size);
    let totals: Vec<u64> = pages.iter().filter_map(|(_, p)| p.total.known()).collect();
    let has_more = totals.iter().any(|total| *total > shown);
    let total_results = totals.iter().copied().max().unwrap_or(0);

    let records = merge(pages.into_iter().map(|(_, p)| p.records));

    Ok(SearchPage {
        records,
        has_more,
        total_results,
        query: query.to_string(),
        page_number: page,
        fetched_at: unix_now(),
    })
}

/// Keep `record` only if its title is non-empty once sanitised.
fn resanitize_title(record: &mut NormalizedRecord) -> bool {
    match sanitize_text(&record.title) {
        Some(title) => {
            record.title = title;
            true
        }
        None => {
            tracing::debug!(id = %record.id, "record without usable title dropped");
            false
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

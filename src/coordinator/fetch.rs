//! Background page fetch with retry, reporting back to the coordinator.

use std::sync::Arc;
use std::time::Duration;

use shelf_search::{CacheKey, CatalogAdapter, SearchConfig, SearchError, SearchPage};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::retry::RetryPolicy;

/// Progress reports from a fetch task to the coordinator loop.
#[derive(Debug)]
pub(crate) enum FetchEvent {
    /// Attempt `attempt` failed; the next one starts after `delay`.
    Retrying {
        id: u64,
        attempt: u32,
        delay: Duration,
    },
    /// The fetch finished, successfully or with retries exhausted.
    Completed {
        id: u64,
        key: CacheKey,
        page: u32,
        outcome: Result<SearchPage, SearchError>,
    },
}

/// One page request as issued by the coordinator.
#[derive(Debug, Clone)]
pub(crate) struct FetchRequest {
    pub(crate) id: u64,
    pub(crate) key: CacheKey,
    pub(crate) query: String,
    pub(crate) page: u32,
}

/// Fetch `request` until it succeeds, fails for good, or `cancel` fires.
///
/// Cancellation of `cancel` ends the task without reporting: a superseded
/// request never produces an event. Every other outcome, including a
/// `Canceled` error nobody asked for, ends in [`FetchEvent::Completed`].
pub(crate) async fn run<A: CatalogAdapter>(
    adapters: Arc<[A]>,
    config: Arc<SearchConfig>,
    policy: RetryPolicy,
    request: FetchRequest,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<FetchEvent>,
) {
    let mut attempt = 0;
    let outcome = loop {
        match shelf_search::fetch_page(&adapters[..], &request.query, request.page, &config, &cancel)
            .await
        {
            Ok(page) => break Ok(page),
            Err(e) if e.is_cancellation() && cancel.is_cancelled() => {
                debug!(id = request.id, key = %request.key, "fetch canceled");
                return;
            }
            Err(e) if policy.should_retry(attempt, &e) => {
                let delay = policy.delay_for(attempt);
                attempt += 1;
                warn!(
                    id = request.id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "page fetch failed, retrying: {e}"
                );
                if events
                    .send(FetchEvent::Retrying {
                        id: request.id,
                        attempt,
                        delay,
                    })
                    .is_err()
                {
                    return;
                }
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!(id = request.id, "fetch canceled during backoff");
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => break Err(e),
        }
    };

    if cancel.is_cancelled() {
        return;
    }
    let _ = events.send(FetchEvent::Completed {
        id: request.id,
        key: request.key,
        page: request.page,
        outcome,
    });
}

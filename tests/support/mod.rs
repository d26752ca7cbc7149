//! Shared fixtures for coordinator integration tests.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shelf::{NormalizedRecord, SearchError, SearchView, ShelfConfig, Source};
use shelf_search::{AdapterPage, CatalogAdapter, TotalHint};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

type Responder = Arc<dyn Fn(&str, u32) -> AdapterPage + Send + Sync>;

/// One recorded adapter request.
#[derive(Debug, Clone)]
pub struct Call {
    pub query: String,
    pub page: u32,
    pub at: Instant,
}

#[derive(Default)]
struct Shared {
    calls: Mutex<Vec<Call>>,
    answered: AtomicUsize,
    failures_left: AtomicU32,
    aborts: AtomicBool,
}

/// In-process catalog with scripted answers, latency and outages.
///
/// Clones share their call log, so a test can keep one clone for
/// inspection after handing another to the coordinator.
#[derive(Clone)]
pub struct ScriptedAdapter {
    source: Source,
    respond: Responder,
    delay: Duration,
    query_delays: HashMap<String, Duration>,
    shared: Arc<Shared>,
}

impl ScriptedAdapter {
    pub fn new<F>(source: Source, respond: F) -> Self
    where
        F: Fn(&str, u32) -> AdapterPage + Send + Sync + 'static,
    {
        Self {
            source,
            respond: Arc::new(respond),
            delay: Duration::ZERO,
            query_delays: HashMap::new(),
            shared: Arc::default(),
        }
    }

    /// Respond after `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Respond to `query` after `delay` instead of the default delay.
    pub fn with_query_delay(mut self, query: &str, delay: Duration) -> Self {
        self.query_delays.insert(query.to_string(), delay);
        self
    }

    /// Fail the first `n` requests with an HTTP error.
    pub fn failing_first(self, n: u32) -> Self {
        self.shared.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Answer every request with `Canceled` while leaving the token alone.
    pub fn aborting(self) -> Self {
        self.shared.aborts.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, query: &str) -> usize {
        self.calls().iter().filter(|c| c.query == query).count()
    }

    /// Requests that ran to their scripted answer (not cancelled).
    pub fn answered(&self) -> usize {
        self.shared.answered.load(Ordering::SeqCst)
    }
}

impl CatalogAdapter for ScriptedAdapter {
    async fn fetch_page(
        &self,
        query: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<AdapterPage, SearchError> {
        self.shared.calls.lock().unwrap().push(Call {
            query: query.to_string(),
            page,
            at: Instant::now(),
        });
        let delay = self.query_delays.get(query).copied().unwrap_or(self.delay);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SearchError::Canceled),
            _ = tokio::time::sleep(delay) => {}
        }
        self.shared.answered.fetch_add(1, Ordering::SeqCst);
        if self.shared.aborts.load(Ordering::SeqCst) {
            return Err(SearchError::Canceled);
        }

        let failing = self
            .shared
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SearchError::Http(format!("{} unavailable", self.source)));
        }
        Ok((self.respond)(query, page))
    }

    fn source(&self) -> Source {
        self.source
    }
}

pub fn book(title: &str, author: &str, source: Source) -> NormalizedRecord {
    NormalizedRecord::new(
        format!("{source}:{title}"),
        title,
        &[author.to_string()],
        source,
    )
    .unwrap()
}

pub fn page_of(source: Source, books: &[(&str, &str)], total: TotalHint) -> AdapterPage {
    AdapterPage {
        records: books
            .iter()
            .map(|(title, author)| book(title, author, source))
            .collect(),
        total,
    }
}

/// Default config with a small page size so paging is easy to exercise.
pub fn test_config() -> ShelfConfig {
    let mut config = ShelfConfig::default();
    config.search.page_size = 2;
    config
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Wait until a published view satisfies `pred`, failing after a minute
/// of (virtual) time.
pub async fn wait_for<F>(views: &mut watch::Receiver<SearchView>, pred: F) -> SearchView
where
    F: FnMut(&SearchView) -> bool,
{
    tokio::time::timeout(Duration::from_secs(60), views.wait_for(pred))
        .await
        .expect("view condition not reached")
        .expect("coordinator stopped")
        .clone()
}

pub fn titles(view: &SearchView) -> Vec<&str> {
    view.records.iter().map(|r| r.title.as_str()).collect()
}

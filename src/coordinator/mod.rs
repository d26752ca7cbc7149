//! Interactive search session coordinator.
//!
//! [`SearchCoordinator`] owns one search session on a background tokio task.
//! The presentation layer sends input through the handle and observes
//! [`SearchView`] snapshots through a `watch` channel.
//!
//! # Lifecycle
//!
//! ```text
//! set_query ─▶ Debouncing ─(quiet window)─▶ cache hit? ─yes─▶ Succeeded
//!                                               │ no
//!                                               ▼
//!                                           Fetching ─ok─▶ Succeeded
//!                                               │ transient error
//!                                               ▼
//!                                           Retrying ─(retries exhausted)─▶ Failed
//! ```
//!
//! Input that moves away from the current query cancels its in-flight
//! fetches at once; if the input settles back on the same query, the
//! interrupted page is requested again.
//!
//! The task is the only writer of session state and of the result cache.
//! Fetches run as separate tasks and report back over a channel; each
//! carries a request id, so a completion for a superseded request is
//! dropped without touching the session.

mod fetch;
pub mod retry;
pub mod state;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use shelf_search::sanitize::sanitize_query;
use shelf_search::{CacheKey, CatalogAdapter, ResultCache, SearchConfig};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ShelfConfig;
use crate::error::{Result, ShelfError};

use fetch::{FetchEvent, FetchRequest};
use retry::RetryPolicy;
use state::Session;
pub use state::{SearchPhase, SearchView};

/// Input from the presentation layer.
#[derive(Debug)]
enum Command {
    SetQuery(String),
    LoadMore,
    Retry,
}

/// Handle to a running search session.
///
/// Dropping the handle stops the session task and cancels its fetches.
#[derive(Debug)]
pub struct SearchCoordinator {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<SearchView>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SearchCoordinator {
    /// Start a session over `adapters`, reading and writing `cache`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a config error if `config` is invalid or `adapters` is empty.
    pub fn spawn<A>(adapters: Vec<A>, cache: Arc<ResultCache>, config: &ShelfConfig) -> Result<Self>
    where
        A: CatalogAdapter + 'static,
    {
        config.validate()?;
        if adapters.is_empty() {
            return Err(ShelfError::Config("at least one catalog adapter is required".into()));
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(SearchView::default());
        let shutdown = CancellationToken::new();

        info!(catalogs = adapters.len(), "search coordinator started");
        let actor = Actor {
            adapters: adapters.into(),
            cache,
            search: Arc::new(config.search.clone()),
            policy: config.session.retry_policy(),
            debounce: config.session.debounce(),
            session: Session::default(),
            settle_at: None,
            in_flight: HashMap::new(),
            next_id: 0,
            view_tx,
            events: event_tx,
            shutdown: shutdown.clone(),
        };
        let task = tokio::spawn(actor.run(command_rx, event_rx));

        Ok(Self {
            commands: command_tx,
            view: view_rx,
            shutdown,
            task: Some(task),
        })
    }

    /// Replace the raw query text. Restarts the debounce window.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Closed`] if the session task has stopped.
    pub fn set_query(&self, text: impl Into<String>) -> Result<()> {
        self.send(Command::SetQuery(text.into()))
    }

    /// Request the next page of the current query.
    ///
    /// Ignored while a page is loading, after a failure, when no catalog
    /// reports further results, or without an active query.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Closed`] if the session task has stopped.
    pub fn load_more(&self) -> Result<()> {
        self.send(Command::LoadMore)
    }

    /// Re-issue the failed page request with a fresh retry budget.
    ///
    /// Ignored unless the session is [`SearchPhase::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Closed`] if the session task has stopped.
    pub fn retry(&self) -> Result<()> {
        self.send(Command::Retry)
    }

    /// The latest published snapshot.
    pub fn view(&self) -> SearchView {
        self.view.borrow().clone()
    }

    /// A receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.view.clone()
    }

    /// Cancel in-flight fetches and wait for the session task to stop.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Closed`] if the task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        self.shutdown.cancel();
        match self.task.take() {
            Some(task) => task.await.map_err(|e| {
                warn!("search coordinator task ended abnormally: {e}");
                ShelfError::Closed
            }),
            None => Ok(()),
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| ShelfError::Closed)
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[derive(Debug)]
struct InFlight {
    id: u64,
    page: u32,
    cancel: CancellationToken,
}

struct Actor<A> {
    adapters: Arc<[A]>,
    cache: Arc<ResultCache>,
    search: Arc<SearchConfig>,
    policy: RetryPolicy,
    debounce: Duration,
    session: Session,
    /// End of the current debounce window.
    settle_at: Option<Instant>,
    in_flight: HashMap<CacheKey, InFlight>,
    next_id: u64,
    view_tx: watch::Sender<SearchView>,
    events: mpsc::UnboundedSender<FetchEvent>,
    shutdown: CancellationToken,
}

impl<A: CatalogAdapter + 'static> Actor<A> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<FetchEvent>,
    ) {
        loop {
            let settle_at = self.settle_at;
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                Some(event) = events.recv() => self.handle_event(event),
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                _ = tokio::time::sleep_until(settle_at.unwrap_or_else(Instant::now)), if settle_at.is_some() => {
                    self.settle_at = None;
                    self.settle();
                }
            }
        }

        self.cancel_in_flight(None);
        info!("search coordinator stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetQuery(text) => {
                if CacheKey::new(&sanitize_query(&text), 1) != CacheKey::new(&self.session.query, 1)
                {
                    self.interrupt();
                }
                self.session.raw_query = text;
                self.session.debouncing = true;
                self.settle_at = Some(Instant::now() + self.debounce);
                self.publish();
            }
            Command::LoadMore => match self.session.next_page() {
                Some(page) => self.start_fetch(page),
                None => debug!("load_more ignored"),
            },
            Command::Retry => match self.session.retry_page() {
                Some(page) => {
                    info!(page, "manual retry");
                    self.start_fetch(page);
                }
                None => debug!("retry ignored: nothing failed"),
            },
        }
    }

    /// The debounce window elapsed with `raw_query` unchanged.
    fn settle(&mut self) {
        self.session.debouncing = false;
        let query = sanitize_query(&self.session.raw_query);
        if query == self.session.query {
            match self.session.interrupted.take() {
                Some(page) => self.start_fetch(page),
                None => self.publish(),
            }
            return;
        }

        tracing::trace!(%query, "query settled");
        self.session.begin_query(query);
        if self.session.query.is_empty() {
            self.cancel_in_flight(None);
            self.publish();
            return;
        }
        self.start_fetch(1);
    }

    /// Input moved away from the current query: stop its fetches now, so a
    /// late answer cannot land while the new input is still debouncing.
    fn interrupt(&mut self) {
        let Some(page) = self.in_flight.values().map(|f| f.page).min() else {
            return;
        };
        self.cancel_in_flight(None);
        self.session.interrupted = Some(page);
        self.session.loading = false;
    }

    fn start_fetch(&mut self, page: u32) {
        let key = CacheKey::new(&self.session.query, page);
        self.cancel_in_flight(Some(&key));

        if self.in_flight.contains_key(&key) {
            debug!(%key, "request already in flight, coalesced");
            self.session.begin_fetch();
            self.publish();
            return;
        }

        if let Some(cached) = self.cache.get(&key) {
            debug!(%key, "served from cache");
            self.session.apply_page(cached);
            self.publish();
            return;
        }

        let id = self.next_id;
        self.next_id += 1;
        let cancel = self.shutdown.child_token();
        self.in_flight.insert(
            key.clone(),
            InFlight {
                id,
                page,
                cancel: cancel.clone(),
            },
        );
        self.session.begin_fetch();
        self.publish();

        debug!(id, %key, "fetch started");
        let request = FetchRequest {
            id,
            key,
            query: self.session.query.clone(),
            page,
        };
        tokio::spawn(fetch::run(
            Arc::clone(&self.adapters),
            Arc::clone(&self.search),
            self.policy,
            request,
            cancel,
            self.events.clone(),
        ));
    }

    fn handle_event(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::Retrying { id, attempt, delay } => {
                if !self.in_flight.values().any(|f| f.id == id) {
                    debug!(id, "stale retry notice dropped");
                    return;
                }
                debug!(id, attempt, delay_ms = delay.as_millis() as u64, "retry scheduled");
                self.session.begin_retry(attempt);
                self.publish();
            }
            FetchEvent::Completed {
                id,
                key,
                page,
                outcome,
            } => {
                if self.in_flight.get(&key).map(|f| f.id) != Some(id) {
                    debug!(id, %key, "stale completion dropped");
                    return;
                }
                self.in_flight.remove(&key);
                match outcome {
                    Ok(result) => {
                        debug!(id, %key, records = result.records.len(), "page fetched");
                        self.cache.set(key, result.clone());
                        self.session.apply_page(result);
                    }
                    Err(e) => {
                        warn!(id, %key, "page fetch failed: {e}");
                        self.session.apply_failure(page, &e);
                    }
                }
                self.publish();
            }
        }
    }

    /// Cancel every in-flight request except the one for `keep`.
    fn cancel_in_flight(&mut self, keep: Option<&CacheKey>) {
        self.in_flight.retain(|key, in_flight| {
            if Some(key) == keep {
                return true;
            }
            debug!(id = in_flight.id, %key, "in-flight request canceled");
            in_flight.cancel.cancel();
            false
        });
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.session.view());
    }
}

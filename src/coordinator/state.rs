//! Session state owned by the coordinator task and the snapshot it publishes.

use serde::Serialize;
use shelf_search::{NormalizedRecord, SearchError, SearchPage, extend_unique};

/// Where a session is in its request lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SearchPhase {
    /// No active query.
    #[default]
    Idle,
    /// Input changed; waiting for the debounce window to elapse.
    Debouncing,
    /// A page request is in flight.
    Fetching,
    /// The last attempt failed and another is scheduled.
    Retrying,
    /// The latest page request completed.
    Succeeded,
    /// Retries are exhausted; [`super::SearchCoordinator::retry`] starts over.
    Failed,
}

/// Snapshot of a search session, as seen by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchView {
    /// The settled (debounced, sanitised) query.
    pub query: String,
    /// Every record loaded so far for `query`, pages 1 through `page_number`.
    pub records: Vec<NormalizedRecord>,
    /// At least one catalog reports results beyond the loaded pages.
    pub has_more: bool,
    /// A page request is in flight.
    pub loading: bool,
    /// Message of the last unrecovered failure.
    pub error: Option<String>,
    /// Retries spent on the current request.
    pub retry_count: u32,
    /// Last page merged into `records` (1 while the first page loads).
    pub page_number: u32,
    /// Largest total any catalog reported.
    pub total_results: u64,
    /// Lifecycle phase.
    pub phase: SearchPhase,
}

#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) raw_query: String,
    pub(crate) query: String,
    pub(crate) page_number: u32,
    pub(crate) records: Vec<NormalizedRecord>,
    pub(crate) has_more: bool,
    pub(crate) total_results: u64,
    pub(crate) loading: bool,
    pub(crate) error: Option<String>,
    pub(crate) retry_count: u32,
    /// Page whose fetch failed last, retried by a manual retry.
    pub(crate) failed_page: Option<u32>,
    pub(crate) debouncing: bool,
    /// Page whose fetch was cancelled by input that has not settled yet.
    pub(crate) interrupted: Option<u32>,
    phase: SearchPhase,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            raw_query: String::new(),
            query: String::new(),
            page_number: 1,
            records: Vec::new(),
            has_more: false,
            total_results: 0,
            loading: false,
            error: None,
            retry_count: 0,
            failed_page: None,
            debouncing: false,
            interrupted: None,
            phase: SearchPhase::Idle,
        }
    }
}

impl Session {
    pub(crate) fn view(&self) -> SearchView {
        SearchView {
            query: self.query.clone(),
            records: self.records.clone(),
            has_more: self.has_more,
            loading: self.loading,
            error: self.error.clone(),
            retry_count: self.retry_count,
            page_number: self.page_number,
            total_results: self.total_results,
            phase: if self.debouncing {
                SearchPhase::Debouncing
            } else {
                self.phase
            },
        }
    }

    /// Start over for a newly settled query.
    pub(crate) fn begin_query(&mut self, query: String) {
        let raw_query = std::mem::take(&mut self.raw_query);
        *self = Self {
            raw_query,
            query,
            ..Self::default()
        };
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
        self.retry_count = 0;
        self.failed_page = None;
        self.interrupted = None;
        self.phase = SearchPhase::Fetching;
    }

    pub(crate) fn begin_retry(&mut self, attempt: u32) {
        self.retry_count = attempt;
        self.phase = SearchPhase::Retrying;
    }

    /// Merge a fetched page: page 1 replaces the list, later pages extend
    /// it without cross-page duplicates.
    pub(crate) fn apply_page(&mut self, page: SearchPage) {
        if page.page_number <= 1 {
            self.records = page.records;
        } else {
            let appended = extend_unique(&mut self.records, page.records);
            tracing::debug!(page = page.page_number, appended, "page appended");
        }
        self.page_number = page.page_number;
        self.has_more = page.has_more;
        self.total_results = self.total_results.max(page.total_results);
        self.loading = false;
        self.error = None;
        self.retry_count = 0;
        self.failed_page = None;
        self.phase = SearchPhase::Succeeded;
    }

    pub(crate) fn apply_failure(&mut self, page: u32, error: &SearchError) {
        self.loading = false;
        self.error = Some(error.to_string());
        self.failed_page = Some(page);
        self.phase = SearchPhase::Failed;
    }

    /// Page a manual retry should request, if the session is failed.
    pub(crate) fn retry_page(&self) -> Option<u32> {
        if self.loading || self.query.is_empty() {
            return None;
        }
        self.failed_page
    }

    /// Page `load_more` should request, if loading more is allowed now.
    pub(crate) fn next_page(&self) -> Option<u32> {
        let blocked = self.loading
            || self.debouncing
            || self.error.is_some()
            || !self.has_more
            || self.query.is_empty();
        if blocked {
            None
        } else {
            self.page_number.checked_add(1)
        }
    }
}

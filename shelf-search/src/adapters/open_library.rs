//! Open Library search API adapter.
//!
//! Open Library pages by `page`/`limit` and returns flat `docs`. Covers
//! are referenced by numeric id and served from a separate host.

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::adapter::{AdapterPage, CatalogAdapter, TotalHint};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::types::{NormalizedRecord, Source};

/// Public site that work keys are relative to.
const SITE_URL: &str = "https://openlibrary.org";

/// Cover image host.
const COVERS_URL: &str = "https://covers.openlibrary.org/b/id";

/// Only the fields we map; keeps responses small.
const FIELDS: &str = "key,title,author_name,cover_i,first_publish_year";

/// Open Library catalog adapter.
#[derive(Debug, Clone)]
pub struct OpenLibraryAdapter {
    client: reqwest::Client,
    endpoint: Url,
    page_size: u32,
}

impl OpenLibraryAdapter {
    /// Create an adapter sharing `client`, using the endpoint and page
    /// size from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the endpoint is not a valid URL.
    pub fn new(client: reqwest::Client, config: &SearchConfig) -> Result<Self, SearchError> {
        let endpoint = Url::parse(&config.open_library_url)
            .map_err(|e| SearchError::Config(format!("open_library_url: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            page_size: config.page_size,
        })
    }

    fn page_url(&self, query: &str, page: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("page", &page.max(1).to_string())
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("fields", FIELDS);
        url
    }
}

impl CatalogAdapter for OpenLibraryAdapter {
    async fn fetch_page(
        &self,
        query: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<AdapterPage, SearchError> {
        tracing::trace!(query, page, "Open Library request");
        let raw: SearchResponse =
            http::get_json(&self.client, self.page_url(query, page), Source::OpenLibrary, cancel)
                .await?;
        Ok(map_docs(raw))
    }

    fn source(&self) -> Source {
        Source::OpenLibrary
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(rename = "numFound", default)]
    num_found: Option<u64>,
    #[serde(default)]
    docs: Vec<Doc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Doc {
    key: Option<String>,
    title: Option<String>,
    author_name: Vec<String>,
    cover_i: Option<i64>,
    first_publish_year: Option<i32>,
}

/// Map a decoded search response into normalised records.
///
/// Docs without a key or usable title are dropped.
pub(crate) fn map_docs(raw: SearchResponse) -> AdapterPage {
    let total = raw.num_found.map_or(TotalHint::Unknown, TotalHint::Known);
    let received = raw.docs.len();

    let records: Vec<NormalizedRecord> = raw
        .docs
        .into_iter()
        .filter_map(|doc| {
            let key = doc.key?;
            let title = doc.title.unwrap_or_default();
            let cover = doc
                .cover_i
                .filter(|id| *id > 0)
                .map(|id| format!("{COVERS_URL}/{id}-M.jpg"));
            let work = format!("{SITE_URL}{key}");

            NormalizedRecord::new(key, &title, &doc.author_name, Source::OpenLibrary).map(
                |record| {
                    record
                        .with_thumbnail(cover)
                        .with_published_date(doc.first_publish_year.map(|y| y.to_string()))
                        .with_link("work", Some(work))
                },
            )
        })
        .collect();

    if records.len() < received {
        tracing::debug!(
            dropped = received - records.len(),
            "Open Library docs without key or title dropped"
        );
    }

    AdapterPage { records, total }
}

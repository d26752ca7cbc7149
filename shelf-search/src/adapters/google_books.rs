//! Google Books volumes API adapter.
//!
//! Pages are addressed by `startIndex`/`maxResults`. The response nests
//! everything useful under `volumeInfo`, and `items` is omitted entirely
//! when a query matches nothing.

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::adapter::{AdapterPage, CatalogAdapter, TotalHint};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::types::{NormalizedRecord, Source};

/// Google Books catalog adapter.
///
/// Priority 1 source: richest metadata and preview links.
#[derive(Debug, Clone)]
pub struct GoogleBooksAdapter {
    client: reqwest::Client,
    endpoint: Url,
    page_size: u32,
}

impl GoogleBooksAdapter {
    /// Create an adapter sharing `client`, using the endpoint and page
    /// size from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the endpoint is not a valid URL.
    pub fn new(client: reqwest::Client, config: &SearchConfig) -> Result<Self, SearchError> {
        let endpoint = Url::parse(&config.google_books_url)
            .map_err(|e| SearchError::Config(format!("google_books_url: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            page_size: config.page_size,
        })
    }

    fn page_url(&self, query: &str, page: u32) -> Url {
        let start_index = u64::from(page.saturating_sub(1)) * u64::from(self.page_size);
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("startIndex", &start_index.to_string())
            .append_pair("maxResults", &self.page_size.to_string())
            .append_pair("printType", "books");
        url
    }
}

impl CatalogAdapter for GoogleBooksAdapter {
    async fn fetch_page(
        &self,
        query: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<AdapterPage, SearchError> {
        tracing::trace!(query, page, "Google Books request");
        let raw: VolumesResponse =
            http::get_json(&self.client, self.page_url(query, page), Source::GoogleBooks, cancel)
                .await?;
        Ok(map_volumes(raw))
    }

    fn source(&self) -> Source {
        Source::GoogleBooks
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VolumesResponse {
    #[serde(default)]
    total_items: Option<u64>,
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    id: String,
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VolumeInfo {
    title: Option<String>,
    authors: Vec<String>,
    published_date: Option<String>,
    image_links: Option<ImageLinks>,
    preview_link: Option<String>,
    info_link: Option<String>,
    canonical_volume_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ImageLinks {
    thumbnail: Option<String>,
    small_thumbnail: Option<String>,
}

/// Map a decoded volumes response into normalised records.
///
/// Volumes without a usable title are dropped.
pub(crate) fn map_volumes(raw: VolumesResponse) -> AdapterPage {
    let total = raw.total_items.map_or(TotalHint::Unknown, TotalHint::Known);
    let received = raw.items.len();

    let records: Vec<NormalizedRecord> = raw
        .items
        .into_iter()
        .filter_map(|volume| {
            let info = volume.volume_info;
            let title = info.title.unwrap_or_default();
            let thumbnail = info
                .image_links
                .and_then(|links| links.thumbnail.or(links.small_thumbnail))
                .map(|url| force_https(&url));

            NormalizedRecord::new(volume.id, &title, &info.authors, Source::GoogleBooks).map(
                |record| {
                    record
                        .with_thumbnail(thumbnail)
                        .with_published_date(info.published_date)
                        .with_link("preview", info.preview_link)
                        .with_link("info", info.info_link)
                        .with_link("canonical", info.canonical_volume_link)
                },
            )
        })
        .collect();

    if records.len() < received {
        tracing::debug!(
            dropped = received - records.len(),
            "Google Books volumes without usable title dropped"
        );
    }

    AdapterPage { records, total }
}

/// Google serves thumbnails over plain HTTP; the same paths work over HTTPS.
fn force_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

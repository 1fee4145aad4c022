//! HTTP client and fetch loop for the statements API.
//!
//! Pages are requested strictly in sequence: page 0 first to learn the page
//! count, then one request per remaining page. The first failure aborts the
//! whole cycle and everything fetched so far is discarded; no partial
//! collections ever leave this module.

use crate::models::{PageResponse, StatementRecord};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors surfaced by a fetch cycle. None of them are retried.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A page request returned a non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Http {
        status: reqwest::StatusCode,
        url: String,
    },

    /// The transport failed before a status was available
    /// (connection refused, timeout, ...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response body did not match the expected page shape.
    #[error("failed to decode page {page}: {source}")]
    Decode {
        page: u32,
        #[source]
        source: serde_json::Error,
    },

    /// The server reported more pages than the configured upper bound.
    #[error("server reported {total_pages} pages, above the limit of {max_pages}")]
    TooManyPages { total_pages: u32, max_pages: u32 },
}

/// Options for one fetch cycle.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Records per page request. The upstream endpoint accepts at most 5000.
    pub page_size: u32,
    /// Optional server-side title filter.
    pub title_filter: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: 5000,
            title_filter: None,
            timeout_seconds: 60,
        }
    }
}

/// Source of result pages.
///
/// The HTTP client is the production implementation; tests substitute an
/// in-memory sequence to exercise the loop without a server.
pub trait PageSource {
    /// Fetch the page at `index`.
    async fn page(&self, index: u32) -> Result<PageResponse, FetchError>;
}

/// Result of a completed fetch cycle.
#[derive(Debug)]
pub struct FetchOutcome {
    /// All records, in page order then intra-page order.
    pub records: Vec<StatementRecord>,
    /// Number of page requests issued.
    pub pages_fetched: u32,
}

/// Client for the statements API.
pub struct StatementClient {
    base_url: String,
    options: FetchOptions,
    http_client: reqwest::Client,
}

impl StatementClient {
    /// Create a client with the given base URL and fetch options.
    pub fn new(base_url: String, options: FetchOptions) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            options,
            http_client,
        }
    }

    /// Check that the API is reachable via `GET /api/health`.
    pub async fn health(&self) -> Result<bool, FetchError> {
        #[derive(serde::Deserialize)]
        struct HealthResponse {
            #[serde(default)]
            ok: bool,
        }

        let url = format!("{}/api/health", self.base_url);
        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Http {
                status: response.status(),
                url,
            });
        }

        let body: HealthResponse = response.json().await?;
        Ok(body.ok)
    }
}

impl PageSource for StatementClient {
    async fn page(&self, index: u32) -> Result<PageResponse, FetchError> {
        let url = format!("{}/api/statements", self.base_url);
        let mut query: Vec<(&str, String)> = vec![
            ("page", index.to_string()),
            ("size", self.options.page_size.to_string()),
        ];
        if let Some(ref title) = self.options.title_filter {
            query.push(("title", title.clone()));
        }

        debug!("Requesting page {} from {}", index, url);

        let response = self.http_client.get(&url).query(&query).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Http {
                status: response.status(),
                url: response.url().to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            page: index,
            source: e,
        })
    }
}

/// Fetch all pages from `source` sequentially and concatenate their content.
///
/// Page 0 determines the page count. A missing or zero `total_pages` means
/// page 0 is the only page. A page count above `max_pages` fails fast with
/// [`FetchError::TooManyPages`] before any further request is issued.
///
/// `on_page` is invoked after each successful page with
/// `(pages_fetched, total_pages)` so the caller can render progress.
pub async fn fetch_all<S: PageSource>(
    source: &S,
    max_pages: u32,
    mut on_page: impl FnMut(u32, u32),
) -> Result<FetchOutcome, FetchError> {
    let first = source.page(0).await?;
    let total_pages = first.total_pages();

    if let Some(total) = first.total_elements() {
        debug!("Server reports {} records across {} pages", total, total_pages);
    }

    if total_pages > max_pages {
        return Err(FetchError::TooManyPages {
            total_pages,
            max_pages,
        });
    }

    let mut records = first.content;
    let mut pages_fetched = 1u32;
    on_page(pages_fetched, total_pages.max(1));

    let mut page = 0u32;
    while page + 1 < total_pages {
        page += 1;
        let response = source.page(page).await?;
        records.extend(response.content);
        pages_fetched += 1;
        on_page(pages_fetched, total_pages);
    }

    info!(
        "Fetched {} records across {} pages",
        records.len(),
        pages_fetched
    );

    Ok(FetchOutcome {
        records,
        pages_fetched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PageMeta, StatementRecord};

    enum FakePage {
        Ok(PageResponse),
        Status(u16),
    }

    struct FakeSource {
        pages: Vec<FakePage>,
    }

    impl PageSource for FakeSource {
        async fn page(&self, index: u32) -> Result<PageResponse, FetchError> {
            match self.pages.get(index as usize) {
                Some(FakePage::Ok(page)) => Ok(page.clone()),
                Some(FakePage::Status(status)) => Err(FetchError::Http {
                    status: reqwest::StatusCode::from_u16(*status).unwrap(),
                    url: format!("http://fake/api/statements?page={}", index),
                }),
                None => panic!("unexpected request for page {}", index),
            }
        }
    }

    fn page_of(ids: &[&str], total_pages: u32) -> PageResponse {
        PageResponse {
            content: ids
                .iter()
                .map(|id| StatementRecord {
                    id: id.to_string(),
                    title: format!("Paper {}", id),
                    count: 1,
                })
                .collect(),
            page: Some(PageMeta {
                total_pages: Some(total_pages),
                ..PageMeta::default()
            }),
        }
    }

    #[tokio::test]
    async fn test_fetch_all_multi_page_order() {
        let source = FakeSource {
            pages: vec![
                FakePage::Ok(page_of(&["P1", "P2"], 3)),
                FakePage::Ok(page_of(&["P3"], 3)),
                FakePage::Ok(page_of(&["P4", "P5"], 3)),
            ],
        };

        let outcome = fetch_all(&source, 1000, |_, _| {}).await.unwrap();

        assert_eq!(outcome.pages_fetched, 3);
        let ids: Vec<&str> = outcome.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2", "P3", "P4", "P5"]);
    }

    #[tokio::test]
    async fn test_fetch_all_single_page() {
        let source = FakeSource {
            pages: vec![FakePage::Ok(page_of(&["P1"], 1))],
        };

        let outcome = fetch_all(&source, 1000, |_, _| {}).await.unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.pages_fetched, 1);
    }

    #[tokio::test]
    async fn test_fetch_all_missing_page_meta() {
        // No pagination metadata at all: page 0 is the only page.
        let source = FakeSource {
            pages: vec![FakePage::Ok(PageResponse {
                content: vec![StatementRecord::with_count(3)],
                page: None,
            })],
        };

        let outcome = fetch_all(&source, 1000, |_, _| {}).await.unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.pages_fetched, 1);
    }

    #[tokio::test]
    async fn test_fetch_all_empty_dataset() {
        let source = FakeSource {
            pages: vec![FakePage::Ok(page_of(&[], 0))],
        };

        let outcome = fetch_all(&source, 1000, |_, _| {}).await.unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.pages_fetched, 1);
    }

    #[tokio::test]
    async fn test_fetch_all_fails_on_first_page() {
        let source = FakeSource {
            pages: vec![FakePage::Status(500)],
        };

        let err = fetch_all(&source, 1000, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, FetchError::Http { status, .. }
            if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_fetch_all_fails_on_later_page() {
        // A failure on any page, not just the first, aborts the cycle.
        let source = FakeSource {
            pages: vec![
                FakePage::Ok(page_of(&["P1"], 3)),
                FakePage::Ok(page_of(&["P2"], 3)),
                FakePage::Status(503),
            ],
        };

        let err = fetch_all(&source, 1000, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, FetchError::Http { .. }));
    }

    #[tokio::test]
    async fn test_fetch_all_too_many_pages() {
        let source = FakeSource {
            pages: vec![FakePage::Ok(page_of(&["P1"], 50))],
        };

        let err = fetch_all(&source, 10, |_, _| {}).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::TooManyPages {
                total_pages: 50,
                max_pages: 10
            }
        ));
    }

    #[tokio::test]
    async fn test_fetch_all_reports_progress() {
        let source = FakeSource {
            pages: vec![
                FakePage::Ok(page_of(&["P1"], 2)),
                FakePage::Ok(page_of(&["P2"], 2)),
            ],
        };

        let mut seen = Vec::new();
        fetch_all(&source, 1000, |done, total| seen.push((done, total)))
            .await
            .unwrap();

        assert_eq!(seen, vec![(1, 2), (2, 2)]);
    }
}

//! Upstream API access: transport capability, endpoints, and the two
//! single-request operations built on top of it.
//!
//! # Architecture
//!
//! The module uses a trait-based design so the pipeline never depends on a
//! specific HTTP stack:
//! - [`Transport`]: the minimal "GET a URL, return the body" capability
//! - [`HttpTransport`]: the production implementation backed by `reqwest`
//! - [`fetch_top_identifiers`]: identifier source (one call, one decode)
//! - [`fetch_item`]: item fetcher (one call, one decode, URL validation and
//!   domain derivation)
//!
//! Neither operation retries. Retrying is the scheduler's job, at the
//! granularity of a whole refresh cycle.

use crate::domain::extract_domain;
use crate::error::{FetchError, TransportError};
use crate::models::{ItemPayload, StoryRecord};
use crate::utils::truncate_for_log;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Base URL of the public Hacker News API.
pub const DEFAULT_API_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// Capability to fetch the body behind a URL.
///
/// The returned future must be `Send` so the batch coordinator can run each
/// fetch on its own task.
pub trait Transport: Send + Sync {
    /// Perform a `GET` and return the raw response body.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// [`Transport`] backed by a shared `reqwest` client.
///
/// Cloning is cheap; the connection pool is shared between clones.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a client with a connect timeout and an overall request timeout.
    ///
    /// # Arguments
    ///
    /// * `request_timeout` - Upper bound for a whole request, body included
    pub fn new(request_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .connect_timeout(Duration::from_secs(5).min(request_timeout))
            .timeout(request_timeout)
            .build()
            .map_err(|e| TransportError::Client(e.into()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    #[instrument(level = "debug", skip(self))]
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let t0 = Instant::now();
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::request(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::request(url, e))?;

        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "GET complete"
        );
        Ok(body.to_vec())
    }
}

/// The two endpoints the pipeline talks to, derived from one base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// `{base}/topstories.json`
    pub fn top_stories(&self) -> String {
        format!("{}/topstories.json", self.base)
    }

    /// `{base}/item/{id}.json`
    pub fn item(&self, id: u64) -> String {
        format!("{}/item/{}.json", self.base, id)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

/// Fetch the current top-ranked identifiers and keep the first `count`.
///
/// # Errors
///
/// * [`FetchError::Transport`] if the request fails
/// * [`FetchError::Decode`] if the body is not a JSON array of integers
/// * [`FetchError::InsufficientData`] if fewer than `count` identifiers came back
#[instrument(level = "info", skip(transport, endpoints))]
pub async fn fetch_top_identifiers<T: Transport>(
    transport: &T,
    endpoints: &Endpoints,
    count: usize,
) -> Result<Vec<u64>, FetchError> {
    let url = endpoints.top_stories();
    let body = transport.get(&url).await?;
    let mut ids: Vec<u64> =
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: url.clone(),
            source,
        })?;

    if ids.len() < count {
        return Err(FetchError::InsufficientData {
            requested: count,
            available: ids.len(),
        });
    }

    let available = ids.len();
    ids.truncate(count);
    debug!(available, kept = ids.len(), "Fetched top story identifiers");
    Ok(ids)
}

/// Fetch one item and turn it into a [`StoryRecord`].
///
/// An item without a URL is rejected with [`FetchError::MissingUrl`]. A URL
/// that is present but has no derivable host is only reported; the record is
/// kept with an empty `domain`.
#[instrument(level = "debug", skip(transport, endpoints))]
pub async fn fetch_item<T: Transport>(
    transport: &T,
    endpoints: &Endpoints,
    id: u64,
) -> Result<StoryRecord, FetchError> {
    let url = endpoints.item(id);
    let body = transport.get(&url).await?;
    let payload: ItemPayload =
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: url.clone(),
            source,
        })?;

    let Some(link) = payload.link().map(str::to_string) else {
        return Err(FetchError::MissingUrl {
            id,
            preview: truncate_for_log(&String::from_utf8_lossy(&body), 200),
        });
    };

    let domain = match extract_domain(&link) {
        Ok(domain) => domain,
        Err(e) => {
            warn!(id, url = %link, error = %e, "Could not derive domain; keeping story without one");
            String::new()
        }
    };

    debug!(id, url = %link, %domain, "Fetched item");
    Ok(StoryRecord::from_payload(payload, link, domain))
}


#[cfg(test)]
mod tests {
    use super::mock::{MockResponse, MockTransport};
    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn test_endpoints() {
        let endpoints = Endpoints::new("https://hacker-news.firebaseio.com/v0/");
        assert_eq!(endpoints.base(), "https://hacker-news.firebaseio.com/v0");
        assert_eq!(
            endpoints.top_stories(),
            "https://hacker-news.firebaseio.com/v0/topstories.json"
        );
        assert_eq!(
            endpoints.item(8863),
            "https://hacker-news.firebaseio.com/v0/item/8863.json"
        );
        assert_eq!(Endpoints::default(), Endpoints::new(DEFAULT_API_BASE_URL));
    }

    #[tokio::test]
    async fn test_top_identifiers_truncated_in_order() {
        let transport = MockTransport::new().with_top(&[9, 4, 7, 1, 3]);
        let ids = fetch_top_identifiers(&transport, &MockTransport::endpoints(), 3)
            .await
            .unwrap();
        assert_eq!(ids, vec![9, 4, 7]);
    }

    #[tokio::test]
    async fn test_top_identifiers_exact_count() {
        let transport = MockTransport::new().with_top(&[1, 2]);
        let ids = fetch_top_identifiers(&transport, &MockTransport::endpoints(), 2)
            .await
            .unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_top_identifiers_insufficient() {
        let transport = MockTransport::new().with_top(&[1, 2]);
        let err = fetch_top_identifiers(&transport, &MockTransport::endpoints(), 30)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::InsufficientData {
                requested: 30,
                available: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_top_identifiers_decode_error() {
        let transport = MockTransport::new().with_response(
            MockTransport::endpoints().top_stories(),
            MockResponse::Body(br#"{"not": "a list"}"#.to_vec()),
        );
        let err = fetch_top_identifiers(&transport, &MockTransport::endpoints(), 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Decode);
    }

    #[tokio::test]
    async fn test_top_identifiers_transport_error() {
        let transport = MockTransport::new();
        let err = fetch_top_identifiers(&transport, &MockTransport::endpoints(), 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
    }

    #[tokio::test]
    async fn test_fetch_item_ok() {
        let transport = MockTransport::new().with_story(1, 50, "http://a.com/x");
        let record = fetch_item(&transport, &MockTransport::endpoints(), 1)
            .await
            .unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.score, 50);
        assert_eq!(record.url, "http://a.com/x");
        assert_eq!(record.domain, "a.com");
        assert_eq!(record.kind.as_deref(), Some("story"));
    }

    #[tokio::test]
    async fn test_fetch_item_missing_url() {
        let transport = MockTransport::new()
            .with_item(2, serde_json::json!({"id": 2, "title": "Ask HN", "score": 90}));
        let err = fetch_item(&transport, &MockTransport::endpoints(), 2)
            .await
            .unwrap_err();
        match err {
            FetchError::MissingUrl { id, preview } => {
                assert_eq!(id, 2);
                assert!(preview.contains("Ask HN"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_item_empty_url() {
        let transport = MockTransport::new().with_story(2, 90, "");
        let err = fetch_item(&transport, &MockTransport::endpoints(), 2)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::MissingUrl);
    }

    #[tokio::test]
    async fn test_fetch_item_malformed_url_kept() {
        let transport = MockTransport::new().with_story(3, 10, "badurl");
        let record = fetch_item(&transport, &MockTransport::endpoints(), 3)
            .await
            .unwrap();
        assert_eq!(record.url, "badurl");
        assert_eq!(record.domain, "");
    }

    #[tokio::test]
    async fn test_fetch_item_deleted_is_decode_error() {
        let transport = MockTransport::new().with_response(
            MockTransport::endpoints().item(4),
            MockResponse::Body(b"null".to_vec()),
        );
        let err = fetch_item(&transport, &MockTransport::endpoints(), 4)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Decode);
    }

    #[tokio::test]
    async fn test_fetch_item_transport_error() {
        let transport = MockTransport::new().with_failing_item(5);
        let err = fetch_item(&transport, &MockTransport::endpoints(), 5)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_http_transport_builds() {
        assert!(HttpTransport::new(Duration::from_secs(10)).is_ok());
    }
}

//! HTTP client for the Art Institute of Chicago public API.
//!
//! `GET {base}/artworks?page=n` answers with
//! `{ "pagination": { "total": .., "limit": .. }, "data": [ .. ] }`.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{Artwork, FetchError, Page, PageSource, PAGE_CAPACITY};

pub const DEFAULT_BASE_URL: &str = "https://api.artic.edu/api/v1";

const FIELDS: &str = "id,title,place_of_origin,artist_display,inscriptions,date_start,date_end";

/// Retry behaviour for a single page fetch.
#[derive(Debug, Copy, Clone)]
pub struct RetryConfig {
    /// Attempts after the first one.
    pub retries: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryConfig {
    pub fn new(retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(16) as u32;
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(1, 250, 2000)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryConfig,
    pub page_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
            page_capacity: PAGE_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArtworksResponse {
    pagination: Pagination,
    #[serde(default)]
    data: Vec<Artwork>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    total: u64,
    #[serde(default)]
    limit: Option<u64>,
}

/// Blocking catalog client.
#[derive(Clone)]
pub struct ArticClient {
    endpoint: String,
    agent: ureq::Agent,
    retry: RetryConfig,
    page_capacity: usize,
}

impl ArticClient {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .timeout_connect(config.connect_timeout)
            .user_agent(concat!("gallerist/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            endpoint: format!("{}/artworks", config.base_url.trim_end_matches('/')),
            agent,
            retry: config.retry,
            page_capacity: config.page_capacity,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn fetch_once(&self, page: u32) -> Result<Page, FetchError> {
        let response = self
            .agent
            .get(&self.endpoint)
            .query("page", &page.to_string())
            .query("limit", &self.page_capacity.to_string())
            .query("fields", FIELDS)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(status, _) => FetchError::Status { page, status },
                ureq::Error::Transport(t) => FetchError::Transport {
                    page,
                    message: t.to_string(),
                },
            })?;
        let body = response.into_string().map_err(|e| FetchError::Transport {
            page,
            message: e.to_string(),
        })?;
        decode_page(page, &body, self.page_capacity)
    }
}

/// Turn a response body into a page, warning when the server's page size
/// does not match the one pagination math assumes.
pub fn decode_page(page: u32, body: &str, page_capacity: usize) -> Result<Page, FetchError> {
    let parsed: ArtworksResponse =
        serde_json::from_str(body).map_err(|source| FetchError::Decode { page, source })?;
    if let Some(limit) = parsed.pagination.limit {
        if limit != page_capacity as u64 {
            warn!(page, server_limit = limit, page_capacity, "catalog page size differs from local capacity");
        }
    }
    Ok(Page {
        records: parsed.data,
        total: parsed.pagination.total,
    })
}

impl PageSource for ArticClient {
    fn fetch(&self, page: u32) -> Result<Page, FetchError> {
        let mut attempt = 0usize;
        loop {
            match self.fetch_once(page) {
                Ok(p) => {
                    debug!(page, rows = p.records.len(), total = p.total, "page fetched");
                    return Ok(p);
                }
                Err(e) if e.is_retryable() && attempt < self.retry.retries => {
                    attempt += 1;
                    let delay = self.retry.backoff(attempt);
                    warn!(page, attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying page fetch");
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const ONE_ROW: &str = r#"{"pagination": {"total": 1, "limit": 12}, "data": [{"id": 7, "title": "Nocturne"}]}"#;

    /// Serve one scripted status per accepted connection, then stop
    /// accepting. Returns the base URL and a count of connections taken.
    fn scripted_catalog(statuses: &[u16]) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let statuses = statuses.to_vec();
        std::thread::spawn(move || {
            for status in statuses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                seen.fetch_add(1, Ordering::SeqCst);
                let mut req = Vec::new();
                let mut buf = [0u8; 1024];
                while !req.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => req.extend_from_slice(&buf[..n]),
                    }
                }
                let body = if status == 200 { ONE_ROW } else { "{}" };
                let reply = format!(
                    "HTTP/1.1 {status} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(reply.as_bytes());
            }
        });
        (format!("http://{addr}/api/v1"), hits)
    }

    fn client(base_url: String, retry: RetryConfig) -> ArticClient {
        ArticClient::new(ClientConfig {
            base_url,
            timeout: Duration::from_secs(5),
            retry,
            ..ClientConfig::default()
        })
    }

    #[test]
    fn decodes_catalog_body() {
        let body = r#"{
            "pagination": {"total": 129884, "limit": 12, "offset": 0, "total_pages": 10824, "current_page": 1},
            "data": [
                {"id": 27992, "title": "A Sunday on La Grande Jatte", "place_of_origin": "France",
                 "artist_display": "Georges Seurat", "inscriptions": null, "date_start": 1884, "date_end": 1886},
                {"id": 4, "title": "Priest and Boy"}
            ]
        }"#;
        let page = decode_page(1, body, PAGE_CAPACITY).unwrap();
        assert_eq!(page.total, 129884);
        assert_eq!(page.ids().collect::<Vec<_>>(), vec![27992, 4]);
        assert_eq!(page.records[0].inscriptions, None);
        assert_eq!(page.records[1].date_end, None);
    }

    #[test]
    fn missing_pagination_is_a_decode_error() {
        let err = decode_page(3, r#"{"data": []}"#, PAGE_CAPACITY).unwrap_err();
        assert!(matches!(err, FetchError::Decode { page: 3, .. }));
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let r = RetryConfig::new(5, 100, 350);
        assert_eq!(r.backoff(1), Duration::from_millis(100));
        assert_eq!(r.backoff(2), Duration::from_millis(200));
        assert_eq!(r.backoff(3), Duration::from_millis(350));
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let c = ArticClient::new(ClientConfig {
            base_url: "http://localhost:9/api/v1/".into(),
            ..ClientConfig::default()
        });
        assert_eq!(c.endpoint(), "http://localhost:9/api/v1/artworks");
    }

    #[test]
    fn server_error_is_retried_until_success() {
        let (url, hits) = scripted_catalog(&[503, 200]);
        let page = client(url, RetryConfig::new(1, 1, 1)).fetch(1).unwrap();
        assert_eq!(page.ids().collect::<Vec<_>>(), vec![7]);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn client_error_is_not_retried() {
        // the spare 200 would be served if the 404 were retried
        let (url, hits) = scripted_catalog(&[404, 200]);
        let err = client(url, RetryConfig::new(3, 1, 1)).fetch(2).unwrap_err();
        assert!(matches!(err, FetchError::Status { page: 2, status: 404 }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retries_stop_after_budget() {
        let (url, hits) = scripted_catalog(&[503, 503, 200]);
        let err = client(url, RetryConfig::new(1, 1, 1)).fetch(1).unwrap_err();
        assert!(matches!(err, FetchError::Status { page: 1, status: 503 }));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}

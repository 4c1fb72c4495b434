//! HTTP fetching behind a trait seam.
//!
//! The pipeline never talks to `reqwest` directly: everything goes through
//! [`Fetcher`] so that extraction, discovery, and the adapters can be driven
//! by a scripted fake in tests.
//!
//! HTTP status codes are returned in-band rather than as errors. A vendor
//! 404 means "no job board" to an adapter but "dead URL" to the extractor;
//! only the caller knows which statuses are fatal for its flow.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::error::FetchError;

/// One fetched HTTP response.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// SHA-256 hex digest of the raw body, used for change detection.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.body.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Parse the body as JSON, `None` when it is not valid JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Trait seam over HTTP GET/HEAD.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET a URL, following redirects. `Err` only for transport-level
    /// failures; HTTP error statuses come back in the page.
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError>;

    /// HEAD a URL. Body is empty; status and final URL are meaningful.
    async fn head(&self, url: &str) -> Result<FetchedPage, FetchError>;

    /// GET with a bearer token, for the authenticated vendor APIs. The
    /// default ignores the token so fakes don't have to care about it.
    async fn get_authorized(&self, url: &str, _bearer: &str) -> Result<FetchedPage, FetchError> {
        self.get(url).await
    }
}

/// Production fetcher backed by `reqwest`.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with browser-like headers. Career pages and vendor
    /// APIs alike are happier with a mundane-looking request.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8"
                .parse()
                .expect("static header value"),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            "en-US,en;q=0.5".parse().expect("static header value"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                source: Box::new(e),
            })?;

        Ok(Self { client })
    }

    fn map_error(url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if e.is_builder() {
            FetchError::InvalidUrl(url.to_string())
        } else {
            FetchError::Transport {
                url: url.to_string(),
                source: Box::new(e),
            }
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new("jobscout/1.0 (job aggregator)", Duration::from_secs(20))
            .expect("default HTTP client")
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::map_error(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| Self::map_error(url, e))?;

        Ok(FetchedPage {
            url: final_url,
            status,
            body,
        })
    }

    async fn head(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| Self::map_error(url, e))?;

        Ok(FetchedPage {
            url: response.url().to_string(),
            status: response.status().as_u16(),
            body: String::new(),
        })
    }

    async fn get_authorized(&self, url: &str, bearer: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| Self::map_error(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| Self::map_error(url, e))?;

        Ok(FetchedPage {
            url: final_url,
            status,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_sha256_hex() {
        let page = FetchedPage {
            url: "https://example.com".to_string(),
            status: 200,
            body: "hello".to_string(),
        };
        let fp = page.fingerprint();
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        // Stable across identical bodies
        assert_eq!(fp, page.clone().fingerprint());
    }

    #[test]
    fn json_parses_or_none() {
        let page = FetchedPage {
            url: "u".into(),
            status: 200,
            body: r#"{"jobs": []}"#.into(),
        };
        assert!(page.json().is_some());

        let bad = FetchedPage {
            url: "u".into(),
            status: 200,
            body: "<html>".into(),
        };
        assert!(bad.json().is_none());
    }
}

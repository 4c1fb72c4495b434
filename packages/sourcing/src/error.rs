//! Typed errors for the sourcing pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Expected, routine
//! conditions (vendor 404s, unchanged pages, shell pages) are modeled as
//! result variants at their call sites, not as errors here.

use thiserror::Error;

/// Failures while fetching a URL.
///
/// HTTP responses are returned in-band by the [`crate::fetch::Fetcher`];
/// these variants cover transport failures plus the status-derived cases a
/// caller has decided are fatal for its flow.
#[derive(Debug, Error)]
pub enum FetchError {
    /// 404/410 on a resource that was expected to exist. The URL is likely
    /// dead and eligible for rediscovery.
    #[error("resource gone: {url} returned HTTP {status}")]
    Dead { url: String, status: u16 },

    /// Any other non-success HTTP status.
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    /// Request timed out.
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// Connection-level failure (DNS, TLS, reset, ...).
    #[error("transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The URL could not be parsed at all.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// True for 404/410 - the "URL likely dead" signal that may trigger
    /// rediscovery of auto-provenance URLs.
    pub fn is_dead(&self) -> bool {
        matches!(self, FetchError::Dead { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

/// Failures from the generative-text service.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// 429 after the single bounded retry was exhausted.
    #[error("text completion service rate limited")]
    RateLimited,

    /// Any other service failure (HTTP, transport, empty response).
    #[error("text completion service error: {0}")]
    Service(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A required credential is not configured; the dependent flow should be
    /// skipped for the run, not retried.
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}

/// Failures from the page-text extractor that the orchestrator must branch
/// on. Routine outcomes (unchanged, shell) are `PageOutcome` variants, not
/// errors.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

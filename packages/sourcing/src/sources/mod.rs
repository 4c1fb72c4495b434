//! Source adapters: one fetcher per structured vendor API.
//!
//! Five ATS board APIs are addressed per company by slug; three open job
//! feeds sweep the whole market in one call. Every adapter shares the same
//! boundary contract: fetch once, filter by role relevance, classify, and
//! return the canonical records. A vendor 4xx meaning "no board here" and
//! any malformed payload both collapse to an empty result - adapters never
//! raise past their boundary, so one bad source cannot abort a batch.

pub mod adzuna;
pub mod ashby;
pub mod greenhouse;
pub mod lever;
pub mod proxycurl;
pub mod remotive;
pub mod smartrecruiters;
pub mod teamtailor;

use serde_json::Value;

use crate::error::FetchError;
use crate::fetch::Fetcher;
use crate::types::CanonicalJob;

/// Result of one open-feed sweep, with the number of billable vendor calls
/// made so the caller can write the usage ledger.
#[derive(Debug, Default)]
pub struct FeedBatch {
    pub jobs: Vec<CanonicalJob>,
    pub api_calls: u32,
}

/// GET a vendor endpoint and parse JSON.
///
/// Returns `None` for "this company has no board" (400/403/404), for any
/// other HTTP failure, and for malformed payloads - logged at the
/// appropriate level, never propagated.
pub(crate) async fn vendor_json(fetcher: &dyn Fetcher, source: &str, url: &str) -> Option<Value> {
    let page = match fetcher.get(url).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(source, url, error = %e, "vendor fetch failed");
            return None;
        }
    };

    match page.status {
        400 | 403 | 404 => {
            tracing::debug!(source, url, status = page.status, "no board for company");
            return None;
        }
        s if !(200..300).contains(&s) => {
            tracing::warn!(source, url, status = s, "vendor returned error status");
            return None;
        }
        _ => {}
    }

    match page.json() {
        Some(v) => Some(v),
        None => {
            tracing::warn!(source, url, "vendor returned malformed JSON");
            None
        }
    }
}

/// Authorized variant of [`vendor_json`] for bearer-token APIs.
pub(crate) async fn vendor_json_authorized(
    fetcher: &dyn Fetcher,
    source: &str,
    url: &str,
    bearer: &str,
) -> Result<Option<Value>, FetchError> {
    let page = fetcher.get_authorized(url, bearer).await?;
    if !page.is_success() {
        tracing::warn!(source, url, status = page.status, "vendor returned error status");
        return Ok(None);
    }
    Ok(page.json())
}

/// Pull a string field out of a JSON object, trimmed, `None` when empty.
pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

//! Proxycurl job-search adapter (LinkedIn listings via a metered API).
//!
//! Every request is billable, so the caller passes the remaining call
//! allowance for the day and records `api_calls` from the returned batch
//! into the usage ledger. The job URL doubles as the stable source id -
//! Proxycurl exposes no other identifier.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::classify::{is_relevant_role, normalize_date};
use crate::fetch::Fetcher;
use crate::sources::{str_field, vendor_json_authorized, FeedBatch};
use crate::types::CanonicalJob;

pub const SOURCE: &str = "proxycurl";

const ENDPOINT: &str = "https://nubela.co/proxycurl/api/v2/linkedin/company/job";

/// Keyword × market matrix, one metered call each.
const SEARCH_QUERIES: &[(&str, &str)] = &[
    ("Product Manager", "101165590"),        // European Union
    ("Product Manager", "103644278"),        // United States
    ("Senior Product Manager", "101165590"),
    ("Senior Product Manager", "103644278"),
    ("Staff Product Manager", "103644278"),
    ("Group Product Manager", "103644278"),
];

pub struct ProxycurlCredentials {
    pub api_key: SecretString,
}

pub async fn fetch(
    fetcher: &dyn Fetcher,
    credentials: &ProxycurlCredentials,
    max_calls: u32,
) -> FeedBatch {
    let mut batch = FeedBatch::default();
    if max_calls == 0 {
        tracing::warn!("proxycurl daily cap exhausted, skipping sweep");
        return batch;
    }

    for &(keyword, geo_id) in SEARCH_QUERIES {
        if batch.api_calls >= max_calls {
            tracing::info!("proxycurl cap reached mid-sweep, stopping");
            break;
        }

        let url = format!(
            "{ENDPOINT}?keyword={}&geo_id={geo_id}&type=full-time\
             &experience=mid-senior%20level,director",
            keyword.replace(' ', "%20"),
        );
        batch.api_calls += 1;

        let data = match vendor_json_authorized(
            fetcher,
            SOURCE,
            &url,
            credentials.api_key.expose_secret(),
        )
        .await
        {
            Ok(Some(data)) => data,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(keyword, geo_id, error = %e, "proxycurl fetch failed");
                break;
            }
        };

        for posting in data["job"].as_array().into_iter().flatten() {
            let Some(title) = posting.get("job_title").and_then(Value::as_str) else {
                continue;
            };
            if !is_relevant_role(title) {
                continue;
            }

            let Some(apply_url) = str_field(posting, "linkedin_job_url_cleaned")
                .or_else(|| str_field(posting, "job_url"))
            else {
                continue;
            };
            let company = str_field(posting, "company").unwrap_or_else(|| "Unknown".to_string());
            let location = str_field(posting, "location");
            let posted = posting
                .get("listed_at")
                .map(normalize_date)
                .unwrap_or(None);

            batch.jobs.push(CanonicalJob::new(
                SOURCE,
                apply_url.clone(),
                title,
                company,
                location,
                apply_url,
                posted,
            ));
        }
    }

    tracing::info!(
        count = batch.jobs.len(),
        calls = batch.api_calls,
        "proxycurl feed swept"
    );
    batch
}

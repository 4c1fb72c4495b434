//! Adzuna search-feed adapter.
//!
//! Sweeps a fixed country × keyword matrix, up to three result pages each.
//! Credentials travel as query parameters; every page fetched is one
//! billable call and is reported back in the batch for the usage ledger.

use std::collections::HashSet;

use serde_json::Value;

use crate::classify::{is_relevant_role, normalize_date};
use crate::fetch::Fetcher;
use crate::sources::{str_field, FeedBatch};
use crate::types::CanonicalJob;

pub const SOURCE: &str = "adzuna";

const MAX_PAGES_PER_SEARCH: u32 = 3;
const RESULTS_PER_PAGE: u32 = 50;

/// Country markets to sweep, by Adzuna country code.
const COUNTRIES: &[&str] = &[
    "gb", "de", "nl", "fr", "it", "pl", "at", // Europe
    "us", "ca", // North America
    "au", "sg", "in", "nz", // APAC
    "br", "mx", // LATAM
    "za", // Africa
];

const KEYWORDS: &[&str] = &["product manager", "product management"];

#[derive(Debug, Clone)]
pub struct AdzunaCredentials {
    pub app_id: String,
    pub app_key: String,
}

pub async fn fetch(fetcher: &dyn Fetcher, credentials: &AdzunaCredentials) -> FeedBatch {
    let mut batch = FeedBatch::default();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for &country in COUNTRIES {
        for &keyword in KEYWORDS {
            for page in 1..=MAX_PAGES_PER_SEARCH {
                let url = format!(
                    "https://api.adzuna.com/v1/api/jobs/{country}/search/{page}\
                     ?app_id={}&app_key={}&what={}&what_exclude={}\
                     &results_per_page={RESULTS_PER_PAGE}&content-type=application/json",
                    credentials.app_id,
                    credentials.app_key,
                    urlencode(keyword),
                    urlencode("marketing analyst engineer designer"),
                );

                let page_result = match fetcher.get(&url).await {
                    Ok(p) if p.is_success() => p.json(),
                    Ok(p) => {
                        tracing::warn!(country, keyword, page, status = p.status, "adzuna error status");
                        batch.api_calls += 1;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(country, keyword, page, error = %e, "adzuna fetch failed");
                        break;
                    }
                };
                batch.api_calls += 1;

                let Some(data) = page_result else {
                    tracing::warn!(country, keyword, page, "adzuna returned malformed JSON");
                    break;
                };
                let results = data["results"].as_array().cloned().unwrap_or_default();
                if results.is_empty() {
                    break;
                }

                for posting in &results {
                    let Some(title) = posting.get("title").and_then(Value::as_str) else {
                        continue;
                    };
                    if !is_relevant_role(title) {
                        continue;
                    }
                    let source_id = match posting.get("id") {
                        Some(Value::Number(n)) => n.to_string(),
                        Some(Value::String(s)) if !s.is_empty() => s.clone(),
                        _ => continue,
                    };
                    // The same listing shows up under multiple keywords
                    if !seen_ids.insert(source_id.clone()) {
                        continue;
                    }

                    let company = posting["company"]["display_name"]
                        .as_str()
                        .unwrap_or("Unknown")
                        .to_string();
                    let location = posting["location"]["display_name"]
                        .as_str()
                        .map(str::to_string);
                    let apply_url = str_field(posting, "redirect_url").unwrap_or_default();
                    let posted = posting
                        .get("created")
                        .map(normalize_date)
                        .unwrap_or(None);

                    batch.jobs.push(CanonicalJob::new(
                        SOURCE, source_id, title, company, location, apply_url, posted,
                    ));
                }
            }
        }
    }

    tracing::info!(
        count = batch.jobs.len(),
        calls = batch.api_calls,
        "adzuna feed swept"
    );
    batch
}

/// Minimal query-parameter escaping for the fixed keyword strings above.
fn urlencode(s: &str) -> String {
    s.replace(' ', "%20")
}

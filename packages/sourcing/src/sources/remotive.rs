//! Remotive feed adapter - free public API, no credentials.
//!
//! `GET https://remotive.com/api/remote-jobs?category=product`. Every
//! listing is remote by definition, so the region is pinned rather than
//! inferred from the candidate-location blurb.

use serde_json::Value;

use crate::classify::{is_relevant_role, normalize_date, Region};
use crate::fetch::Fetcher;
use crate::sources::{str_field, vendor_json, FeedBatch};
use crate::types::CanonicalJob;

pub const SOURCE: &str = "remotive";

const API_URL: &str = "https://remotive.com/api/remote-jobs?category=product";

pub async fn fetch(fetcher: &dyn Fetcher) -> FeedBatch {
    let Some(data) = vendor_json(fetcher, SOURCE, API_URL).await else {
        return FeedBatch::default();
    };

    let mut batch = FeedBatch {
        jobs: Vec::new(),
        api_calls: 1,
    };
    for posting in data["jobs"].as_array().into_iter().flatten() {
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
        let Some(url) = str_field(posting, "url") else {
            continue;
        };

        let company = str_field(posting, "company_name").unwrap_or_default();
        let location =
            str_field(posting, "candidate_required_location").or(Some("Remote".to_string()));
        let posted = posting
            .get("publication_date")
            .map(normalize_date)
            .unwrap_or(None);

        let mut job = CanonicalJob::new(SOURCE, source_id, title, company, location, url, posted);
        job.region = Region::Remote;
        batch.jobs.push(job);
    }

    tracing::info!(count = batch.jobs.len(), "remotive feed swept");
    batch
}

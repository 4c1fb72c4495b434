//! Ashby job-board API adapter.
//!
//! `GET https://api.ashbyhq.com/posting-api/job-board/{slug}` returns
//! `{"jobs": [...]}`. Ashby answers 400 (not 404) for unknown boards.

use serde_json::Value;

use crate::classify::{is_relevant_role, normalize_date};
use crate::fetch::Fetcher;
use crate::sources::{str_field, vendor_json};
use crate::types::CanonicalJob;

pub const SOURCE: &str = "ashby";

pub async fn fetch(fetcher: &dyn Fetcher, slug: &str, company_name: &str) -> Vec<CanonicalJob> {
    let url =
        format!("https://api.ashbyhq.com/posting-api/job-board/{slug}?includeCompensation=false");
    let Some(data) = vendor_json(fetcher, SOURCE, &url).await else {
        return Vec::new();
    };

    let mut jobs = Vec::new();
    for posting in data["jobs"].as_array().into_iter().flatten() {
        let Some(title) = posting.get("title").and_then(Value::as_str) else {
            continue;
        };
        if !is_relevant_role(title) {
            continue;
        }

        let location = str_field(posting, "location").or_else(|| str_field(posting, "locationName"));
        let Some(source_id) = str_field(posting, "id") else {
            continue;
        };
        let apply_url = str_field(posting, "jobUrl").unwrap_or_default();
        let posted = posting
            .get("publishedAt")
            .or_else(|| posting.get("updatedAt"))
            .map(normalize_date)
            .unwrap_or(None);

        jobs.push(CanonicalJob::new(
            SOURCE,
            source_id,
            title,
            company_name,
            location,
            apply_url,
            posted,
        ));
    }
    jobs
}

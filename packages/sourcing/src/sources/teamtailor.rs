//! Teamtailor adapter - per-company `jobs.json` on the tenant subdomain.
//!
//! `GET https://{slug}.teamtailor.com/jobs.json` answers a bare list (older
//! tenants) or `{"jobs": [...]}`. Field names are kebab-case.

use serde_json::Value;

use crate::classify::{is_relevant_role, normalize_date};
use crate::fetch::Fetcher;
use crate::sources::{str_field, vendor_json};
use crate::types::CanonicalJob;

pub const SOURCE: &str = "teamtailor";

pub async fn fetch(fetcher: &dyn Fetcher, slug: &str, company_name: &str) -> Vec<CanonicalJob> {
    let url = format!("https://{slug}.teamtailor.com/jobs.json");
    let Some(data) = vendor_json(fetcher, SOURCE, &url).await else {
        return Vec::new();
    };

    let postings = match &data {
        Value::Array(items) => items.as_slice(),
        other => other["jobs"].as_array().map(Vec::as_slice).unwrap_or(&[]),
    };

    let mut jobs = Vec::new();
    for posting in postings {
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

        let location = str_field(posting, "human-location").or_else(|| str_field(posting, "location"));
        let apply_url = str_field(posting, "apply-url")
            .or_else(|| str_field(posting, "career-page-url"))
            .unwrap_or_else(|| format!("https://{slug}.teamtailor.com/jobs/{source_id}"));
        let posted = posting
            .get("created-at")
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

//! Lever postings API adapter.
//!
//! `GET https://api.lever.co/v0/postings/{slug}?mode=json&limit=500` returns
//! a bare array of postings (some tenants wrap it in `{"data": [...]}`).

use serde_json::Value;

use crate::classify::{is_relevant_role, normalize_date};
use crate::fetch::Fetcher;
use crate::sources::{str_field, vendor_json};
use crate::types::CanonicalJob;

pub const SOURCE: &str = "lever";

pub async fn fetch(fetcher: &dyn Fetcher, slug: &str, company_name: &str) -> Vec<CanonicalJob> {
    let url = format!("https://api.lever.co/v0/postings/{slug}?mode=json&limit=500");
    let Some(data) = vendor_json(fetcher, SOURCE, &url).await else {
        return Vec::new();
    };

    let postings = match &data {
        Value::Array(items) => items.as_slice(),
        other => other["data"].as_array().map(Vec::as_slice).unwrap_or(&[]),
    };

    let mut jobs = Vec::new();
    for posting in postings {
        let Some(title) = posting.get("text").and_then(Value::as_str) else {
            continue;
        };
        if !is_relevant_role(title) {
            continue;
        }

        // categories.location is a flat string; allLocations is its
        // multi-office sibling
        let categories = &posting["categories"];
        let location = str_field(categories, "location").or_else(|| {
            categories["allLocations"]
                .as_array()
                .and_then(|a| a.first())
                .and_then(Value::as_str)
                .map(str::to_string)
        });

        let Some(source_id) = str_field(posting, "id") else {
            continue;
        };
        let apply_url = str_field(posting, "hostedUrl").unwrap_or_default();
        // createdAt is epoch milliseconds
        let posted = posting
            .get("createdAt")
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Region;
    use crate::testing::MockFetcher;

    #[tokio::test]
    async fn maps_flat_location_and_epoch_millis() {
        let body = serde_json::json!([
            {
                "id": "a1b2c3",
                "text": "Product Manager, Payments",
                "categories": {"location": "Remote - Europe"},
                "hostedUrl": "https://jobs.lever.co/acme/a1b2c3",
                "createdAt": 1714552800000i64
            }
        ]);
        let fetcher = MockFetcher::new().with_json(
            "https://api.lever.co/v0/postings/acme?mode=json&limit=500",
            &body,
        );

        let jobs = fetch(&fetcher, "acme", "Acme").await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].region, Region::Remote);
        assert_eq!(
            jobs[0].posted_date,
            chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
        );
    }

    #[tokio::test]
    async fn falls_back_to_all_locations() {
        let body = serde_json::json!([
            {
                "id": "z9",
                "text": "Group Product Manager",
                "categories": {"allLocations": ["Amsterdam", "Berlin"]},
                "hostedUrl": "https://jobs.lever.co/acme/z9"
            }
        ]);
        let fetcher = MockFetcher::new().with_json(
            "https://api.lever.co/v0/postings/acme?mode=json&limit=500",
            &body,
        );

        let jobs = fetch(&fetcher, "acme", "Acme").await;
        assert_eq!(jobs[0].location.as_deref(), Some("Amsterdam"));
    }
}

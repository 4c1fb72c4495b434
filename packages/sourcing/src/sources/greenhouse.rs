//! Greenhouse board API adapter.
//!
//! `GET https://boards-api.greenhouse.io/v1/boards/{slug}/jobs?content=false`
//! returns `{"jobs": [...]}` with a nested location object per posting.

use serde_json::Value;

use crate::classify::{is_relevant_role, normalize_date};
use crate::fetch::Fetcher;
use crate::sources::vendor_json;
use crate::types::CanonicalJob;

pub const SOURCE: &str = "greenhouse";

pub async fn fetch(fetcher: &dyn Fetcher, slug: &str, company_name: &str) -> Vec<CanonicalJob> {
    let url = format!("https://boards-api.greenhouse.io/v1/boards/{slug}/jobs?content=false");
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

        // Location is a nested object: {"location": {"name": "Berlin"}}
        let location = posting["location"]["name"]
            .as_str()
            .map(str::to_string);
        let source_id = match posting.get("id") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            _ => continue,
        };
        let apply_url = posting
            .get("absolute_url")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let posted = posting
            .get("updated_at")
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
    use crate::testing::MockFetcher;

    #[tokio::test]
    async fn maps_nested_location_and_numeric_id() {
        let body = serde_json::json!({
            "jobs": [
                {
                    "id": 4012345,
                    "title": "Staff Product Manager",
                    "location": {"name": "Berlin, Germany"},
                    "absolute_url": "https://boards.greenhouse.io/acme/jobs/4012345",
                    "updated_at": "2024-05-01T09:00:00Z"
                },
                {
                    "id": 4012346,
                    "title": "Software Engineer, Platform",
                    "location": {"name": "Berlin, Germany"},
                    "absolute_url": "https://boards.greenhouse.io/acme/jobs/4012346"
                }
            ]
        });
        let fetcher = MockFetcher::new().with_json(
            "https://boards-api.greenhouse.io/v1/boards/acme/jobs?content=false",
            &body,
        );

        let jobs = fetch(&fetcher, "acme", "Acme").await;
        assert_eq!(jobs.len(), 1, "engineer role must be filtered out");
        assert_eq!(jobs[0].source_id, "4012345");
        assert_eq!(jobs[0].location.as_deref(), Some("Berlin, Germany"));
        assert_eq!(
            jobs[0].posted_date,
            chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
        );
    }

    #[tokio::test]
    async fn vendor_404_is_empty_not_error() {
        let fetcher = MockFetcher::new(); // unknown URLs respond 404
        let jobs = fetch(&fetcher, "ghost", "Ghost Inc").await;
        assert!(jobs.is_empty());
    }
}

//! SmartRecruiters public postings API adapter.
//!
//! `GET https://api.smartrecruiters.com/v1/companies/{slug}/postings` returns
//! `{"content": [...]}`. Location arrives as an object with a `remote` flag
//! plus city/country parts that need assembling into one string.

use serde_json::Value;

use crate::classify::{is_relevant_role, normalize_date};
use crate::fetch::Fetcher;
use crate::sources::{str_field, vendor_json};
use crate::types::CanonicalJob;

pub const SOURCE: &str = "smartrecruiters";

pub async fn fetch(fetcher: &dyn Fetcher, slug: &str, company_name: &str) -> Vec<CanonicalJob> {
    let url = format!("https://api.smartrecruiters.com/v1/companies/{slug}/postings?limit=100");
    let Some(data) = vendor_json(fetcher, SOURCE, &url).await else {
        return Vec::new();
    };

    let mut jobs = Vec::new();
    for posting in data["content"].as_array().into_iter().flatten() {
        let Some(title) = posting.get("name").and_then(Value::as_str) else {
            continue;
        };
        if !is_relevant_role(title) {
            continue;
        }
        let Some(source_id) = str_field(posting, "id") else {
            continue;
        };

        let loc = &posting["location"];
        let location = if loc["remote"].as_bool() == Some(true) {
            Some("Remote".to_string())
        } else {
            let parts: Vec<&str> = ["city", "country"]
                .iter()
                .filter_map(|k| loc.get(*k).and_then(Value::as_str))
                .filter(|s| !s.is_empty())
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        };

        // Apply URL follows a standard pattern when no explicit ref is given
        let apply_url = str_field(posting, "ref")
            .unwrap_or_else(|| format!("https://jobs.smartrecruiters.com/{slug}/{source_id}"));
        let posted = posting
            .get("releasedDate")
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
    async fn remote_flag_and_assembled_location() {
        let body = serde_json::json!({
            "content": [
                {
                    "id": "744000001",
                    "name": "Principal Product Manager",
                    "location": {"remote": true},
                    "releasedDate": "2024-06-10T00:00:00Z"
                },
                {
                    "id": "744000002",
                    "name": "Product Manager",
                    "location": {"city": "Lisbon", "country": "Portugal"}
                }
            ]
        });
        let fetcher = MockFetcher::new().with_json(
            "https://api.smartrecruiters.com/v1/companies/acme/postings?limit=100",
            &body,
        );

        let jobs = fetch(&fetcher, "acme", "Acme").await;
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].location.as_deref(), Some("Remote"));
        assert_eq!(jobs[1].location.as_deref(), Some("Lisbon, Portugal"));
        assert_eq!(
            jobs[1].url,
            "https://jobs.smartrecruiters.com/acme/744000002"
        );
    }
}

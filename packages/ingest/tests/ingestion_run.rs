//! Full-run tests against the in-memory store with scripted network fakes.
//!
//! The scripted completion panics when called unexpectedly, so tests that
//! register no responses double as "the classifier was never invoked"
//! assertions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use ingest::{
    Company, IngestRunner, IngestStore, MemoryStore, RunnerConfig, ScrapeStatus, UrlProvenance,
};
use sourcing::testing::{MockCompletion, MockFetcher};
use sourcing::FetchedPage;

/// A career page convincing enough to pass discovery validation and shell
/// detection.
fn careers_page() -> String {
    let filler = "We are always hiring thoughtful people across every role. ".repeat(20);
    format!(
        "<html><body><h1>Careers at Acme</h1><p>{filler}</p>\
         <a href=\"/jobs/pm-1\">Senior Product Manager</a>\
         <a href=\"/jobs/mkt-1\">Product Marketing Manager</a></body></html>"
    )
}

fn fingerprint_of(body: &str) -> String {
    FetchedPage {
        url: String::new(),
        status: 200,
        body: body.to_string(),
    }
    .fingerprint()
}

fn runner(
    store: Arc<MemoryStore>,
    fetcher: MockFetcher,
    completion: MockCompletion,
) -> IngestRunner {
    runner_with_config(store, fetcher, completion, RunnerConfig::default())
}

fn runner_with_config(
    store: Arc<MemoryStore>,
    fetcher: MockFetcher,
    completion: MockCompletion,
    mut config: RunnerConfig,
) -> IngestRunner {
    config.per_company_delay = Duration::ZERO;
    IngestRunner::new(store, Arc::new(fetcher), Some(Arc::new(completion)), config)
}

#[tokio::test]
async fn end_to_end_discovery_extraction_and_reconciliation() {
    let store = Arc::new(MemoryStore::new());
    let mut company = Company::seed("Acme");
    company.tier = 2;
    let company_id = company.id;
    store.seed_company(company);

    let fetcher = MockFetcher::new()
        .with_status("https://acme.com", 200)
        .with_page("https://acme.com/careers", &careers_page());

    let completion = MockCompletion::new()
        // Phase 1: homepage inference
        .push_response(r#"{"results": [{"name": "Acme", "url": "https://acme.com"}]}"#)
        // Phase 3: page extraction
        .push_response(
            r#"{"jobs": [
                {"title": "Senior Product Manager", "location": "Remote, Germany", "url": "/jobs/pm-1", "posted_date": "2024-05-01"},
                {"title": "Product Marketing Manager", "location": "Berlin", "url": "/jobs/mkt-1", "posted_date": null}
            ], "next_page_url": null}"#,
        );

    let summary = runner(store.clone(), fetcher, completion)
        .run()
        .await
        .unwrap();

    let company = store.company(company_id).unwrap();
    assert_eq!(company.homepage_url.as_deref(), Some("https://acme.com"));
    assert_eq!(
        company.career_url.as_deref(),
        Some("https://acme.com/careers")
    );
    assert_eq!(company.career_url_provenance, UrlProvenance::Auto);
    assert_eq!(company.scrape_status, ScrapeStatus::Ok);
    assert!(company.last_scraped.is_some());
    assert!(company.page_fingerprint.is_some());

    let jobs = store.jobs();
    assert_eq!(jobs.len(), 1, "the marketing role must not be stored");
    assert_eq!(jobs[0].title, "Senior Product Manager");
    assert_eq!(jobs[0].company_id, Some(company_id));
    assert_eq!(jobs[0].url, "https://acme.com/jobs/pm-1");
    assert_eq!(jobs[0].geo_region, "REMOTE");

    assert_eq!(summary.jobs_upserted, 1);
    assert_eq!(summary.homepages_discovered, 1);
    assert_eq!(summary.career_urls_discovered, 1);
    assert_eq!(summary.status_counts.get("ok"), Some(&1));
}

#[tokio::test]
async fn manual_provenance_url_survives_http_410() {
    let store = Arc::new(MemoryStore::new());
    let mut company = Company::seed("Legacy Corp");
    company.homepage_url = Some("https://legacy.example".to_string());
    company.career_url = Some("https://legacy.example/careers".to_string());
    company.career_url_provenance = UrlProvenance::Manual;
    let company_id = company.id;
    store.seed_company(company);

    let fetcher = MockFetcher::new().with_status("https://legacy.example/careers", 410);

    runner(store.clone(), fetcher, MockCompletion::new())
        .run()
        .await
        .unwrap();

    let company = store.company(company_id).unwrap();
    assert_eq!(
        company.career_url.as_deref(),
        Some("https://legacy.example/careers"),
        "manual URLs are never auto-cleared"
    );
    assert_eq!(company.scrape_status, ScrapeStatus::HttpError);
    assert_eq!(company.last_discovery_attempt, None);
}

#[tokio::test]
async fn dead_auto_url_is_cleared_once_cooldown_elapsed() {
    let store = Arc::new(MemoryStore::new());
    let mut company = Company::seed("Drifting Inc");
    company.homepage_url = Some("https://drifting.example".to_string());
    company.career_url = Some("https://drifting.example/careers".to_string());
    company.career_url_provenance = UrlProvenance::Auto;
    let company_id = company.id;
    store.seed_company(company);

    let fetcher = MockFetcher::new().with_status("https://drifting.example/careers", 404);

    runner(store.clone(), fetcher, MockCompletion::new())
        .run()
        .await
        .unwrap();

    let company = store.company(company_id).unwrap();
    assert_eq!(company.career_url, None, "auto URL resets for rediscovery");
    assert!(company.last_discovery_attempt.is_some());
    assert_eq!(company.scrape_status, ScrapeStatus::HttpError);
}

#[tokio::test]
async fn dead_auto_url_within_cooldown_is_kept() {
    let store = Arc::new(MemoryStore::new());
    let mut company = Company::seed("Recent Attempt");
    company.homepage_url = Some("https://recent.example".to_string());
    company.career_url = Some("https://recent.example/careers".to_string());
    company.career_url_provenance = UrlProvenance::Auto;
    company.last_discovery_attempt = Some(Utc::now() - chrono::Duration::days(5));
    let company_id = company.id;
    store.seed_company(company);

    let fetcher = MockFetcher::new().with_status("https://recent.example/careers", 404);

    runner(store.clone(), fetcher, MockCompletion::new())
        .run()
        .await
        .unwrap();

    let company = store.company(company_id).unwrap();
    assert!(
        company.career_url.is_some(),
        "cooldown has not elapsed, URL must stay for now"
    );
}

#[tokio::test]
async fn unchanged_fingerprint_skips_classifier_and_keeps_status() {
    let store = Arc::new(MemoryStore::new());
    let body = careers_page();

    let mut company = Company::seed("Steady Co");
    company.homepage_url = Some("https://steady.example".to_string());
    company.career_url = Some("https://steady.example/careers".to_string());
    company.page_fingerprint = Some(fingerprint_of(&body));
    company.scrape_status = ScrapeStatus::Empty;
    let company_id = company.id;
    store.seed_company(company);

    let fetcher = MockFetcher::new().with_page("https://steady.example/careers", &body);

    // No scripted completion responses: any classifier call would panic
    let summary = runner(store.clone(), fetcher, MockCompletion::new())
        .run()
        .await
        .unwrap();

    let company = store.company(company_id).unwrap();
    assert_eq!(
        company.scrape_status,
        ScrapeStatus::Empty,
        "unchanged outcomes leave the prior status untouched"
    );
    assert!(company.last_scraped.is_some(), "still leaves the due window");
    assert_eq!(summary.status_counts.get("unchanged"), Some(&1));
}

#[tokio::test]
async fn empty_page_is_tracking_only_never_rediscovery() {
    let store = Arc::new(MemoryStore::new());
    let mut company = Company::seed("Quiet Co");
    company.homepage_url = Some("https://quiet.example".to_string());
    company.career_url = Some("https://quiet.example/careers".to_string());
    let company_id = company.id;
    store.seed_company(company);

    let fetcher = MockFetcher::new().with_page("https://quiet.example/careers", &careers_page());
    let completion =
        MockCompletion::new().push_response(r#"{"jobs": [], "next_page_url": null}"#);

    runner(store.clone(), fetcher, completion).run().await.unwrap();

    let company = store.company(company_id).unwrap();
    assert_eq!(company.scrape_status, ScrapeStatus::Empty);
    assert!(
        company.career_url.is_some(),
        "repeated emptiness must not imply a dead URL"
    );
    assert!(company.last_discovery_attempt.is_none());
}

#[tokio::test]
async fn shell_page_falls_back_to_ats_api() {
    let store = Arc::new(MemoryStore::new());
    let mut company = Company::seed("Spa Co");
    company.homepage_url = Some("https://spa.example".to_string());
    company.career_url = Some("https://boards.greenhouse.io/spaco".to_string());
    let company_id = company.id;
    store.seed_company(company);

    let board = serde_json::json!({
        "jobs": [{
            "id": 77,
            "title": "Product Manager",
            "location": {"name": "Remote"},
            "absolute_url": "https://boards.greenhouse.io/spaco/jobs/77"
        }]
    });
    let fetcher = MockFetcher::new()
        .with_page(
            "https://boards.greenhouse.io/spaco",
            r#"<html><body><div id="app">Loading...</div></body></html>"#,
        )
        .with_json(
            "https://boards-api.greenhouse.io/v1/boards/spaco/jobs?content=false",
            &board,
        );

    let summary = runner(store.clone(), fetcher, MockCompletion::new())
        .run()
        .await
        .unwrap();

    let company = store.company(company_id).unwrap();
    assert_eq!(company.scrape_status, ScrapeStatus::Ok);

    let jobs = store.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].source, "greenhouse");
    assert_eq!(summary.jobs_upserted, 1);
}

#[tokio::test]
async fn shell_page_with_no_known_ats_keeps_shell_status() {
    let store = Arc::new(MemoryStore::new());
    let mut company = Company::seed("Opaque Co");
    company.homepage_url = Some("https://opaque.example".to_string());
    company.career_url = Some("https://opaque.example/careers".to_string());
    let company_id = company.id;
    store.seed_company(company);

    let fetcher = MockFetcher::new().with_page(
        "https://opaque.example/careers",
        r#"<html><body>Please wait</body></html>"#,
    );

    runner(store.clone(), fetcher, MockCompletion::new())
        .run()
        .await
        .unwrap();

    let company = store.company(company_id).unwrap();
    assert_eq!(company.scrape_status, ScrapeStatus::ShellDetected);
    assert!(store.jobs().is_empty());
}

#[tokio::test]
async fn maintenance_retires_jobs_outside_freshness_window() {
    let store = Arc::new(MemoryStore::new());

    // One stale job already in the store, seen long before the window
    let old = sourcing::CanonicalJob::new(
        "greenhouse",
        "old-1",
        "Product Manager",
        "Gone Co",
        None,
        "https://boards.greenhouse.io/gone/jobs/old-1",
        None,
    );
    store.upsert_jobs(None, &[old]).await.unwrap();
    store.set_job_last_seen("greenhouse", "old-1", Utc::now() - chrono::Duration::days(30));

    let summary = runner(store.clone(), MockFetcher::new(), MockCompletion::new())
        .run()
        .await
        .unwrap();

    let jobs = store.jobs();
    assert_eq!(jobs.len(), 1, "history is preserved, rows never deleted");
    assert!(!jobs[0].active);
    assert_eq!(summary.jobs_marked_inactive, 1);
}

#[tokio::test]
async fn proxycurl_cap_blocks_sweep_when_ledger_is_full() {
    use secrecy::SecretString;
    use sourcing::sources::proxycurl::ProxycurlCredentials;

    let store = Arc::new(MemoryStore::new());
    store.record_api_calls("proxycurl", 100).await.unwrap();

    let config = RunnerConfig {
        proxycurl: Some(ProxycurlCredentials {
            api_key: SecretString::from("test-key".to_string()),
        }),
        proxycurl_daily_cap: 100,
        ..RunnerConfig::default()
    };
    // No proxycurl URLs registered: any request would show in the log
    let fetcher = MockFetcher::new();
    let probe = fetcher.clone();

    runner_with_config(store.clone(), fetcher, MockCompletion::new(), config)
        .run()
        .await
        .unwrap();

    assert!(
        !probe.fetched().iter().any(|u| u.contains("proxycurl")),
        "an exhausted cap must prevent any metered call"
    );
    assert_eq!(store.usage_total("proxycurl"), 100, "ledger unchanged");
}

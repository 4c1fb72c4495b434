//! In-memory store for tests.
//!
//! Mirrors the Postgres semantics exactly where the orchestrator depends on
//! them: upsert identity, `first_seen` immutability, interval-based due
//! selection, and the ledger's per-day rollup.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use sourcing::CanonicalJob;

use crate::models::{Company, ScrapeStatus, StoredJob, UrlProvenance};
use crate::store::{IngestStore, StoreResult};

#[derive(Default)]
struct Inner {
    companies: HashMap<Uuid, Company>,
    jobs: HashMap<(String, String), StoredJob>,
    usage: HashMap<(String, chrono::NaiveDate), i64>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_company(&self, company: Company) {
        self.inner
            .lock()
            .expect("store lock")
            .companies
            .insert(company.id, company);
    }

    pub fn company(&self, id: Uuid) -> Option<Company> {
        self.inner.lock().expect("store lock").companies.get(&id).cloned()
    }

    pub fn jobs(&self) -> Vec<StoredJob> {
        let mut jobs: Vec<StoredJob> = self
            .inner
            .lock()
            .expect("store lock")
            .jobs
            .values()
            .cloned()
            .collect();
        jobs.sort_by(|a, b| (&a.source, &a.source_id).cmp(&(&b.source, &b.source_id)));
        jobs
    }

    /// Test helper: age a job so the maintenance window catches it.
    pub fn set_job_last_seen(
        &self,
        source: &str,
        source_id: &str,
        last_seen: chrono::DateTime<Utc>,
    ) {
        if let Some(job) = self
            .inner
            .lock()
            .expect("store lock")
            .jobs
            .get_mut(&(source.to_string(), source_id.to_string()))
        {
            job.last_seen = last_seen;
        }
    }

    pub fn usage_total(&self, source: &str) -> i64 {
        self.inner
            .lock()
            .expect("store lock")
            .usage
            .iter()
            .filter(|((s, _), _)| s == source)
            .map(|(_, count)| count)
            .sum()
    }
}

#[async_trait]
impl IngestStore for MemoryStore {
    async fn enabled_companies(&self) -> StoreResult<Vec<Company>> {
        let inner = self.inner.lock().expect("store lock");
        let mut companies: Vec<Company> = inner
            .companies
            .values()
            .filter(|c| c.enabled)
            .cloned()
            .collect();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(companies)
    }

    async fn companies_due(&self, limit: i64) -> StoreResult<Vec<Company>> {
        let now = Utc::now();
        let inner = self.inner.lock().expect("store lock");
        let mut due: Vec<Company> = inner
            .companies
            .values()
            .filter(|c| {
                c.enabled
                    && c.career_url.is_some()
                    && c.last_scraped.map_or(true, |t| {
                        t < now - Duration::days(c.scrape_interval_days as i64)
                    })
            })
            .cloned()
            .collect();
        // Oldest first, never-scraped before everything
        due.sort_by_key(|c| c.last_scraped);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn set_homepage_url(&self, company_id: Uuid, url: &str) -> StoreResult<()> {
        if let Some(c) = self
            .inner
            .lock()
            .expect("store lock")
            .companies
            .get_mut(&company_id)
        {
            c.homepage_url = Some(url.to_string());
        }
        Ok(())
    }

    async fn set_discovered_career_url(&self, company_id: Uuid, url: &str) -> StoreResult<()> {
        if let Some(c) = self
            .inner
            .lock()
            .expect("store lock")
            .companies
            .get_mut(&company_id)
        {
            c.career_url = Some(url.to_string());
            c.career_url_provenance = UrlProvenance::Auto;
            c.last_discovery_attempt = Some(Utc::now());
        }
        Ok(())
    }

    async fn reset_career_url(&self, company_id: Uuid) -> StoreResult<()> {
        if let Some(c) = self
            .inner
            .lock()
            .expect("store lock")
            .companies
            .get_mut(&company_id)
        {
            c.career_url = None;
            c.page_fingerprint = None;
            c.last_discovery_attempt = Some(Utc::now());
        }
        Ok(())
    }

    async fn record_scrape(
        &self,
        company_id: Uuid,
        status: Option<ScrapeStatus>,
        fingerprint: Option<&str>,
    ) -> StoreResult<()> {
        if let Some(c) = self
            .inner
            .lock()
            .expect("store lock")
            .companies
            .get_mut(&company_id)
        {
            c.last_scraped = Some(Utc::now());
            if let Some(status) = status {
                c.scrape_status = status;
                if let Some(fp) = fingerprint {
                    c.page_fingerprint = Some(fp.to_string());
                }
            }
        }
        Ok(())
    }

    async fn upsert_jobs(
        &self,
        company_id: Option<Uuid>,
        jobs: &[CanonicalJob],
    ) -> StoreResult<u64> {
        let now = Utc::now();
        let mut inner = self.inner.lock().expect("store lock");
        let mut count = 0u64;
        for job in jobs {
            if job.url.is_empty() {
                continue;
            }
            let key = (job.source.clone(), job.source_id.clone());
            let search_index = format!("{} {}", job.title, job.company_name);
            inner
                .jobs
                .entry(key)
                .and_modify(|existing| {
                    existing.last_seen = now;
                    existing.active = true;
                    existing.search_index = Some(search_index.clone());
                })
                .or_insert_with(|| StoredJob {
                    id: Uuid::new_v4(),
                    company_id,
                    company_name: job.company_name.clone(),
                    source: job.source.clone(),
                    source_id: job.source_id.clone(),
                    title: job.title.clone(),
                    location_raw: job.location.clone(),
                    geo_region: job.region.as_str().to_string(),
                    seniority: job.seniority.as_str().to_string(),
                    url: job.url.clone(),
                    posted_date: job.posted_date,
                    first_seen: now,
                    last_seen: now,
                    active: true,
                    search_index: Some(search_index),
                });
            count += 1;
        }
        Ok(count)
    }

    async fn mark_stale_inactive(&self, not_seen_for_days: i32) -> StoreResult<u64> {
        let cutoff = Utc::now() - Duration::days(not_seen_for_days as i64);
        let mut inner = self.inner.lock().expect("store lock");
        let mut affected = 0u64;
        for job in inner.jobs.values_mut() {
            if job.active && job.last_seen < cutoff {
                job.active = false;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn backfill_search_index(&self) -> StoreResult<u64> {
        let mut inner = self.inner.lock().expect("store lock");
        let mut affected = 0u64;
        for job in inner.jobs.values_mut() {
            if job.search_index.is_none() {
                job.search_index = Some(format!("{} {}", job.title, job.company_name));
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn api_calls_today(&self, source: &str) -> StoreResult<i64> {
        let today = Utc::now().date_naive();
        Ok(self
            .inner
            .lock()
            .expect("store lock")
            .usage
            .get(&(source.to_string(), today))
            .copied()
            .unwrap_or(0))
    }

    async fn record_api_calls(&self, source: &str, count: i64) -> StoreResult<()> {
        let today = Utc::now().date_naive();
        *self
            .inner
            .lock()
            .expect("store lock")
            .usage
            .entry((source.to_string(), today))
            .or_insert(0) += count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(source_id: &str, title: &str) -> CanonicalJob {
        CanonicalJob::new(
            "greenhouse",
            source_id,
            title,
            "Acme",
            Some("Berlin".to_string()),
            format!("https://boards.greenhouse.io/acme/jobs/{source_id}"),
            None,
        )
    }

    #[tokio::test]
    async fn upsert_is_idempotent_and_preserves_first_seen() {
        let store = MemoryStore::new();
        let jobs = vec![job("1", "Product Manager")];

        store.upsert_jobs(None, &jobs).await.unwrap();
        let first = store.jobs().remove(0);

        store.mark_stale_inactive(0).await.unwrap();
        store.upsert_jobs(None, &jobs).await.unwrap();

        let rows = store.jobs();
        assert_eq!(rows.len(), 1, "re-upsert must not create a second row");
        assert_eq!(rows[0].first_seen, first.first_seen);
        assert!(rows[0].last_seen >= first.last_seen);
        assert!(rows[0].active, "re-observation reactivates the job");
    }

    #[tokio::test]
    async fn jobs_without_url_are_skipped() {
        let store = MemoryStore::new();
        let mut no_url = job("2", "Product Manager");
        no_url.url = String::new();

        let written = store.upsert_jobs(None, &[no_url]).await.unwrap();
        assert_eq!(written, 0);
        assert!(store.jobs().is_empty());
    }

    #[tokio::test]
    async fn due_selection_honors_interval_and_order() {
        let store = MemoryStore::new();

        let mut never = Company::seed("Never Scraped");
        never.career_url = Some("https://a.example/careers".into());
        let never_id = never.id;

        let mut stale = Company::seed("Stale");
        stale.career_url = Some("https://b.example/careers".into());
        stale.last_scraped = Some(Utc::now() - Duration::days(10));
        let stale_id = stale.id;

        let mut fresh = Company::seed("Fresh");
        fresh.career_url = Some("https://c.example/careers".into());
        fresh.last_scraped = Some(Utc::now() - Duration::days(1));

        let mut no_url = Company::seed("No Url");
        no_url.last_scraped = Some(Utc::now() - Duration::days(30));

        for c in [never, stale, fresh, no_url] {
            store.seed_company(c);
        }

        let due = store.companies_due(10).await.unwrap();
        let ids: Vec<Uuid> = due.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![never_id, stale_id]);
    }

    #[tokio::test]
    async fn ledger_rolls_up_per_day() {
        let store = MemoryStore::new();
        store.record_api_calls("adzuna", 3).await.unwrap();
        store.record_api_calls("adzuna", 2).await.unwrap();
        assert_eq!(store.api_calls_today("adzuna").await.unwrap(), 5);
        assert_eq!(store.api_calls_today("proxycurl").await.unwrap(), 0);
    }
}

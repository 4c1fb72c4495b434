//! The phased ingestion run.
//!
//! One invocation walks the whole company set: homepage discovery, career
//! URL discovery, rolling extraction, the open-feed sweep, then
//! maintenance. Phases are isolated from each other, and within rolling
//! extraction every company task is isolated too - an error is logged and
//! counted, never allowed to cancel siblings. Only a failure to load the
//! worklist itself aborts the run.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Semaphore;

use sourcing::sources::adzuna::AdzunaCredentials;
use sourcing::sources::proxycurl::ProxycurlCredentials;
use sourcing::sources::{adzuna, proxycurl, remotive};
use sourcing::{
    try_ats_fallback, AtsHint, CanonicalJob, CareerDiscovery, CareerProspect, ExtractError,
    Fetcher, HomepageDiscovery, PageOutcome, PageTextExtractor, TextCompletion,
};

use crate::models::{Company, ScrapeStatus, UrlProvenance};
use crate::store::{IngestStore, StoreError};

pub struct RunnerConfig {
    /// Concurrent per-company extraction pipelines.
    pub extract_concurrency: usize,
    /// Fixed delay after each company's extraction, regardless of outcome.
    pub per_company_delay: Duration,
    /// Companies extracted per run, oldest first.
    pub rolling_window: i64,
    /// Companies per career-URL discovery run.
    pub discovery_batch: usize,
    /// Companies per homepage discovery run.
    pub homepage_batch: usize,
    /// Jobs not re-observed for this many days go inactive.
    pub stale_after_days: i32,
    /// Minimum days between clearing the same auto URL for rediscovery.
    pub rediscovery_cooldown_days: i64,
    pub adzuna: Option<AdzunaCredentials>,
    pub proxycurl: Option<ProxycurlCredentials>,
    pub proxycurl_daily_cap: i64,
    /// Curated platform/slug knowledge, keyed by lowercased company name.
    pub hints: HashMap<String, AtsHint>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            extract_concurrency: 5,
            per_company_delay: Duration::from_secs(2),
            rolling_window: 200,
            discovery_batch: 250,
            homepage_batch: 500,
            stale_after_days: 7,
            rediscovery_cooldown_days: 30,
            adzuna: None,
            proxycurl: None,
            proxycurl_daily_cap: 100,
            hints: HashMap::new(),
        }
    }
}

/// What one run accomplished.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub jobs_upserted: u64,
    pub companies_scraped: usize,
    pub homepages_discovered: usize,
    pub career_urls_discovered: usize,
    /// Company counts per resulting scrape status (plus "unchanged").
    pub status_counts: BTreeMap<String, u64>,
    pub errors: u64,
    pub jobs_marked_inactive: u64,
    pub elapsed: Duration,
}

pub struct IngestRunner {
    store: Arc<dyn IngestStore>,
    fetcher: Arc<dyn Fetcher>,
    completion: Option<Arc<dyn TextCompletion>>,
    config: RunnerConfig,
}

impl IngestRunner {
    pub fn new(
        store: Arc<dyn IngestStore>,
        fetcher: Arc<dyn Fetcher>,
        completion: Option<Arc<dyn TextCompletion>>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            completion,
            config,
        }
    }

    /// Run all phases once. Idempotent and safe to invoke repeatedly.
    pub async fn run(&self) -> Result<RunSummary, StoreError> {
        let started = Instant::now();
        let mut summary = RunSummary::default();

        tracing::info!("ingestion run starting");
        self.discover_homepages(&mut summary).await?;
        self.discover_career_urls(&mut summary).await?;
        self.rolling_extraction(&mut summary).await?;
        self.sweep_feeds(&mut summary).await;
        self.maintenance(&mut summary).await;

        summary.elapsed = started.elapsed();
        tracing::info!(
            jobs = summary.jobs_upserted,
            companies = summary.companies_scraped,
            errors = summary.errors,
            elapsed_secs = summary.elapsed.as_secs(),
            "ingestion run complete"
        );
        Ok(summary)
    }

    /// Phase 1: infer and validate homepages for companies lacking one.
    async fn discover_homepages(&self, summary: &mut RunSummary) -> Result<(), StoreError> {
        let Some(completion) = &self.completion else {
            tracing::warn!("no completion credentials, skipping homepage discovery");
            return Ok(());
        };

        let companies = self.store.enabled_companies().await?;
        let missing: Vec<&Company> = companies
            .iter()
            .filter(|c| c.homepage_url.is_none())
            .take(self.config.homepage_batch)
            .collect();
        if missing.is_empty() {
            tracing::info!("all enabled companies have homepage URLs");
            return Ok(());
        }
        tracing::info!(count = missing.len(), "discovering homepages");

        let names: Vec<String> = missing.iter().map(|c| c.name.clone()).collect();
        let discovery = HomepageDiscovery::new(self.fetcher.clone(), completion.clone());
        let found = discovery.discover(&names).await;

        for company in &missing {
            if let Some(url) = found.get(&company.name) {
                if let Err(e) = self.store.set_homepage_url(company.id, url).await {
                    tracing::error!(company = %company.name, error = %e, "failed to store homepage");
                    summary.errors += 1;
                } else {
                    summary.homepages_discovered += 1;
                }
            }
        }
        Ok(())
    }

    /// Phase 2: probe candidate career URLs for companies still lacking one.
    async fn discover_career_urls(&self, summary: &mut RunSummary) -> Result<(), StoreError> {
        let companies = self.store.enabled_companies().await?;
        let missing: Vec<&Company> = companies
            .iter()
            .filter(|c| c.career_url.is_none())
            .take(self.config.discovery_batch)
            .collect();
        if missing.is_empty() {
            tracing::info!("all enabled companies have career URLs");
            return Ok(());
        }
        tracing::info!(count = missing.len(), "discovering career URLs");

        let prospects: Vec<CareerProspect> = missing
            .iter()
            .map(|c| CareerProspect {
                name: c.name.clone(),
                homepage_url: c.homepage_url.clone(),
                hint: self
                    .config
                    .hints
                    .get(&c.name.to_lowercase())
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();

        let discovery = CareerDiscovery::new(self.fetcher.clone());
        let found = discovery.discover_all(&prospects).await;

        for company in &missing {
            if let Some(url) = found.get(&company.name) {
                if let Err(e) = self.store.set_discovered_career_url(company.id, url).await {
                    tracing::error!(company = %company.name, error = %e, "failed to store career URL");
                    summary.errors += 1;
                } else {
                    summary.career_urls_discovered += 1;
                }
            }
        }
        Ok(())
    }

    /// Phase 3: extract due companies under the concurrency gate.
    async fn rolling_extraction(&self, summary: &mut RunSummary) -> Result<(), StoreError> {
        let Some(completion) = &self.completion else {
            tracing::warn!("no completion credentials, skipping rolling extraction");
            return Ok(());
        };

        let due = self.store.companies_due(self.config.rolling_window).await?;
        if due.is_empty() {
            tracing::info!("no companies due for extraction");
            return Ok(());
        }
        tracing::info!(count = due.len(), "rolling extraction starting");

        let gate = Arc::new(Semaphore::new(self.config.extract_concurrency));
        let mut handles = Vec::with_capacity(due.len());
        for company in due {
            let worker = ScrapeWorker {
                store: self.store.clone(),
                fetcher: self.fetcher.clone(),
                completion: completion.clone(),
                cooldown_days: self.config.rediscovery_cooldown_days,
                delay: self.config.per_company_delay,
            };
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                let _permit = gate.acquire_owned().await.expect("semaphore never closed");
                worker.scrape(company).await
            }));
        }

        for handle in handles {
            match handle.await {
                Ok(outcome) => {
                    summary.companies_scraped += 1;
                    summary.jobs_upserted += outcome.upserted;
                    if outcome.errored {
                        summary.errors += 1;
                    }
                    let key = outcome
                        .status
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_else(|| "unchanged".to_string());
                    *summary.status_counts.entry(key).or_insert(0) += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, "extraction task panicked");
                    summary.errors += 1;
                }
            }
        }
        Ok(())
    }

    /// Open-feed sweep: market-wide sources that are not tied to any one
    /// company. Metered feeds write the usage ledger per batch.
    async fn sweep_feeds(&self, summary: &mut RunSummary) {
        let batch = remotive::fetch(self.fetcher.as_ref()).await;
        self.upsert_feed(remotive::SOURCE, batch.jobs, summary).await;

        if let Some(credentials) = &self.config.adzuna {
            let batch = adzuna::fetch(self.fetcher.as_ref(), credentials).await;
            if batch.api_calls > 0 {
                if let Err(e) = self
                    .store
                    .record_api_calls(adzuna::SOURCE, batch.api_calls as i64)
                    .await
                {
                    tracing::error!(error = %e, "failed to record adzuna usage");
                    summary.errors += 1;
                }
            }
            self.upsert_feed(adzuna::SOURCE, batch.jobs, summary).await;
        } else {
            tracing::info!("adzuna credentials not set, skipping feed");
        }

        if let Some(credentials) = &self.config.proxycurl {
            let used = match self.store.api_calls_today(proxycurl::SOURCE).await {
                Ok(used) => used,
                Err(e) => {
                    tracing::error!(error = %e, "failed to read proxycurl ledger, skipping feed");
                    summary.errors += 1;
                    return;
                }
            };
            let remaining = (self.config.proxycurl_daily_cap - used).max(0) as u32;
            let batch = proxycurl::fetch(self.fetcher.as_ref(), credentials, remaining).await;
            if batch.api_calls > 0 {
                if let Err(e) = self
                    .store
                    .record_api_calls(proxycurl::SOURCE, batch.api_calls as i64)
                    .await
                {
                    tracing::error!(error = %e, "failed to record proxycurl usage");
                    summary.errors += 1;
                }
            }
            self.upsert_feed(proxycurl::SOURCE, batch.jobs, summary).await;
        } else {
            tracing::info!("proxycurl credentials not set, skipping feed");
        }
    }

    async fn upsert_feed(&self, source: &str, jobs: Vec<CanonicalJob>, summary: &mut RunSummary) {
        if jobs.is_empty() {
            return;
        }
        // Feed jobs arrive before any company record exists for them
        match self.store.upsert_jobs(None, &jobs).await {
            Ok(count) => summary.jobs_upserted += count,
            Err(e) => {
                tracing::error!(source, error = %e, "feed upsert failed");
                summary.errors += 1;
            }
        }
    }

    /// Phase 4: retire stale jobs and heal the search index.
    async fn maintenance(&self, summary: &mut RunSummary) {
        match self.store.mark_stale_inactive(self.config.stale_after_days).await {
            Ok(count) => {
                summary.jobs_marked_inactive = count;
                if count > 0 {
                    tracing::info!(count, "stale jobs marked inactive");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to mark stale jobs");
                summary.errors += 1;
            }
        }
        match self.store.backfill_search_index().await {
            Ok(count) if count > 0 => tracing::info!(count, "search index entries backfilled"),
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "failed to backfill search index");
                summary.errors += 1;
            }
        }
    }
}

/// Everything one spawned extraction task needs, cloneable into `'static`.
struct ScrapeWorker {
    store: Arc<dyn IngestStore>,
    fetcher: Arc<dyn Fetcher>,
    completion: Arc<dyn TextCompletion>,
    cooldown_days: i64,
    delay: Duration,
}

#[derive(Debug, Default)]
struct CompanyOutcome {
    /// Status applied to the company; `None` for the unchanged
    /// short-circuit, which leaves the stored status alone.
    status: Option<ScrapeStatus>,
    upserted: u64,
    errored: bool,
}

impl ScrapeWorker {
    async fn scrape(&self, company: Company) -> CompanyOutcome {
        let outcome = self.scrape_inner(&company).await;
        // Rate limiting: one fixed pause per company, success or not
        tokio::time::sleep(self.delay).await;
        outcome
    }

    async fn scrape_inner(&self, company: &Company) -> CompanyOutcome {
        let Some(career_url) = company.career_url.as_deref() else {
            return CompanyOutcome::default();
        };
        let mut outcome = CompanyOutcome::default();

        let extractor = PageTextExtractor::new(self.fetcher.clone(), self.completion.clone());
        let extraction = extractor
            .extract(career_url, &company.name, company.page_fingerprint.as_deref())
            .await;

        match extraction {
            Ok(PageOutcome::Unchanged) => {
                self.record(company, None, None, &mut outcome).await;
            }
            Ok(PageOutcome::Listings { jobs, fingerprint }) => {
                let upserted = self.upsert(company, &jobs, &mut outcome).await;
                let status = if upserted > 0 {
                    tracing::info!(company = %company.name, count = upserted, "jobs upserted");
                    ScrapeStatus::Ok
                } else {
                    ScrapeStatus::Empty
                };
                self.record(company, Some(status), Some(&fingerprint), &mut outcome)
                    .await;
            }
            Ok(PageOutcome::ShellDetected { fingerprint }) => {
                let status = match try_ats_fallback(self.fetcher.as_ref(), career_url, &company.name)
                    .await
                {
                    Some(jobs) if !jobs.is_empty() => {
                        let upserted = self.upsert(company, &jobs, &mut outcome).await;
                        if upserted > 0 {
                            ScrapeStatus::Ok
                        } else {
                            ScrapeStatus::ShellDetected
                        }
                    }
                    // Router matched but the board is empty, or no known
                    // ATS in the URL at all
                    _ => ScrapeStatus::ShellDetected,
                };
                self.record(company, Some(status), Some(&fingerprint), &mut outcome)
                    .await;
            }
            Err(error) => {
                self.handle_failure(company, &error, &mut outcome).await;
            }
        }
        outcome
    }

    async fn handle_failure(
        &self,
        company: &Company,
        error: &ExtractError,
        outcome: &mut CompanyOutcome,
    ) {
        let status = match error {
            ExtractError::Fetch(f) if f.is_dead() => {
                self.maybe_reset_url(company, outcome).await;
                ScrapeStatus::HttpError
            }
            ExtractError::Fetch(f) if f.is_timeout() => {
                tracing::warn!(company = %company.name, error = %error, "extraction timed out");
                outcome.errored = true;
                ScrapeStatus::Timeout
            }
            _ => {
                tracing::warn!(company = %company.name, error = %error, "extraction failed");
                outcome.errored = true;
                ScrapeStatus::HttpError
            }
        };
        self.record(company, Some(status), None, outcome).await;
    }

    /// Self-healing for dead URLs. Auto-provenance only, and only after the
    /// rediscovery cooldown has elapsed; curated and manual URLs are never
    /// cleared by the pipeline.
    async fn maybe_reset_url(&self, company: &Company, outcome: &mut CompanyOutcome) {
        if company.career_url_provenance != UrlProvenance::Auto {
            tracing::warn!(
                company = %company.name,
                provenance = company.career_url_provenance.as_str(),
                "career URL looks dead but is human-managed, keeping it"
            );
            return;
        }
        let cooldown_elapsed = company.last_discovery_attempt.map_or(true, |t| {
            Utc::now() - t >= chrono::Duration::days(self.cooldown_days)
        });
        if !cooldown_elapsed {
            tracing::debug!(company = %company.name, "dead URL within rediscovery cooldown");
            return;
        }
        tracing::warn!(company = %company.name, "career URL dead, clearing for rediscovery");
        if let Err(e) = self.store.reset_career_url(company.id).await {
            tracing::error!(company = %company.name, error = %e, "failed to reset career URL");
            outcome.errored = true;
        }
    }

    async fn upsert(
        &self,
        company: &Company,
        jobs: &[CanonicalJob],
        outcome: &mut CompanyOutcome,
    ) -> u64 {
        match self.store.upsert_jobs(Some(company.id), jobs).await {
            Ok(count) => {
                outcome.upserted += count;
                count
            }
            Err(e) => {
                tracing::error!(company = %company.name, error = %e, "job upsert failed");
                outcome.errored = true;
                0
            }
        }
    }

    async fn record(
        &self,
        company: &Company,
        status: Option<ScrapeStatus>,
        fingerprint: Option<&str>,
        outcome: &mut CompanyOutcome,
    ) {
        outcome.status = status;
        if let Err(e) = self.store.record_scrape(company.id, status, fingerprint).await {
            tracing::error!(company = %company.name, error = %e, "failed to record scrape");
            outcome.errored = true;
        }
    }
}

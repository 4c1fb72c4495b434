//! Persistence seam for the orchestrator.
//!
//! One trait, two implementations: [`PgStore`] for production and
//! [`MemoryStore`] for tests. The store is the pipeline's only shared
//! mutable state and its sole synchronization point.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use sourcing::CanonicalJob;

use crate::models::{Company, ScrapeStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait IngestStore: Send + Sync {
    /// Every enabled company, for the discovery phases.
    async fn enabled_companies(&self) -> StoreResult<Vec<Company>>;

    /// Enabled companies with a career URL whose last scrape is missing or
    /// older than their per-company interval, oldest first, capped to the
    /// rolling window.
    async fn companies_due(&self, limit: i64) -> StoreResult<Vec<Company>>;

    async fn set_homepage_url(&self, company_id: Uuid, url: &str) -> StoreResult<()>;

    /// Record a freshly discovered career URL with `auto` provenance and
    /// stamp the discovery-attempt timestamp.
    async fn set_discovered_career_url(&self, company_id: Uuid, url: &str) -> StoreResult<()>;

    /// Clear an auto-discovered career URL (and its fingerprint) so the next
    /// run rediscovers it, stamping the discovery-attempt timestamp that
    /// anchors the cooldown.
    async fn reset_career_url(&self, company_id: Uuid) -> StoreResult<()>;

    /// Update scrape bookkeeping after any extraction outcome. `status:
    /// None` means "no information gained" (the unchanged short-circuit):
    /// only `last_scraped` moves; status and fingerprint stay. A `None`
    /// fingerprint with a status keeps the previous fingerprint.
    async fn record_scrape(
        &self,
        company_id: Uuid,
        status: Option<ScrapeStatus>,
        fingerprint: Option<&str>,
    ) -> StoreResult<()>;

    /// Reconcile extracted jobs: insert-or-update on `(source, source_id)`.
    /// Updates refresh `last_seen`, force `active`, and rebuild the search
    /// index; `first_seen` is never touched. Jobs without an apply URL are
    /// skipped. Returns the number of rows written.
    async fn upsert_jobs(&self, company_id: Option<Uuid>, jobs: &[CanonicalJob])
        -> StoreResult<u64>;

    /// Mark jobs not re-observed within the window as inactive (history is
    /// preserved, rows are never deleted). Returns rows affected.
    async fn mark_stale_inactive(&self, not_seen_for_days: i32) -> StoreResult<u64>;

    /// Populate missing search-index entries. Returns rows affected.
    async fn backfill_search_index(&self) -> StoreResult<u64>;

    /// Billable calls already recorded today (UTC) for a source.
    async fn api_calls_today(&self, source: &str) -> StoreResult<i64>;

    /// Add billable calls to today's ledger row for a source.
    async fn record_api_calls(&self, source: &str, count: i64) -> StoreResult<()>;
}

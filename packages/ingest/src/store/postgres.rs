//! PostgreSQL store.
//!
//! Queries are runtime-checked (`sqlx::query`/`query_as` against a live
//! pool), with the schema owned by the migrations directory. The job upsert
//! leans on `ON CONFLICT` so reconciliation is a single round trip per job.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use sourcing::CanonicalJob;

use crate::models::{Company, ScrapeStatus, UrlProvenance};
use crate::store::{IngestStore, StoreResult};

const COMPANY_COLUMNS: &str = "id, name, homepage_url, career_url, career_url_provenance, \
     tier, size, vertical, geo_primary, enabled, last_scraped, page_fingerprint, \
     scrape_interval_days, last_discovery_attempt, scrape_status";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn company_from_row(row: &PgRow) -> Result<Company, sqlx::Error> {
    let provenance: String = row.try_get("career_url_provenance")?;
    let status: String = row.try_get("scrape_status")?;
    Ok(Company {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        homepage_url: row.try_get("homepage_url")?,
        career_url: row.try_get("career_url")?,
        career_url_provenance: UrlProvenance::parse(&provenance),
        tier: row.try_get("tier")?,
        size: row.try_get("size")?,
        vertical: row.try_get("vertical")?,
        geo_primary: row.try_get("geo_primary")?,
        enabled: row.try_get("enabled")?,
        last_scraped: row.try_get("last_scraped")?,
        page_fingerprint: row.try_get("page_fingerprint")?,
        scrape_interval_days: row.try_get("scrape_interval_days")?,
        last_discovery_attempt: row.try_get("last_discovery_attempt")?,
        scrape_status: ScrapeStatus::parse(&status),
    })
}

#[async_trait]
impl IngestStore for PgStore {
    async fn enabled_companies(&self) -> StoreResult<Vec<Company>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE enabled ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| company_from_row(r).map_err(Into::into))
            .collect()
    }

    async fn companies_due(&self, limit: i64) -> StoreResult<Vec<Company>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies \
             WHERE enabled \
               AND career_url IS NOT NULL \
               AND (last_scraped IS NULL \
                    OR last_scraped < now() - make_interval(days => scrape_interval_days)) \
             ORDER BY last_scraped ASC NULLS FIRST \
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| company_from_row(r).map_err(Into::into))
            .collect()
    }

    async fn set_homepage_url(&self, company_id: Uuid, url: &str) -> StoreResult<()> {
        sqlx::query("UPDATE companies SET homepage_url = $2 WHERE id = $1")
            .bind(company_id)
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_discovered_career_url(&self, company_id: Uuid, url: &str) -> StoreResult<()> {
        sqlx::query(
            "UPDATE companies \
             SET career_url = $2, career_url_provenance = 'auto', last_discovery_attempt = now() \
             WHERE id = $1",
        )
        .bind(company_id)
        .bind(url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reset_career_url(&self, company_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            "UPDATE companies \
             SET career_url = NULL, page_fingerprint = NULL, last_discovery_attempt = now() \
             WHERE id = $1",
        )
        .bind(company_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_scrape(
        &self,
        company_id: Uuid,
        status: Option<ScrapeStatus>,
        fingerprint: Option<&str>,
    ) -> StoreResult<()> {
        match status {
            Some(status) => {
                sqlx::query(
                    "UPDATE companies \
                     SET last_scraped = now(), scrape_status = $2, \
                         page_fingerprint = COALESCE($3, page_fingerprint) \
                     WHERE id = $1",
                )
                .bind(company_id)
                .bind(status.as_str())
                .bind(fingerprint)
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query("UPDATE companies SET last_scraped = now() WHERE id = $1")
                    .bind(company_id)
                    .execute(&self.pool)
                    .await?;
            }
        }
        Ok(())
    }

    async fn upsert_jobs(
        &self,
        company_id: Option<Uuid>,
        jobs: &[CanonicalJob],
    ) -> StoreResult<u64> {
        let mut count = 0u64;
        for job in jobs {
            if job.url.is_empty() {
                continue;
            }
            sqlx::query(
                "INSERT INTO jobs (company_id, company_name, source, source_id, title, \
                     location_raw, geo_region, seniority, url, posted_date, \
                     first_seen, last_seen, active, search_index) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now(), now(), TRUE, \
                     to_tsvector('english', $5 || ' ' || $2)) \
                 ON CONFLICT (source, source_id) DO UPDATE SET \
                     last_seen = now(), \
                     active = TRUE, \
                     search_index = to_tsvector('english', EXCLUDED.title || ' ' || EXCLUDED.company_name)",
            )
            .bind(company_id)
            .bind(&job.company_name)
            .bind(&job.source)
            .bind(&job.source_id)
            .bind(&job.title)
            .bind(&job.location)
            .bind(job.region.as_str())
            .bind(job.seniority.as_str())
            .bind(&job.url)
            .bind(job.posted_date)
            .execute(&self.pool)
            .await?;
            count += 1;
        }
        Ok(count)
    }

    async fn mark_stale_inactive(&self, not_seen_for_days: i32) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE jobs SET active = FALSE \
             WHERE active AND last_seen < now() - make_interval(days => $1)",
        )
        .bind(not_seen_for_days)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn backfill_search_index(&self) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET search_index = to_tsvector('english', title || ' ' || company_name) \
             WHERE search_index IS NULL",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn api_calls_today(&self, source: &str) -> StoreResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(call_count), 0)::BIGINT FROM api_usage \
             WHERE source = $1 AND date = CURRENT_DATE",
        )
        .bind(source)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn record_api_calls(&self, source: &str, count: i64) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO api_usage (source, date, call_count) \
             VALUES ($1, CURRENT_DATE, $2) \
             ON CONFLICT (source, date) DO UPDATE \
             SET call_count = api_usage.call_count + EXCLUDED.call_count",
        )
        .bind(source)
        .bind(count as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

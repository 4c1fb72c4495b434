//! Persistent domain records.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Origin of a stored URL, governing whether automated failure handling may
/// overwrite it. Only `auto` URLs are ever reset by the pipeline;
/// curated-list and manual entries belong to humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlProvenance {
    Auto,
    CuratedList,
    Manual,
}

impl UrlProvenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlProvenance::Auto => "auto",
            UrlProvenance::CuratedList => "curated_list",
            UrlProvenance::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> UrlProvenance {
        match s {
            "curated_list" => UrlProvenance::CuratedList,
            "manual" => UrlProvenance::Manual,
            _ => UrlProvenance::Auto,
        }
    }
}

/// Scrape health of a company's career page, re-evaluated every run.
/// `Unchanged` extraction outcomes leave the previous value in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrapeStatus {
    Unset,
    Ok,
    HttpError,
    Empty,
    ShellDetected,
    Timeout,
}

impl ScrapeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeStatus::Unset => "unset",
            ScrapeStatus::Ok => "ok",
            ScrapeStatus::HttpError => "http_error",
            ScrapeStatus::Empty => "empty",
            ScrapeStatus::ShellDetected => "shell_detected",
            ScrapeStatus::Timeout => "timeout",
        }
    }

    pub fn parse(s: &str) -> ScrapeStatus {
        match s {
            "ok" => ScrapeStatus::Ok,
            "http_error" => ScrapeStatus::HttpError,
            "empty" => ScrapeStatus::Empty,
            "shell_detected" => ScrapeStatus::ShellDetected,
            "timeout" => ScrapeStatus::Timeout,
            _ => ScrapeStatus::Unset,
        }
    }
}

/// A tracked company. Seeded externally; the pipeline only touches URL
/// fields, scrape bookkeeping, and status.
#[derive(Debug, Clone)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub homepage_url: Option<String>,
    pub career_url: Option<String>,
    pub career_url_provenance: UrlProvenance,
    pub tier: i32,
    pub size: Option<String>,
    pub vertical: Option<String>,
    pub geo_primary: Option<String>,
    pub enabled: bool,
    pub last_scraped: Option<DateTime<Utc>>,
    pub page_fingerprint: Option<String>,
    pub scrape_interval_days: i32,
    pub last_discovery_attempt: Option<DateTime<Utc>>,
    pub scrape_status: ScrapeStatus,
}

impl Company {
    /// A fresh company row with pipeline defaults, for seeding and tests.
    pub fn seed(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            homepage_url: None,
            career_url: None,
            career_url_provenance: UrlProvenance::Auto,
            tier: 3,
            size: None,
            vertical: None,
            geo_primary: None,
            enabled: true,
            last_scraped: None,
            page_fingerprint: None,
            scrape_interval_days: 5,
            last_discovery_attempt: None,
            scrape_status: ScrapeStatus::Unset,
        }
    }
}

/// A reconciled job row. `(source, source_id)` is globally unique.
#[derive(Debug, Clone)]
pub struct StoredJob {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub company_name: String,
    pub source: String,
    pub source_id: String,
    pub title: String,
    pub location_raw: Option<String>,
    pub geo_region: String,
    pub seniority: String,
    pub url: String,
    pub posted_date: Option<NaiveDate>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub active: bool,
    pub search_index: Option<String>,
}

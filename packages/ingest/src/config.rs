//! Environment-driven configuration.
//!
//! Only the database URL is required. Missing credentials disable the flows
//! that need them - logged once at startup, never fatal.

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

use sourcing::sources::adzuna::AdzunaCredentials;
use sourcing::sources::proxycurl::ProxycurlCredentials;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
}

pub struct Config {
    pub database_url: String,
    pub openai_api_key: Option<String>,
    pub adzuna: Option<AdzunaCredentials>,
    pub proxycurl: Option<ProxycurlCredentials>,
    pub proxycurl_daily_cap: i64,
    pub ats_hints_path: Option<PathBuf>,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = var("DATABASE_URL").ok_or(ConfigError::MissingVar("DATABASE_URL"))?;

        let openai_api_key = var("OPENAI_API_KEY");
        if openai_api_key.is_none() {
            tracing::warn!(
                "OPENAI_API_KEY not set: homepage discovery and page extraction will be skipped"
            );
        }

        let adzuna = match (var("ADZUNA_APP_ID"), var("ADZUNA_APP_KEY")) {
            (Some(app_id), Some(app_key)) => Some(AdzunaCredentials { app_id, app_key }),
            _ => {
                tracing::warn!("Adzuna credentials not set: feed will be skipped");
                None
            }
        };

        let proxycurl = match var("PROXYCURL_API_KEY") {
            Some(key) => Some(ProxycurlCredentials {
                api_key: SecretString::from(key),
            }),
            None => {
                tracing::warn!("PROXYCURL_API_KEY not set: feed will be skipped");
                None
            }
        };

        let proxycurl_daily_cap = var("PROXYCURL_DAILY_CAP")
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            openai_api_key,
            adzuna,
            proxycurl,
            proxycurl_daily_cap,
            ats_hints_path: var("ATS_HINTS_PATH").map(PathBuf::from),
        })
    }
}

//! Entry point: one full ingestion run, meant for a daily scheduler.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ingest::{Config, IngestRunner, PgStore, RunnerConfig};
use sourcing::{load_hints, HttpFetcher, OpenAiCompletion, TextCompletion};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let store = PgStore::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let fetcher = Arc::new(HttpFetcher::default());
    let completion: Option<Arc<dyn TextCompletion>> = config
        .openai_api_key
        .as_deref()
        .map(|key| Arc::new(OpenAiCompletion::new(key)) as Arc<dyn TextCompletion>);

    let hints = config
        .ats_hints_path
        .as_deref()
        .map(load_hints)
        .unwrap_or_default();

    let runner_config = RunnerConfig {
        adzuna: config.adzuna,
        proxycurl: config.proxycurl,
        proxycurl_daily_cap: config.proxycurl_daily_cap,
        hints,
        ..RunnerConfig::default()
    };

    let runner = IngestRunner::new(Arc::new(store), fetcher, completion, runner_config);
    let summary = runner.run().await.context("ingestion run failed")?;

    for (status, count) in &summary.status_counts {
        tracing::info!(status = %status, count, "company scrape outcome");
    }
    tracing::info!(
        jobs_upserted = summary.jobs_upserted,
        homepages = summary.homepages_discovered,
        career_urls = summary.career_urls_discovered,
        inactive = summary.jobs_marked_inactive,
        errors = summary.errors,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "done"
    );
    Ok(())
}

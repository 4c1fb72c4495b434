//! Persistence and orchestration for job-posting ingestion.
//!
//! The `sourcing` crate produces canonical job records from the outside
//! world; this crate owns the store they reconcile into and the phased
//! runner that drives a full ingestion pass. The read API and admin surface
//! consume the same schema but live elsewhere.

pub mod config;
pub mod models;
pub mod orchestrator;
pub mod store;

pub use config::{Config, ConfigError};
pub use models::{Company, ScrapeStatus, StoredJob, UrlProvenance};
pub use orchestrator::{IngestRunner, RunSummary, RunnerConfig};
pub use store::{IngestStore, MemoryStore, PgStore, StoreError};

//! Job-posting discovery and extraction pipeline.
//!
//! This crate owns everything between the open internet and the canonical
//! job record: pure classification of raw titles and locations, structured
//! vendor-API adapters, ATS URL routing, generative-text extraction of
//! arbitrary career pages, and discovery of homepage/career URLs for
//! companies that have neither on file.
//!
//! Persistence and orchestration live in the `ingest` crate; components here
//! are stateless and take their collaborators ([`Fetcher`],
//! [`TextCompletion`]) at construction, so every network seam can be faked
//! in tests.

pub mod classify;
pub mod completion;
pub mod discovery;
pub mod error;
pub mod extractor;
pub mod fetch;
pub mod router;
pub mod sources;
pub mod testing;
pub mod types;

pub use classify::{
    classify_continent, classify_region, classify_seniority, extract_country, is_relevant_role,
    normalize_date, Continent, Region, Seniority,
};
pub use completion::{OpenAiCompletion, TextCompletion};
pub use discovery::{
    load_hints, slugify, AtsHint, CareerDiscovery, CareerProspect, HomepageDiscovery,
};
pub use error::{CompletionError, ExtractError, FetchError};
pub use extractor::{PageOutcome, PageTextExtractor};
pub use fetch::{FetchedPage, Fetcher, HttpFetcher};
pub use router::{detect_ats, try_ats_fallback, AtsPlatform};
pub use sources::FeedBatch;
pub use types::CanonicalJob;

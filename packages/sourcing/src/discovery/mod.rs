//! URL discovery: homepage inference and career-page candidate probing.
//!
//! Two independent flows, each producing a validated URL or nothing - never
//! a partial or unverified guess.

mod career;
mod homepage;

pub use career::{load_hints, slugify, AtsHint, CareerDiscovery, CareerProspect};
pub use homepage::HomepageDiscovery;

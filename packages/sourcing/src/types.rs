//! Canonical job record produced by every source adapter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::classify::{classify_region, classify_seniority, Region, Seniority};

/// A job listing in canonical shape, ready for reconciliation.
///
/// `(source, source_id)` is the global reconciliation key; adapters must
/// derive `source_id` from whatever per-vendor identifier is stable across
/// fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalJob {
    pub source: String,
    pub source_id: String,
    pub title: String,
    pub company_name: String,
    pub location: Option<String>,
    pub url: String,
    pub posted_date: Option<NaiveDate>,
    #[serde(with = "region_str")]
    pub region: Region,
    #[serde(with = "seniority_str")]
    pub seniority: Seniority,
}

impl CanonicalJob {
    /// Build a canonical job, deriving region and seniority inline.
    pub fn new(
        source: impl Into<String>,
        source_id: impl Into<String>,
        title: impl Into<String>,
        company_name: impl Into<String>,
        location: Option<String>,
        url: impl Into<String>,
        posted_date: Option<NaiveDate>,
    ) -> Self {
        let title = title.into();
        let region = classify_region(location.as_deref());
        let seniority = classify_seniority(&title);
        Self {
            source: source.into(),
            source_id: source_id.into(),
            title,
            company_name: company_name.into(),
            location,
            url: url.into(),
            posted_date,
            region,
            seniority,
        }
    }
}

mod region_str {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::classify::Region;

    pub fn serialize<S: Serializer>(r: &Region, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(r.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Region, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(Region::parse(&raw))
    }
}

mod seniority_str {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::classify::Seniority;

    pub fn serialize<S: Serializer>(v: &Seniority, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(v.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Seniority, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(Seniority::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_applied_at_construction() {
        let job = CanonicalJob::new(
            "greenhouse",
            "123",
            "Senior Product Manager",
            "Acme",
            Some("Remote, Germany".to_string()),
            "https://example.com/jobs/123",
            None,
        );
        assert_eq!(job.region, Region::Remote);
        assert_eq!(job.seniority, Seniority::Senior);
    }
}

//! ATS detection and fallback dispatch.
//!
//! When a career page turns out to be a client-rendered shell, the URL
//! itself often gives the game away: it lives on a known ATS domain whose
//! JSON API we already speak. The router pattern-matches the URL and
//! dispatches to the matching adapter.

use regex::Regex;
use std::sync::OnceLock;

use crate::fetch::Fetcher;
use crate::sources;
use crate::types::CanonicalJob;

/// The closed set of ATS platforms with a JSON board API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtsPlatform {
    Greenhouse,
    Lever,
    Ashby,
    SmartRecruiters,
    Teamtailor,
}

impl AtsPlatform {
    pub fn source_name(&self) -> &'static str {
        match self {
            AtsPlatform::Greenhouse => sources::greenhouse::SOURCE,
            AtsPlatform::Lever => sources::lever::SOURCE,
            AtsPlatform::Ashby => sources::ashby::SOURCE,
            AtsPlatform::SmartRecruiters => sources::smartrecruiters::SOURCE,
            AtsPlatform::Teamtailor => sources::teamtailor::SOURCE,
        }
    }

    /// Parse a platform name as it appears in hint files.
    pub fn parse(s: &str) -> Option<AtsPlatform> {
        match s.to_lowercase().as_str() {
            "greenhouse" => Some(AtsPlatform::Greenhouse),
            "lever" => Some(AtsPlatform::Lever),
            "ashby" => Some(AtsPlatform::Ashby),
            "smartrecruiters" => Some(AtsPlatform::SmartRecruiters),
            "teamtailor" => Some(AtsPlatform::Teamtailor),
            _ => None,
        }
    }

    /// Public board URL for a slug on this platform.
    pub fn board_url(&self, slug: &str) -> String {
        match self {
            AtsPlatform::Greenhouse => format!("https://boards.greenhouse.io/{slug}"),
            AtsPlatform::Lever => format!("https://jobs.lever.co/{slug}"),
            AtsPlatform::Ashby => format!("https://jobs.ashbyhq.com/{slug}"),
            AtsPlatform::SmartRecruiters => format!("https://jobs.smartrecruiters.com/{slug}"),
            AtsPlatform::Teamtailor => format!("https://{slug}.teamtailor.com/jobs"),
        }
    }

    /// Fetch the board through the platform's adapter.
    pub async fn fetch(
        &self,
        fetcher: &dyn Fetcher,
        slug: &str,
        company_name: &str,
    ) -> Vec<CanonicalJob> {
        match self {
            AtsPlatform::Greenhouse => sources::greenhouse::fetch(fetcher, slug, company_name).await,
            AtsPlatform::Lever => sources::lever::fetch(fetcher, slug, company_name).await,
            AtsPlatform::Ashby => sources::ashby::fetch(fetcher, slug, company_name).await,
            AtsPlatform::SmartRecruiters => {
                sources::smartrecruiters::fetch(fetcher, slug, company_name).await
            }
            AtsPlatform::Teamtailor => sources::teamtailor::fetch(fetcher, slug, company_name).await,
        }
    }
}

fn patterns() -> &'static [(AtsPlatform, Regex)] {
    static PATTERNS: OnceLock<Vec<(AtsPlatform, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            (
                AtsPlatform::Greenhouse,
                Regex::new(r"(?i)^https?://boards(?:\.eu)?\.greenhouse\.io/([^/?#]+)")
                    .expect("static regex"),
            ),
            (
                AtsPlatform::Lever,
                Regex::new(r"(?i)^https?://jobs\.lever\.co/([^/?#]+)").expect("static regex"),
            ),
            (
                AtsPlatform::Ashby,
                Regex::new(r"(?i)^https?://jobs\.ashby(?:hq)?\.com/([^/?#]+)")
                    .expect("static regex"),
            ),
            (
                AtsPlatform::SmartRecruiters,
                Regex::new(r"(?i)^https?://(?:jobs|careers)\.smartrecruiters\.com/([^/?#]+)")
                    .expect("static regex"),
            ),
            (
                AtsPlatform::Teamtailor,
                Regex::new(r"(?i)^https?://([^./]+)\.teamtailor\.com").expect("static regex"),
            ),
        ]
    })
}

/// Match a career URL against the known platform URL shapes.
///
/// Returns the platform and the extracted board slug, or `None` when the URL
/// belongs to no platform we can speak to.
pub fn detect_ats(career_url: &str) -> Option<(AtsPlatform, String)> {
    for (platform, pattern) in patterns() {
        if let Some(caps) = pattern.captures(career_url) {
            let slug = caps.get(1)?.as_str();
            // "www.teamtailor.com" is the vendor's own site, not a tenant
            if !slug.is_empty() && !slug.eq_ignore_ascii_case("www") {
                return Some((*platform, slug.to_string()));
            }
        }
    }
    None
}

/// Try extracting through a known ATS API instead of the page itself.
///
/// `None` means "no platform matched" - not applicable, and distinct from
/// `Some(vec![])`, which means the platform answered with zero relevant jobs.
pub async fn try_ats_fallback(
    fetcher: &dyn Fetcher,
    career_url: &str,
    company_name: &str,
) -> Option<Vec<CanonicalJob>> {
    let (platform, slug) = detect_ats(career_url)?;
    tracing::info!(
        company = company_name,
        platform = platform.source_name(),
        slug = %slug,
        "routing shell page through ATS API"
    );
    Some(platform.fetch(fetcher, &slug, company_name).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_platform() {
        let cases = [
            (
                "https://boards.greenhouse.io/acme",
                AtsPlatform::Greenhouse,
                "acme",
            ),
            (
                "https://boards.eu.greenhouse.io/acme",
                AtsPlatform::Greenhouse,
                "acme",
            ),
            ("https://jobs.lever.co/acme?lever-via=x", AtsPlatform::Lever, "acme"),
            ("https://jobs.ashbyhq.com/acme", AtsPlatform::Ashby, "acme"),
            (
                "https://careers.smartrecruiters.com/Acme",
                AtsPlatform::SmartRecruiters,
                "Acme",
            ),
            (
                "https://acme.teamtailor.com/jobs",
                AtsPlatform::Teamtailor,
                "acme",
            ),
        ];
        for (url, platform, slug) in cases {
            assert_eq!(
                detect_ats(url),
                Some((platform, slug.to_string())),
                "failed for {url}"
            );
        }
    }

    #[test]
    fn unknown_hosts_do_not_match() {
        assert_eq!(detect_ats("https://example.com/careers"), None);
        assert_eq!(detect_ats("https://www.teamtailor.com"), None);
        assert_eq!(detect_ats("not a url"), None);
    }

    #[test]
    fn slug_stops_at_path_and_query() {
        let (_, slug) = detect_ats("https://jobs.lever.co/acme/123-senior-pm").unwrap();
        assert_eq!(slug, "acme");
    }
}

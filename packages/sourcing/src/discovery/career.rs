//! Career-page discovery by templated candidates and live validation.
//!
//! No classifier involved: candidates are generated in priority order from
//! whatever is known about the company (platform hint, slug, homepage,
//! name) and probed until one passes content validation. The first pass
//! wins and probing stops there.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::fetch::Fetcher;
use crate::router::AtsPlatform;

const COMPANY_CONCURRENCY: usize = 20;

/// Platforms worth guessing blindly when only a slug is known, most common
/// first.
const BLIND_PLATFORMS: &[AtsPlatform] = &[
    AtsPlatform::Greenhouse,
    AtsPlatform::Lever,
    AtsPlatform::Ashby,
];

/// ATS hosts accepted during validation regardless of path.
const ATS_DOMAINS: &[&str] = &[
    "greenhouse.io",
    "lever.co",
    "ashbyhq.com",
    "smartrecruiters.com",
    "teamtailor.com",
    "workday.com",
    "myworkdayjobs.com",
    "bamboohr.com",
    "workable.com",
    "icims.com",
    "taleo.net",
    "recruitee.com",
    "jobvite.com",
];

/// Path segments that mark a career page.
const CAREER_PATH_SEGMENTS: &[&str] = &[
    "/careers",
    "/jobs",
    "/join",
    "/work-with-us",
    "/work",
    "/positions",
    "/openings",
    "/hiring",
    "/vacancies",
    "/en/careers",
    "/company/careers",
    "/about/careers",
    "/about/jobs",
];

/// At least one of these must appear in the page body.
const CAREER_KEYWORDS: &[&str] = &[
    "job", "apply", "position", "opening", "career", "hiring", "role", "vacanc",
];

/// Blank or still-loading pages are smaller than this.
const MIN_CONTENT_LENGTH: usize = 500;

/// Curated knowledge about where a company's board lives.
#[derive(Debug, Clone, Default)]
pub struct AtsHint {
    pub platform: Option<AtsPlatform>,
    pub slug: Option<String>,
}

#[derive(Deserialize)]
struct RawHint {
    platform: Option<String>,
    slug: Option<String>,
}

/// Load hints from a JSON file mapping company name to `{platform, slug}`.
/// Keys are lowercased for lookup. Unreadable files log and yield nothing.
pub fn load_hints(path: &Path) -> HashMap<String, AtsHint> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "hints file unreadable");
            return HashMap::new();
        }
    };
    let parsed: HashMap<String, RawHint> = match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "hints file malformed");
            return HashMap::new();
        }
    };
    parsed
        .into_iter()
        .map(|(name, hint)| {
            (
                name.to_lowercase(),
                AtsHint {
                    platform: hint.platform.as_deref().and_then(AtsPlatform::parse),
                    slug: hint.slug,
                },
            )
        })
        .collect()
}

/// One company to discover a career URL for.
#[derive(Debug, Clone)]
pub struct CareerProspect {
    pub name: String,
    pub homepage_url: Option<String>,
    pub hint: AtsHint,
}

pub struct CareerDiscovery {
    fetcher: Arc<dyn Fetcher>,
}

impl CareerDiscovery {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Discover career URLs for a batch, bounded fan-out per company.
    /// Returns `name → validated URL` for the companies that resolved.
    pub async fn discover_all(&self, prospects: &[CareerProspect]) -> HashMap<String, String> {
        let gate = Semaphore::new(COMPANY_CONCURRENCY);
        let futures = prospects.iter().map(|prospect| {
            let gate = &gate;
            async move {
                let _permit = gate.acquire().await.expect("semaphore never closed");
                self.discover(prospect)
                    .await
                    .map(|url| (prospect.name.clone(), url))
            }
        });
        let found: HashMap<String, String> = futures::future::join_all(futures)
            .await
            .into_iter()
            .flatten()
            .collect();
        tracing::info!(
            found = found.len(),
            requested = prospects.len(),
            "career URL discovery complete"
        );
        found
    }

    /// Walk the candidate priority order for one company; the first
    /// candidate to pass validation wins.
    pub async fn discover(&self, prospect: &CareerProspect) -> Option<String> {
        let hint = &prospect.hint;

        // (a) platform + slug: one direct URL
        if let (Some(platform), Some(slug)) = (hint.platform, hint.slug.as_deref()) {
            let url = platform.board_url(slug);
            if self.validate(&url).await {
                return Some(url);
            }
        }

        // (b) slug alone against the common platforms
        if let Some(slug) = hint.slug.as_deref() {
            for platform in BLIND_PLATFORMS {
                let url = platform.board_url(slug);
                if self.validate(&url).await {
                    return Some(url);
                }
            }
        }

        // (c) candidates derived from the real homepage domain
        if let Some(homepage) = prospect.homepage_url.as_deref() {
            for url in homepage_candidates(homepage) {
                if self.validate(&url).await {
                    return Some(url);
                }
            }
        }

        // (d) slugified company name against everything
        let mut slugs = slugify(&prospect.name);
        if let Some(slug) = hint.slug.as_deref() {
            if !slugs.iter().any(|s| s == slug) {
                slugs.insert(0, slug.to_string());
            }
        }
        for slug in &slugs {
            for template in generic_candidates(slug) {
                if self.validate(&template).await {
                    return Some(template);
                }
            }
            if hint.slug.as_deref() != Some(slug.as_str()) {
                for platform in BLIND_PLATFORMS {
                    let url = platform.board_url(slug);
                    if self.validate(&url).await {
                        return Some(url);
                    }
                }
            }
        }

        tracing::debug!(company = %prospect.name, "no career URL found");
        None
    }

    /// Validate that a candidate actually points at a careers page.
    ///
    /// Order: reachability (HEAD, GET on 405), then the resolved URL must be
    /// a known ATS domain or carry a career path segment, then a career
    /// keyword must appear in the body, then the body must clear the size
    /// floor. Login walls and homepages fail the path check; shells fail the
    /// size floor.
    async fn validate(&self, url: &str) -> bool {
        match self.fetcher.head(url).await {
            Ok(head) if head.status >= 400 && head.status != 405 => return false,
            Ok(_) => {}
            Err(_) => return false,
        }

        let page = match self.fetcher.get(url).await {
            Ok(page) if page.status < 400 => page,
            _ => return false,
        };

        let final_url = page.url.to_lowercase();
        let Ok(parsed) = url::Url::parse(&final_url) else {
            return false;
        };
        let host = parsed.host_str().unwrap_or_default();
        let path = parsed.path();

        let on_ats = ATS_DOMAINS.iter().any(|d| host.contains(d));
        let career_path = CAREER_PATH_SEGMENTS.iter().any(|seg| path.contains(seg));
        if !on_ats && !career_path {
            return false;
        }

        let body = page.body.to_lowercase();
        if !CAREER_KEYWORDS.iter().any(|kw| body.contains(kw)) {
            return false;
        }

        page.body.len() >= MIN_CONTENT_LENGTH
    }
}

/// Candidate URLs derived from a known homepage.
fn homepage_candidates(homepage: &str) -> Vec<String> {
    let Ok(parsed) = url::Url::parse(homepage) else {
        return Vec::new();
    };
    let Some(host) = parsed.host_str() else {
        return Vec::new();
    };
    let host = host.to_lowercase();
    let base = format!("{}://{host}", parsed.scheme());
    let bare_domain = host.strip_prefix("www.").unwrap_or(&host);
    let domain_slug = bare_domain.split('.').next().unwrap_or(bare_domain);

    let mut candidates = vec![
        format!("{base}/careers"),
        format!("{base}/jobs"),
        format!("{base}/company/careers"),
        format!("{base}/en/careers"),
        format!("{base}/about/careers"),
        format!("{base}/work-with-us"),
        format!("https://careers.{bare_domain}"),
        format!("https://jobs.{bare_domain}"),
    ];
    for platform in BLIND_PLATFORMS {
        candidates.push(platform.board_url(domain_slug));
    }
    candidates
}

/// Generic career-page URL patterns for a bare slug.
fn generic_candidates(slug: &str) -> Vec<String> {
    vec![
        format!("https://{slug}.com/careers"),
        format!("https://www.{slug}.com/careers"),
        format!("https://careers.{slug}.com"),
        format!("https://{slug}.com/jobs"),
        format!("https://www.{slug}.com/jobs"),
        format!("https://jobs.{slug}.com"),
        format!("https://{slug}.com/en/careers"),
        format!("https://{slug}.com/company/careers"),
    ]
}

/// Slug variants for a company name.
///
/// "Palo Alto Networks" → ["paloaltonetworks", "palo-alto-networks"];
/// "monday.com" → ["monday", "monday-com"]; "Auth0" → ["auth0"].
pub fn slugify(name: &str) -> Vec<String> {
    let mut clean = name.trim().to_lowercase();
    for suffix in [".com", ".io", ".ai", ".co", ".dev", ".app", ".tech"] {
        if let Some(stripped) = clean.strip_suffix(suffix) {
            clean = stripped.trim().to_string();
            break;
        }
    }

    let alphanumeric: String = clean.chars().filter(|c| c.is_ascii_alphanumeric()).collect();

    let mut hyphenated = String::with_capacity(clean.len());
    let mut last_was_sep = true;
    for c in clean.chars() {
        if c.is_ascii_alphanumeric() {
            hyphenated.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            hyphenated.push('-');
            last_was_sep = true;
        }
    }
    let hyphenated = hyphenated.trim_end_matches('-').to_string();

    let mut slugs = Vec::new();
    if !alphanumeric.is_empty() {
        slugs.push(alphanumeric);
    }
    if !hyphenated.is_empty() && Some(&hyphenated) != slugs.first() {
        slugs.push(hyphenated);
    }
    slugs
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A page that passes every validation check at an ATS host.
    fn valid_board_body() -> String {
        format!(
            "<html><body><h1>Open positions</h1><p>Apply for a role today.</p>{}</body></html>",
            "filler ".repeat(100)
        )
    }

    #[test]
    fn slugify_variants() {
        assert_eq!(
            slugify("Palo Alto Networks"),
            vec!["paloaltonetworks", "palo-alto-networks"]
        );
        assert_eq!(slugify("monday.com"), vec!["monday"]);
        assert_eq!(slugify("Auth0"), vec!["auth0"]);
    }

    #[test]
    fn homepage_candidates_use_real_domain() {
        let candidates = homepage_candidates("https://www.stripe.com");
        assert!(candidates.contains(&"https://www.stripe.com/careers".to_string()));
        assert!(candidates.contains(&"https://careers.stripe.com".to_string()));
        assert!(candidates.contains(&"https://boards.greenhouse.io/stripe".to_string()));
    }

    #[tokio::test]
    async fn hint_wins_over_homepage_candidates() {
        use crate::testing::MockFetcher;

        let fetcher = MockFetcher::new()
            .with_page("https://boards.greenhouse.io/acme", &valid_board_body())
            // The homepage route would also validate, but must never be tried
            .with_page("https://acme.com/careers", &valid_board_body());
        let fetcher_probe = fetcher.clone();
        let discovery = CareerDiscovery::new(Arc::new(fetcher));

        let prospect = CareerProspect {
            name: "Acme".to_string(),
            homepage_url: Some("https://acme.com".to_string()),
            hint: AtsHint {
                platform: Some(AtsPlatform::Greenhouse),
                slug: Some("acme".to_string()),
            },
        };
        let url = discovery.discover(&prospect).await;

        assert_eq!(url.as_deref(), Some("https://boards.greenhouse.io/acme"));
        assert!(
            !fetcher_probe
                .fetched()
                .iter()
                .any(|u| u.starts_with("https://acme.com")),
            "homepage-derived candidates must not be probed once the hint validates"
        );
    }

    #[tokio::test]
    async fn rejects_pages_that_fail_content_checks() {
        use crate::testing::MockFetcher;

        // Right path, but tiny body: a shell
        let fetcher = MockFetcher::new().with_page("https://acme.com/careers", "<p>jobs</p>");
        let discovery = CareerDiscovery::new(Arc::new(fetcher));

        let prospect = CareerProspect {
            name: "Acme".to_string(),
            homepage_url: Some("https://acme.com".to_string()),
            hint: AtsHint::default(),
        };
        assert_eq!(discovery.discover(&prospect).await, None);
    }

    #[tokio::test]
    async fn homepage_route_validates_when_no_hint() {
        use crate::testing::MockFetcher;

        let fetcher = MockFetcher::new().with_page("https://acme.com/careers", &valid_board_body());
        let discovery = CareerDiscovery::new(Arc::new(fetcher));

        let prospect = CareerProspect {
            name: "Acme".to_string(),
            homepage_url: Some("https://acme.com".to_string()),
            hint: AtsHint::default(),
        };
        assert_eq!(
            discovery.discover(&prospect).await.as_deref(),
            Some("https://acme.com/careers")
        );
    }
}

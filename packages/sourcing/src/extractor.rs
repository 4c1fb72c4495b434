//! Career-page text extraction through the generative-text classifier.
//!
//! Per invocation this is a small state machine: fetch, fingerprint,
//! short-circuit on unchanged content, convert markup to text, detect
//! client-rendered shells, then walk a bounded pagination loop feeding each
//! page's text to the classifier. The fingerprint comparison is the primary
//! cost control - an unchanged page never reaches the classifier.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;

use crate::classify::{is_relevant_role, parse_date_str};
use crate::completion::TextCompletion;
use crate::error::{ExtractError, FetchError};
use crate::fetch::{FetchedPage, Fetcher};
use crate::types::CanonicalJob;

/// Source tag for jobs extracted from arbitrary career pages.
pub const SOURCE: &str = "career_page";

/// Character budget for converted page text, bounding classifier cost.
const TEXT_BUDGET: usize = 15_000;

/// Hard cap on pages walked in one invocation.
const MAX_PAGES: usize = 20;

/// Converted text shorter than this is a shell regardless of markup.
const SHELL_MIN_TEXT: usize = 100;

/// With a client-rendering signal in the markup, text under this length is
/// still treated as a shell.
const SHELL_SIGNAL_TEXT: usize = 600;

const SHELL_SIGNALS: &[&str] = &[
    "enable javascript",
    "javascript is required",
    "javascript to run",
    "you need to enable",
    "loading...",
    "please wait",
];

const EXTRACTION_PROMPT: &str = r#"You are a job listing extractor. Extract all Product Manager job listings from this career page.

Return ONLY a JSON object with two keys:
- "jobs": an array of objects, each with:
  - "title": the exact job title (string)
  - "location": office location or "Remote" (string, empty string if unknown)
  - "url": link to the job posting (string; absolute or relative to the page)
  - "posted_date": posting date in ISO format YYYY-MM-DD if visible (string or null)
- "next_page_url": the URL of the next page of listings when the list is paginated (a "next" or "more jobs" link), else null

Include ONLY these PM-related roles: Product Manager, Product Owner, Head of Product, VP Product, Director of Product, CPO, Group PM, Staff PM, Principal PM, Technical PM, Growth PM, AI PM, Product Lead, Product Strategy, Digital Product Manager, Associate PM.

Exclude: Product Marketing, Product Analyst, Data Analyst, Software Engineer, Engineering Manager, Designer, Project Manager.

If no PM jobs are found, return {"jobs": [], "next_page_url": null}.
Do NOT invent or hallucinate job listings. Only extract what is actually on the page."#;

/// Outcome of one extraction invocation. Routine conditions are variants,
/// not errors; the orchestrator branches on all of them.
#[derive(Debug)]
pub enum PageOutcome {
    /// Extraction ran; `jobs` may legitimately be empty. The fingerprint is
    /// taken from the first page only.
    Listings {
        jobs: Vec<CanonicalJob>,
        fingerprint: String,
    },
    /// First-page fingerprint matched the previous one; nothing was sent to
    /// the classifier.
    Unchanged,
    /// The page is a client-rendered shell with no extractable content. The
    /// caller should try the ATS router before giving up.
    ShellDetected { fingerprint: String },
}

pub struct PageTextExtractor {
    fetcher: Arc<dyn Fetcher>,
    completion: Arc<dyn TextCompletion>,
}

impl PageTextExtractor {
    pub fn new(fetcher: Arc<dyn Fetcher>, completion: Arc<dyn TextCompletion>) -> Self {
        Self { fetcher, completion }
    }

    /// Run the full extraction state machine against one career URL.
    ///
    /// A fetch failure on the first page propagates as an error (404/410
    /// distinguished as [`FetchError::Dead`]); a failure on any later page
    /// ends pagination and returns what was accumulated.
    pub async fn extract(
        &self,
        career_url: &str,
        company_name: &str,
        previous_fingerprint: Option<&str>,
    ) -> Result<PageOutcome, ExtractError> {
        let first = self.fetch_page(career_url).await?;
        let fingerprint = first.fingerprint();

        if previous_fingerprint == Some(fingerprint.as_str()) {
            tracing::debug!(company = company_name, "page unchanged, skipping extraction");
            return Ok(PageOutcome::Unchanged);
        }

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(career_url.to_string());
        visited.insert(first.url.clone());

        let mut jobs = Vec::new();
        let mut page = first;

        for page_index in 0..MAX_PAGES {
            let text = truncate_chars(html_to_text(&page.body), TEXT_BUDGET);

            if is_shell(&page.body, &text) {
                if page_index == 0 {
                    tracing::info!(company = company_name, url = %page.url, "shell page detected");
                    return Ok(PageOutcome::ShellDetected { fingerprint });
                }
                // A shell deep in pagination carries no signal worth
                // discarding accumulated jobs over
                tracing::debug!(company = company_name, url = %page.url, "shell page mid-pagination");
                break;
            }

            let response = match self.classify_page(company_name, &page.url, &text).await {
                Ok(raw) => raw,
                Err(e) if page_index == 0 => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(company = company_name, error = %e, "classifier failed mid-pagination");
                    break;
                }
            };

            let Some(parsed) = parse_response(&response) else {
                tracing::warn!(company = company_name, "classifier returned malformed JSON");
                break;
            };

            for item in parsed.jobs {
                if let Some(job) = canonicalize(item, company_name, &page.url) {
                    jobs.push(job);
                }
            }

            let Some(next) = parsed.next_page_url.and_then(|n| resolve_url(&page.url, &n)) else {
                break;
            };
            if !visited.insert(next.clone()) {
                tracing::debug!(company = company_name, url = %next, "pagination cycle detected");
                break;
            }

            page = match self.fetch_page(&next).await {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(company = company_name, url = %next, error = %e, "pagination fetch failed");
                    break;
                }
            };
        }

        tracing::info!(
            company = company_name,
            count = jobs.len(),
            "career page extraction complete"
        );
        Ok(PageOutcome::Listings { jobs, fingerprint })
    }

    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let page = self.fetcher.get(url).await?;
        match page.status {
            404 | 410 => Err(FetchError::Dead {
                url: url.to_string(),
                status: page.status,
            }),
            s if !(200..300).contains(&s) => Err(FetchError::Status {
                url: url.to_string(),
                status: s,
            }),
            _ => Ok(page),
        }
    }

    async fn classify_page(
        &self,
        company_name: &str,
        page_url: &str,
        text: &str,
    ) -> Result<String, crate::error::CompletionError> {
        let origin = origin_of(page_url).unwrap_or_else(|| page_url.to_string());
        let user = format!(
            "Company: {company_name}\nCareer page URL: {page_url}\n\
             Base URL for relative links: {origin}\n\n--- PAGE CONTENT ---\n{text}"
        );
        self.completion.complete_json(EXTRACTION_PROMPT, &user).await
    }
}

struct ParsedResponse {
    jobs: Vec<RawListing>,
    next_page_url: Option<String>,
}

struct RawListing {
    title: String,
    location: Option<String>,
    url: String,
    posted_date: Option<String>,
}

fn parse_response(raw: &str) -> Option<ParsedResponse> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let jobs = value["jobs"]
        .as_array()?
        .iter()
        .filter_map(|item| {
            let title = item["title"].as_str()?.trim().to_string();
            let url = item["url"].as_str()?.trim().to_string();
            if title.is_empty() || url.is_empty() {
                return None;
            }
            Some(RawListing {
                title,
                location: item["location"]
                    .as_str()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                url,
                posted_date: item["posted_date"].as_str().map(str::to_string),
            })
        })
        .collect();
    let next_page_url = value["next_page_url"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Some(ParsedResponse {
        jobs,
        next_page_url,
    })
}

fn canonicalize(item: RawListing, company_name: &str, page_url: &str) -> Option<CanonicalJob> {
    if !is_relevant_role(&item.title) {
        return None;
    }
    let url = resolve_url(page_url, &item.url)?;
    let posted = item.posted_date.as_deref().and_then(parse_date_str);

    // The page gives us no vendor identifier; the apply URL is the only
    // stable key across visits
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let source_id = format!("{:x}", hasher.finalize())[..32].to_string();

    Some(CanonicalJob::new(
        SOURCE,
        source_id,
        item.title,
        company_name,
        item.location,
        url,
        posted,
    ))
}

/// Resolve a possibly-relative URL against the page it came from.
fn resolve_url(page_url: &str, candidate: &str) -> Option<String> {
    let base = url::Url::parse(page_url).ok()?;
    base.join(candidate).ok().map(|u| u.to_string())
}

fn origin_of(page_url: &str) -> Option<String> {
    let parsed = url::Url::parse(page_url).ok()?;
    Some(format!("{}://{}", parsed.scheme(), parsed.host_str()?))
}

/// Convert markup to plain text, links kept, images and scripts dropped.
fn html_to_text(html: &str) -> String {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "img", "svg", "iframe"])
        .build();
    converter.convert(html).unwrap_or_else(|_| {
        // Fallback: strip tags and keep the text nodes
        let document = scraper::Html::parse_document(html);
        document.root_element().text().collect::<String>()
    })
}

fn truncate_chars(s: String, budget: usize) -> String {
    match s.char_indices().nth(budget) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s,
    }
}

fn is_shell(raw_markup: &str, converted_text: &str) -> bool {
    let text_len = converted_text.trim().len();
    if text_len < SHELL_MIN_TEXT {
        return true;
    }
    if text_len < SHELL_SIGNAL_TEXT {
        let markup = raw_markup.to_lowercase();
        return SHELL_SIGNALS.iter().any(|sig| markup.contains(sig));
    }
    false
}

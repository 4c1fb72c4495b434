//! Company homepage discovery.
//!
//! Batches company names through the generative-text service under a strict
//! "do not guess" instruction, then keeps only URLs that answer a live
//! reachability probe. Inference batches and probes run under separate
//! concurrency bounds - probes are cheap and fan out wider.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::completion::TextCompletion;
use crate::fetch::Fetcher;

const BATCH_SIZE: usize = 25;
const INFERENCE_CONCURRENCY: usize = 5;
const PROBE_CONCURRENCY: usize = 20;

const DISCOVERY_PROMPT: &str = r#"You are a company information lookup tool. For each company name provided, return its official website URL.

Return ONLY a JSON object with this format:
{"results": [{"name": "Company Name", "url": "https://example.com"}, ...]}

Rules:
- Return the main company homepage URL (NOT the careers page, NOT a product page)
- Use https:// prefix
- If you are not sure about a company, return null for the url
- Do NOT invent URLs - only return URLs you are confident about
- For well-known companies return their primary domain
- Include www. only if the company's canonical URL uses it"#;

pub struct HomepageDiscovery {
    fetcher: Arc<dyn Fetcher>,
    completion: Arc<dyn TextCompletion>,
}

impl HomepageDiscovery {
    pub fn new(fetcher: Arc<dyn Fetcher>, completion: Arc<dyn TextCompletion>) -> Self {
        Self { fetcher, completion }
    }

    /// Discover homepages for a set of company names.
    ///
    /// Returns only validated `name → final URL` pairs; names the service
    /// declined or whose URL failed the probe are simply absent.
    pub async fn discover(&self, names: &[String]) -> HashMap<String, String> {
        if names.is_empty() {
            return HashMap::new();
        }

        let inference_gate = Semaphore::new(INFERENCE_CONCURRENCY);
        let batch_futures = names.chunks(BATCH_SIZE).map(|batch| {
            let gate = &inference_gate;
            async move {
                let _permit = gate.acquire().await.expect("semaphore never closed");
                self.infer_batch(batch).await
            }
        });
        let mut candidates: HashMap<String, String> = HashMap::new();
        for mapping in futures::future::join_all(batch_futures).await {
            candidates.extend(mapping);
        }
        tracing::info!(
            inferred = candidates.len(),
            requested = names.len(),
            "homepage inference complete"
        );

        let probe_gate = Semaphore::new(PROBE_CONCURRENCY);
        let probe_futures = candidates.iter().map(|(name, url)| {
            let gate = &probe_gate;
            async move {
                let _permit = gate.acquire().await.expect("semaphore never closed");
                self.validate(url).await.map(|final_url| (name.clone(), final_url))
            }
        });
        let validated: HashMap<String, String> = futures::future::join_all(probe_futures)
            .await
            .into_iter()
            .flatten()
            .collect();

        tracing::info!(
            validated = validated.len(),
            requested = names.len(),
            "homepage discovery complete"
        );
        validated
    }

    /// One inference call for up to [`BATCH_SIZE`] names. Failures and
    /// malformed output collapse to an empty mapping.
    async fn infer_batch(&self, names: &[String]) -> HashMap<String, String> {
        let list = names
            .iter()
            .map(|n| format!("- {n}"))
            .collect::<Vec<_>>()
            .join("\n");
        let user = format!("Find the official website URL for each company:\n\n{list}");

        let raw = match self.completion.complete_json(DISCOVERY_PROMPT, &user).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "homepage inference batch failed");
                return HashMap::new();
            }
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) else {
            tracing::warn!("homepage inference returned malformed JSON");
            return HashMap::new();
        };

        let mut mapping = HashMap::new();
        for item in value["results"].as_array().into_iter().flatten() {
            let Some(returned_name) = item["name"].as_str().map(str::trim).filter(|s| !s.is_empty())
            else {
                continue;
            };
            let Some(url) = item["url"].as_str().map(str::trim).filter(|s| !s.is_empty()) else {
                continue;
            };

            // Match the answer back to the requested name; the service
            // sometimes reformats names slightly
            let matched = names
                .iter()
                .find(|n| n.eq_ignore_ascii_case(returned_name))
                .or_else(|| {
                    let lower = returned_name.to_lowercase();
                    names.iter().find(|n| {
                        let orig = n.to_lowercase();
                        orig.contains(&lower) || lower.contains(&orig)
                    })
                });
            if let Some(name) = matched {
                mapping.entry(name.clone()).or_insert_with(|| url.to_string());
            }
        }
        mapping
    }

    /// Reachability probe: HEAD with GET fallback, then a `www.` variant
    /// added or removed. Returns the final URL after redirects.
    async fn validate(&self, url: &str) -> Option<String> {
        if let Some(final_url) = self.probe(url).await {
            return Some(final_url);
        }

        let variant = if url.contains("://www.") {
            url.replacen("://www.", "://", 1)
        } else {
            url.replacen("://", "://www.", 1)
        };
        if variant != url {
            if let Some(final_url) = self.probe(&variant).await {
                return Some(final_url);
            }
        }
        None
    }

    async fn probe(&self, url: &str) -> Option<String> {
        match self.fetcher.head(url).await {
            Ok(page) if page.status < 400 => return Some(page.url),
            // Some servers reject HEAD outright; fall through to GET
            Ok(page) if page.status == 405 => {}
            _ => return None,
        }
        match self.fetcher.get(url).await {
            Ok(page) if page.status < 400 => Some(page.url),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCompletion, MockFetcher};

    #[tokio::test]
    async fn only_validated_urls_are_returned() {
        let names = vec!["Acme".to_string(), "Ghost Corp".to_string()];
        let completion = MockCompletion::new().push_response(
            r#"{"results": [
                {"name": "Acme", "url": "https://acme.com"},
                {"name": "Ghost Corp", "url": "https://ghost-corp.example"}
            ]}"#,
        );
        let fetcher = MockFetcher::new().with_status("https://acme.com", 200);
        // ghost-corp.example is unregistered: probe sees 404, www variant too

        let discovery = HomepageDiscovery::new(Arc::new(fetcher), Arc::new(completion));
        let found = discovery.discover(&names).await;

        assert_eq!(found.get("Acme").map(String::as_str), Some("https://acme.com"));
        assert!(!found.contains_key("Ghost Corp"));
    }

    #[tokio::test]
    async fn www_variant_rescues_a_failing_probe() {
        let names = vec!["Acme".to_string()];
        let completion = MockCompletion::new()
            .push_response(r#"{"results": [{"name": "Acme", "url": "https://acme.com"}]}"#);
        let fetcher = MockFetcher::new()
            .with_status("https://acme.com", 500)
            .with_status("https://www.acme.com", 200);

        let discovery = HomepageDiscovery::new(Arc::new(fetcher), Arc::new(completion));
        let found = discovery.discover(&names).await;

        assert_eq!(
            found.get("Acme").map(String::as_str),
            Some("https://www.acme.com")
        );
    }

    #[tokio::test]
    async fn failed_batch_yields_nothing() {
        let names = vec!["Acme".to_string()];
        let completion = MockCompletion::new().push_failure("service exploded");
        let fetcher = MockFetcher::new();

        let discovery = HomepageDiscovery::new(Arc::new(fetcher), Arc::new(completion));
        assert!(discovery.discover(&names).await.is_empty());
    }
}

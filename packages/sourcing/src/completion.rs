//! Generative-text service client.
//!
//! The pipeline treats the service as an opaque classifier: a system prompt
//! plus user content in, JSON-shaped text out. Components receive a
//! [`TextCompletion`] at construction so tests can substitute a fake.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::time::Duration;

use crate::error::CompletionError;

/// Backoff before the single retry on a 429.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);

/// Opaque prompt-in, JSON-text-out completion service.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Run a completion that is expected to return a JSON object as text.
    /// The returned string is not parsed here; callers own the schema.
    async fn complete_json(&self, system: &str, user: &str) -> Result<String, CompletionError>;
}

/// Chat-completions client for an OpenAI-compatible endpoint.
///
/// Requests JSON-object output at temperature 0. A 429 gets exactly one
/// retry after a fixed backoff; every other failure surfaces immediately.
#[derive(Clone)]
pub struct OpenAiCompletion {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAiCompletion {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: SecretString::from(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, CompletionError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| CompletionError::MissingCredential("OPENAI_API_KEY"))?;
        Ok(Self::new(api_key))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at a compatible non-default endpoint (proxy, Azure, ...).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn request_once(&self, system: &str, user: &str) -> Result<reqwest::Response, CompletionError> {
        self.client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": system},
                    {"role": "user", "content": user},
                ],
                "response_format": {"type": "json_object"},
                "temperature": 0,
                "max_tokens": 4096,
            }))
            .send()
            .await
            .map_err(|e| CompletionError::Service(Box::new(e)))
    }
}

#[async_trait]
impl TextCompletion for OpenAiCompletion {
    async fn complete_json(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        let mut response = self.request_once(system, user).await?;

        if response.status().as_u16() == 429 {
            tracing::warn!("text completion rate limited, retrying once");
            tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
            response = self.request_once(system, user).await?;
            if response.status().as_u16() == 429 {
                return Err(CompletionError::RateLimited);
            }
        }

        let status = response.status();
        if !status.is_success() {
            return Err(CompletionError::Service(
                format!("HTTP {} from completion endpoint", status).into(),
            ));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CompletionError::Service(Box::new(e)))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| CompletionError::Service("completion response had no content".into()))
    }
}

//! Provider capability interface shared by every backend.

use crate::error::LlmResult;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-call generation options. `model: None` uses the backend's default.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the backend for a JSON object when it supports that natively.
    pub json_mode: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            json_mode: false,
        }
    }
}

impl GenerateOptions {
    pub fn json() -> Self {
        Self {
            json_mode: true,
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Text returned by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub content: String,
    /// Name of the provider that produced it.
    pub provider: &'static str,
}

impl LlmResponse {
    pub fn new(content: impl Into<String>, provider: &'static str) -> Self {
        Self {
            content: content.into(),
            provider,
        }
    }

    /// Content with a surrounding ```json (or bare ```) fence removed.
    pub fn json_body(&self) -> &str {
        let content = self.content.trim();
        let (open, skip) = match content.find("```json") {
            Some(i) => (i, 7),
            None => match content.find("```") {
                Some(i) => (i, 3),
                None => return content,
            },
        };
        let rest = &content[open + skip..];
        let end = rest.find("```").unwrap_or(rest.len());
        rest[..end].trim()
    }

    /// Parse the (possibly fenced) content as JSON.
    pub fn parse_json(&self) -> LlmResult<Value> {
        serde_json::from_str(self.json_body()).map_err(|e| {
            tracing::error!(target: "daemon::llm", provider = self.provider, error = %e, "Failed to parse JSON from LLM response");
            e.into()
        })
    }
}

/// A text-generation backend. Implementations are shared as `Arc<dyn LlmProvider>`.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Registry name ("gemini", "claude", "openai", ...).
    fn name(&self) -> &'static str;

    /// True when the backend has what it needs (API key) to accept calls.
    fn is_available(&self) -> bool;

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> LlmResult<LlmResponse>;
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Read a non-empty, trimmed API key from the environment.
pub(crate) fn env_key(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// Turn a non-2xx response into `LlmError::Api`.
pub(crate) async fn check_status(
    provider: &'static str,
    res: reqwest::Response,
) -> LlmResult<reqwest::Response> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    tracing::warn!(target: "daemon::llm", provider, status, "Provider returned an error status");
    Err(crate::error::LlmError::Api {
        provider,
        status,
        body,
    })
}

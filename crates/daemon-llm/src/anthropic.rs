//! Anthropic Messages API backend.

use crate::error::{LlmError, LlmResult};
use crate::provider::{check_status, env_key, http_client, GenerateOptions, LlmProvider, LlmResponse};
use serde::{Deserialize, Serialize};

const NAME: &str = "claude";
const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// `ANTHROPIC_API_KEY` (required), `ANTHROPIC_MODEL`. `None` without a key.
    pub fn from_env() -> Option<Self> {
        let key = env_key("ANTHROPIC_API_KEY")?;
        let mut provider = Self::new(key);
        if let Some(model) = env_key("ANTHROPIC_MODEL") {
            provider = provider.with_model(&model);
        }
        tracing::info!(target: "daemon::llm", provider = NAME, model = %provider.model, "Claude provider initialized");
        Some(provider)
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into().trim().to_string(),
            base_url: ANTHROPIC_API_BASE.to_string(),
            model: ANTHROPIC_DEFAULT_MODEL.to_string(),
            client: http_client(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> LlmResult<LlmResponse> {
        if !self.is_available() {
            return Err(LlmError::NotConfigured(NAME));
        }
        // No native JSON mode; the prompt carries the format contract.
        let body = MessagesRequest {
            model: options.model.as_deref().unwrap_or(&self.model),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let res = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;
        let parsed: MessagesResponse = check_status(NAME, res).await?.json().await?;

        parsed
            .content
            .into_iter()
            .find_map(|b| b.text)
            .filter(|t| !t.trim().is_empty())
            .map(|t| LlmResponse::new(t, NAME))
            .ok_or(LlmError::EmptyResponse(NAME))
    }
}

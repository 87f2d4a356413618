//! OpenAI chat-completions backend.

use crate::error::{LlmError, LlmResult};
use crate::provider::{check_status, env_key, http_client, GenerateOptions, LlmProvider, LlmResponse};
use serde::{Deserialize, Serialize};

const NAME: &str = "openai";
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
const SYSTEM_PROMPT: &str = "You are a helpful assistant that responds with valid JSON.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// `OPENAI_API_KEY` (required), `OPENAI_API_BASE`, `OPENAI_MODEL`. `None` without a key.
    pub fn from_env() -> Option<Self> {
        let key = env_key("OPENAI_API_KEY")?;
        let mut provider = Self::new(key);
        if let Some(base) = env_key("OPENAI_API_BASE") {
            provider = provider.with_base_url(&base);
        }
        if let Some(model) = env_key("OPENAI_MODEL") {
            provider = provider.with_model(&model);
        }
        tracing::info!(target: "daemon::llm", provider = NAME, model = %provider.model, "OpenAI provider initialized");
        Some(provider)
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into().trim().to_string(),
            base_url: OPENAI_API_BASE.to_string(),
            model: OPENAI_DEFAULT_MODEL.to_string(),
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

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
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
        let body = ChatRequest {
            model: options.model.as_deref().unwrap_or(&self.model),
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let parsed: ChatResponse = check_status(NAME, res).await?.json().await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .map(|c| LlmResponse::new(c, NAME))
            .ok_or(LlmError::EmptyResponse(NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body = ChatRequest {
            model: "gpt-4o",
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: "hi",
                },
            ],
            temperature: 0.7,
            max_tokens: 1024,
            response_format: Some(ResponseFormat {
                kind: "json_object",
            }),
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["response_format"]["type"], "json_object");
        assert_eq!(v["messages"][1]["content"], "hi");
        assert_eq!(v["max_tokens"], 1024);
    }

    #[test]
    fn test_empty_key_is_unavailable() {
        assert!(!OpenAiProvider::new("   ").is_available());
        let p = OpenAiProvider::new("sk-test").with_base_url("http://localhost:9/v1/");
        assert!(p.is_available());
        assert_eq!(p.base_url, "http://localhost:9/v1");
        assert_eq!(p.model(), OPENAI_DEFAULT_MODEL);
    }
}

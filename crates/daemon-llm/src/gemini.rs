//! Google Gemini `generateContent` backend.

use crate::error::{LlmError, LlmResult};
use crate::provider::{check_status, env_key, http_client, GenerateOptions, LlmProvider, LlmResponse};
use serde::{Deserialize, Serialize};

const NAME: &str = "gemini";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// `GEMINI_API_KEY` (required), `GEMINI_MODEL`. `None` without a key.
    pub fn from_env() -> Option<Self> {
        let key = env_key("GEMINI_API_KEY")?;
        let mut provider = Self::new(key);
        if let Some(model) = env_key("GEMINI_MODEL") {
            provider = provider.with_model(&model);
        }
        tracing::info!(target: "daemon::llm", provider = NAME, model = %provider.model, "Gemini provider initialized");
        Some(provider)
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into().trim().to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            model: GEMINI_DEFAULT_MODEL.to_string(),
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
impl LlmProvider for GeminiProvider {
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
        let model = options.model.as_deref().unwrap_or(&self.model);
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens,
                response_mime_type: options.json_mode.then_some("application/json"),
            },
        };

        let res = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let parsed: GenerateResponse = check_status(NAME, res).await?.json().await?;

        parsed
            .text()
            .map(|t| LlmResponse::new(t, NAME))
            .ok_or(LlmError::EmptyResponse(NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_generation_config() {
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                max_output_tokens: 1024,
                response_mime_type: None,
            },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(v["contents"][0]["parts"][0]["text"], "hello");
        assert!(v["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"roast\":"},{"text":"\"hey\"}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.text().as_deref(), Some("{\"roast\":\"hey\"}"));

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.text().is_none());
    }
}

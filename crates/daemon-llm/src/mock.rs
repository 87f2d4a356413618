//! In-process backend for tests and offline runs.

use crate::error::{LlmError, LlmResult};
use crate::provider::{GenerateOptions, LlmProvider, LlmResponse};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum MockBehavior {
    Reply(String),
    Fail { status: u16, body: String },
    Unavailable,
}

/// Returns a canned reply (or error) and records every prompt it receives.
#[derive(Debug)]
pub struct MockProvider {
    name: &'static str,
    behavior: MockBehavior,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(reply: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Reply(reply.into()))
    }

    /// Every call fails with an API error.
    pub fn failing(status: u16, body: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Fail {
            status,
            body: body.into(),
        })
    }

    /// Reports itself unavailable; calls fail with `NotConfigured`.
    pub fn unavailable() -> Self {
        Self::with_behavior(MockBehavior::Unavailable)
    }

    /// Register under another name (e.g. to stand in for "gemini" in registry tests).
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            name: "mock",
            behavior,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> bool {
        !matches!(self.behavior, MockBehavior::Unavailable)
    }

    async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> LlmResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        match &self.behavior {
            MockBehavior::Reply(reply) => Ok(LlmResponse::new(reply.clone(), self.name)),
            MockBehavior::Fail { status, body } => Err(LlmError::Api {
                provider: self.name,
                status: *status,
                body: body.clone(),
            }),
            MockBehavior::Unavailable => Err(LlmError::NotConfigured(self.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reply_and_recording() {
        let mock = MockProvider::new("{\"roast\":\"meh\"}");
        let r = mock.generate("prompt one", &GenerateOptions::default()).await.unwrap();
        assert_eq!(r.content, "{\"roast\":\"meh\"}");
        assert_eq!(r.provider, "mock");
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.prompts(), vec!["prompt one".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_and_unavailable() {
        let mock = MockProvider::failing(503, "overloaded").named("gemini");
        match mock.generate("x", &GenerateOptions::default()).await {
            Err(LlmError::Api { provider, status, .. }) => {
                assert_eq!(provider, "gemini");
                assert_eq!(status, 503);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(!MockProvider::unavailable().is_available());
    }
}

//! Ordered provider registry with fallback selection.

use crate::anthropic::AnthropicProvider;
use crate::gemini::GeminiProvider;
use crate::openai::OpenAiProvider;
use crate::provider::LlmProvider;
use std::sync::Arc;

/// Registration order used by `from_env`; also the fallback order.
pub const PROVIDER_ORDER: [&str; 3] = ["gemini", "claude", "openai"];

/// Providers in registration order. Built once at start-up and injected.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every backend whose API key is present, in `PROVIDER_ORDER`.
    pub fn from_env() -> Self {
        let mut registry = Self::new();
        if let Some(p) = GeminiProvider::from_env() {
            registry.register(Arc::new(p));
        }
        if let Some(p) = AnthropicProvider::from_env() {
            registry.register(Arc::new(p));
        }
        if let Some(p) = OpenAiProvider::from_env() {
            registry.register(Arc::new(p));
        }
        if registry.is_empty() {
            tracing::warn!(target: "daemon::llm", "No LLM API keys configured");
        }
        registry
    }

    /// Append a provider. A later registration with an existing name replaces it in place.
    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        match self.providers.iter_mut().find(|p| p.name() == provider.name()) {
            Some(slot) => *slot = provider,
            None => self.providers.push(provider),
        }
    }

    pub fn with(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// The preferred provider if it is registered and available; otherwise, when
    /// `fallback_enabled`, the first available provider in registration order.
    pub fn select(&self, preferred: &str, fallback_enabled: bool) -> Option<Arc<dyn LlmProvider>> {
        let preferred = preferred.trim().to_lowercase();
        if let Some(p) = self.get(&preferred).filter(|p| p.is_available()) {
            tracing::info!(target: "daemon::llm", provider = p.name(), "Using preferred LLM provider");
            return Some(p);
        }
        tracing::warn!(target: "daemon::llm", provider = %preferred, "Primary provider not available");

        if fallback_enabled {
            if let Some(p) = self
                .providers
                .iter()
                .find(|p| p.name() != preferred && p.is_available())
            {
                tracing::info!(target: "daemon::llm", provider = p.name(), "Falling back to LLM provider");
                return Some(Arc::clone(p));
            }
        }

        tracing::error!(target: "daemon::llm", "No LLM providers available");
        None
    }
}

//! Daemon LLM: text-generation backends behind one async capability trait.
//!
//! - **LlmProvider**: `name`, `is_available`, `generate(prompt, options)`.
//! - **Adapters**: Gemini (`generateContent`), Claude (Messages API), OpenAI (chat completions).
//! - **ProviderRegistry**: ordered registration with preferred-then-fallback selection.
//! - **MockProvider**: canned replies for tests and offline runs.

mod anthropic;
mod error;
mod gemini;
mod mock;
mod openai;
mod provider;
mod registry;

pub use anthropic::{AnthropicProvider, ANTHROPIC_DEFAULT_MODEL};
pub use error::{LlmError, LlmResult};
pub use gemini::{GeminiProvider, GEMINI_DEFAULT_MODEL};
pub use mock::MockProvider;
pub use openai::{OpenAiProvider, OPENAI_DEFAULT_MODEL};
pub use provider::{
    GenerateOptions, LlmProvider, LlmResponse, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
pub use registry::{ProviderRegistry, PROVIDER_ORDER};

//! Error types for the feed pipeline.

use thiserror::Error;

/// Result type alias for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Daemon routing unavailable")]
    RoutingUnavailable,

    #[error("LLM error: {0}")]
    Llm(#[from] daemon_llm::LlmError),

    #[error("Persona error: {0}")]
    Persona(#[from] daemon_core::PersonaError),
}

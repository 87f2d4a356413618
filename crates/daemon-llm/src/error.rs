//! Error types for text-generation backends.

use thiserror::Error;

/// Result type alias for provider operations
pub type LlmResult<T> = Result<T, LlmError>;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("{0} provider is not configured")]
    NotConfigured(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} returned an empty response")]
    EmptyResponse(&'static str),

    #[error("Invalid JSON in model response: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

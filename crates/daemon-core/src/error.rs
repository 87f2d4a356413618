//! Error types for the persona boundary (trait ingestion and configuration).
//!
//! The assignment engine itself is total; only ingestion and config loading can fail.

use thiserror::Error;

/// Result type alias for persona operations
pub type PersonaResult<T> = Result<T, PersonaError>;

#[derive(Error, Debug)]
pub enum PersonaError {
    #[error("Unknown trait key: {0}")]
    UnknownTrait(String),

    #[error("Negative value {value} for trait {trait_name}")]
    NegativeTraitValue { trait_name: String, value: i64 },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

//! Error types for Vitrin.

use thiserror::Error;

/// Library-level error type for Vitrin operations.
#[derive(Error, Debug)]
pub enum VitrinError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("LLM backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<reqwest::Error> for VitrinError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            VitrinError::Generation(e.to_string())
        } else {
            VitrinError::BackendUnavailable(e.to_string())
        }
    }
}

/// Result type alias for Vitrin operations.
pub type Result<T> = std::result::Result<T, VitrinError>;

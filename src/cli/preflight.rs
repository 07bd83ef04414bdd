//! Pre-flight checks before starting the assistant.
//!
//! Validates the catalog and backend configuration up front so that problems
//! are reported before the server starts or a question is sent.

use crate::config::{LlmProvider, Settings};
use crate::error::{Result, VitrinError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering questions needs the catalog and a configured backend.
    Ask,
    /// Serving needs the catalog; a missing API key only degrades answers.
    Serve,
    /// Search only needs the catalog.
    Search,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_catalog(settings)?;
    match operation {
        Operation::Ask => check_api_key(settings)?,
        Operation::Serve | Operation::Search => {}
    }
    Ok(())
}

/// Check that the catalog file exists.
pub fn check_catalog(settings: &Settings) -> Result<()> {
    let path = settings.catalog_path();
    if path.is_file() {
        Ok(())
    } else {
        Err(VitrinError::Config(format!(
            "Catalog file not found: {}. Set catalog.path in the config or pass --catalog.",
            path.display()
        )))
    }
}

/// Check that the OpenAI API key is present when the OpenAI backend is selected.
pub fn check_api_key(settings: &Settings) -> Result<()> {
    if settings.llm.provider != LlmProvider::OpenAI || settings.api_key().is_some() {
        return Ok(());
    }
    Err(VitrinError::Config(format!(
        "{} not set. Set it with: export {}='sk-...'",
        settings.llm.api_key_env, settings.llm.api_key_env
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_catalog_fails() {
        let mut settings = Settings::default();
        settings.catalog.path = "/nonexistent/products.csv".to_string();
        assert!(check(Operation::Search, &settings).is_err());
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let settings = Settings::default();
        assert!(check_api_key(&settings).is_ok());
    }

    #[test]
    fn test_openai_without_key_fails() {
        let mut settings = Settings::default();
        settings.llm.provider = LlmProvider::OpenAI;
        settings.llm.api_key_env = "VITRIN_TEST_UNSET_KEY".to_string();
        assert!(check_api_key(&settings).is_err());
    }
}

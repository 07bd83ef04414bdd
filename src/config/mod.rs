//! Configuration module for Vitrin.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::Prompts;
pub use settings::{
    CatalogSettings, ContextFormat, GeneralSettings, LlmProvider, LlmSettings, NoMatchPolicy,
    PromptSettings, RagSettings, RetrievalMode, ServerSettings, Settings,
};

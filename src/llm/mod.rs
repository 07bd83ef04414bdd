//! LLM backends for answer generation.
//!
//! The RAG pipeline only sees the [`ChatBackend`] trait. Which implementation
//! sits behind it is decided once, from configuration, at startup.

mod ollama;
mod openai;

pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use crate::config::{LlmProvider, LlmSettings};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message, used both for stored conversation turns and for
/// the messages sent to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// A stored turn of a conversation.
pub type ConversationTurn = ChatMessage;

/// A message sent to a backend.
pub type PromptMessage = ChatMessage;

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Sampling options for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub stop: Vec<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_output_tokens: 512,
            stop: Vec::new(),
        }
    }
}

impl From<&LlmSettings> for GenerationOptions {
    fn from(settings: &LlmSettings) -> Self {
        Self {
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
            stop: settings.stop.clone(),
        }
    }
}

/// Trait for chat-completion backends.
///
/// Implementations return [`crate::VitrinError::BackendUnavailable`] for
/// transport, auth and quota failures and [`crate::VitrinError::Generation`]
/// when the backend answered with nothing usable.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Generate a reply to `messages`.
    async fn generate(&self, messages: &[ChatMessage], options: &GenerationOptions)
        -> Result<String>;

    /// Short description for logs and diagnostics.
    fn describe(&self) -> String;
}

/// Build an HTTP client with the given request timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| crate::error::VitrinError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Create the configured backend.
///
/// Returns `Ok(None)` when the OpenAI provider is selected but no API key is
/// available; the service then runs in degraded mode.
pub fn build_backend(
    settings: &LlmSettings,
    api_key: Option<String>,
) -> Result<Option<Arc<dyn ChatBackend>>> {
    let timeout = Duration::from_secs(settings.timeout_secs.max(1));

    let backend: Arc<dyn ChatBackend> = match settings.provider {
        LlmProvider::Ollama => Arc::new(OllamaBackend::new(
            &settings.ollama_host,
            &settings.model,
            timeout,
        )?),
        LlmProvider::OpenAI => match api_key {
            Some(key) => Arc::new(OpenAiBackend::new(&key, &settings.model, timeout)?),
            None => {
                warn!(
                    "{} is not set, LLM backend stays uninitialized",
                    settings.api_key_env
                );
                return Ok(None);
            }
        },
    };

    info!("Using LLM backend: {}", backend.describe());
    Ok(Some(backend))
}

//! Configuration settings for Vitrin.

use crate::retrieval::RetrievalStrategy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub catalog: CatalogSettings,
    pub llm: LlmSettings,
    pub rag: RagSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Product catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Path to the catalog CSV file.
    pub path: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: "products.csv".to_string(),
        }
    }
}

/// LLM backend type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// A local Ollama server.
    #[default]
    Ollama,
    /// OpenAI chat completions.
    OpenAI,
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" | "local" => Ok(LlmProvider::Ollama),
            "openai" | "cloud" => Ok(LlmProvider::OpenAI),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Ollama => write!(f, "ollama"),
            LlmProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// LLM backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Backend provider (ollama, openai).
    pub provider: LlmProvider,
    /// Model name passed to the backend.
    pub model: String,
    /// Base URL of the Ollama server.
    pub ollama_host: String,
    /// Environment variable holding the OpenAI API key.
    pub api_key_env: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    /// Stop sequences.
    pub stop: Vec<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Ollama,
            model: "phi3:mini".to_string(),
            ollama_host: "http://127.0.0.1:11434".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.1,
            max_output_tokens: 512,
            stop: Vec::new(),
            timeout_secs: 60,
        }
    }
}

/// Retrieval mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// A single product sharing more than one word with the question.
    #[default]
    Best,
    /// Up to `top_k` products sharing at least one word.
    TopK,
}

/// What to do when retrieval finds nothing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchPolicy {
    /// Send the bare question to the model so it can decline in character.
    #[default]
    AskModel,
    /// Answer with the fixed not-found message without calling the model.
    Refuse,
}

/// Context rendering format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ContextFormat {
    #[default]
    Text,
    Json,
}

/// RAG pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Retrieval mode (best, top_k).
    pub retrieval: RetrievalMode,
    /// Number of products for the top_k mode.
    pub top_k: usize,
    /// Behaviour when no product matches.
    pub on_no_match: NoMatchPolicy,
    /// How retrieved products are rendered into the prompt.
    pub context_format: ContextFormat,
    /// Maximum history messages kept per session.
    pub max_history_messages: usize,
    /// Maximum concurrent web sessions; the least recently used is evicted.
    pub max_sessions: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            retrieval: RetrievalMode::Best,
            top_k: 3,
            on_no_match: NoMatchPolicy::AskModel,
            context_format: ContextFormat::Text,
            max_history_messages: 20,
            max_sessions: 1000,
        }
    }
}

impl RagSettings {
    /// The retrieval strategy these settings describe.
    pub fn strategy(&self) -> RetrievalStrategy {
        match self.retrieval {
            RetrievalMode::Best => RetrievalStrategy::Best,
            RetrievalMode::TopK => RetrievalStrategy::TopK(self.top_k.max(1)),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VitrinError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vitrin")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded catalog path.
    pub fn catalog_path(&self) -> PathBuf {
        Self::expand_path(&self.catalog.path)
    }

    /// Read the OpenAI API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let settings: Settings = toml::from_str(
            r#"
            [llm]
            provider = "openai"
            model = "gpt-4o-mini"

            [rag]
            retrieval = "top_k"
            top_k = 5
            on_no_match = "refuse"
            "#,
        )
        .unwrap();

        assert_eq!(settings.llm.provider, LlmProvider::OpenAI);
        assert_eq!(settings.llm.timeout_secs, 60);
        assert_eq!(settings.rag.strategy(), RetrievalStrategy::TopK(5));
        assert_eq!(settings.rag.on_no_match, NoMatchPolicy::Refuse);
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.rag.max_sessions, 1000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.catalog.path = "~/shop/products.csv".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.catalog.path, "~/shop/products.csv");
        assert_eq!(loaded.rag.strategy(), RetrievalStrategy::Best);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = PathBuf::from("/nonexistent/vitrin/config.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.llm.provider, LlmProvider::Ollama);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("local".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert!("gemini".parse::<LlmProvider>().is_err());
    }
}

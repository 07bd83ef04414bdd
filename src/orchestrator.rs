//! Startup coordination for Vitrin.
//!
//! Loads the catalog, picks the LLM backend and wires them into a RAG engine.

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::error::Result;
use crate::llm::{build_backend, ChatBackend};
use crate::rag::RagEngine;
use crate::server::AppState;
use crate::session::SessionStore;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Owns the loaded catalog and the engine built on top of it.
pub struct Orchestrator {
    settings: Settings,
    catalog: Arc<Catalog>,
    engine: RagEngine,
}

impl Orchestrator {
    /// Load everything described by `settings`.
    ///
    /// A missing catalog is fatal. A missing API key is not: the engine then
    /// answers every question with the not-initialized reply.
    #[instrument(skip(settings))]
    pub fn new(settings: Settings) -> Result<Self> {
        let catalog = Catalog::load(&settings.catalog_path())?;
        if catalog.is_empty() {
            warn!("Catalog is empty, every question will go unmatched");
        }

        let backend = build_backend(&settings.llm, settings.api_key())?;
        Self::with_parts(settings, Arc::new(catalog), backend)
    }

    /// Assemble from an already loaded catalog and backend.
    pub fn with_parts(
        settings: Settings,
        catalog: Arc<Catalog>,
        backend: Option<Arc<dyn ChatBackend>>,
    ) -> Result<Self> {
        let engine = RagEngine::from_settings(&settings, catalog.clone(), backend)?;
        info!(
            "Ready: {} products, strategy {:?}",
            catalog.len(),
            settings.rag.strategy()
        );

        Ok(Self {
            settings,
            catalog,
            engine,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn engine(&self) -> &RagEngine {
        &self.engine
    }

    /// Hand the engine to the HTTP layer together with a fresh session store.
    pub fn into_app_state(self) -> AppState {
        AppState {
            sessions: SessionStore::new(self.settings.rag.max_history_messages)
                .with_max_sessions(self.settings.rag.max_sessions),
            product_count: self.catalog.len(),
            engine: self.engine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmProvider;
    use crate::error::VitrinError;
    use std::io::Write;

    fn settings_for(path: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.catalog.path = path.to_string_lossy().to_string();
        settings.llm.provider = LlmProvider::OpenAI;
        settings.llm.api_key_env = "VITRIN_TEST_UNSET_KEY".to_string();
        settings
    }

    #[test]
    fn test_missing_catalog_is_fatal() {
        let settings = settings_for(std::path::Path::new("/nonexistent/products.csv"));
        let err = Orchestrator::new(settings).err().unwrap();
        assert!(matches!(err, VitrinError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_api_key_degrades() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ProductName,Price,StoreName,Specifications").unwrap();
        writeln!(file, "Galaxy A54,12000000,TechShop,").unwrap();

        let orchestrator = Orchestrator::new(settings_for(file.path())).unwrap();
        assert_eq!(orchestrator.catalog().len(), 1);
        assert!(!orchestrator.engine().has_backend());

        let state = orchestrator.into_app_state();
        assert_eq!(state.product_count, 1);
        let answer = state.engine.answer("قیمت Galaxy A54", &[]).await;
        assert_eq!(answer.kind, crate::rag::AnswerKind::Unavailable);
    }
}

//! RAG response generation.

use super::context::render_context;
use super::prompt::{assemble, is_greeting};
use crate::catalog::Catalog;
use crate::config::{ContextFormat, NoMatchPolicy, Prompts, Settings};
use crate::error::Result;
use crate::llm::{ChatBackend, ChatMessage, GenerationOptions};
use crate::retrieval::{KeywordRetriever, Retriever, ScoredMatch};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// How an answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    /// Canned greeting; no retrieval and no model call.
    Greeting,
    /// Generated by the backend.
    Generated,
    /// Nothing matched and the model was not consulted.
    NotFound,
    /// The backend call failed.
    Apology,
    /// No backend was initialized at startup.
    Unavailable,
}

impl AnswerKind {
    /// Whether the exchange belongs in the conversation history.
    pub fn is_recorded(&self) -> bool {
        matches!(
            self,
            AnswerKind::Greeting | AnswerKind::Generated | AnswerKind::NotFound
        )
    }
}

/// RAG engine for question answering over the product catalog.
pub struct RagEngine {
    retriever: Arc<dyn Retriever>,
    backend: Option<Arc<dyn ChatBackend>>,
    prompts: Prompts,
    options: GenerationOptions,
    context_format: ContextFormat,
    on_no_match: NoMatchPolicy,
}

impl RagEngine {
    /// Create a new RAG engine. A `None` backend puts the engine in degraded mode.
    pub fn new(retriever: Arc<dyn Retriever>, backend: Option<Arc<dyn ChatBackend>>) -> Self {
        Self {
            retriever,
            backend,
            prompts: Prompts::default(),
            options: GenerationOptions::default(),
            context_format: ContextFormat::Text,
            on_no_match: NoMatchPolicy::AskModel,
        }
    }

    /// Build an engine from settings over an already loaded catalog.
    pub fn from_settings(
        settings: &Settings,
        catalog: Arc<Catalog>,
        backend: Option<Arc<dyn ChatBackend>>,
    ) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;
        let retriever = KeywordRetriever::new(catalog).with_strategy(settings.rag.strategy());

        Ok(Self::new(Arc::new(retriever), backend)
            .with_prompts(prompts)
            .with_options(GenerationOptions::from(&settings.llm))
            .with_context_format(settings.rag.context_format)
            .with_no_match_policy(settings.rag.on_no_match))
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set generation options.
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Set how retrieved products are rendered.
    pub fn with_context_format(mut self, format: ContextFormat) -> Self {
        self.context_format = format;
        self
    }

    /// Set the behaviour for questions that match no product.
    pub fn with_no_match_policy(mut self, policy: NoMatchPolicy) -> Self {
        self.on_no_match = policy;
        self
    }

    /// Whether a backend is available.
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Retrieve matches without generating an answer.
    pub fn search(&self, query: &str) -> Vec<ScoredMatch> {
        self.retriever.retrieve(query)
    }

    /// Answer a question given the prior turns of its conversation.
    ///
    /// Never fails: backend errors are logged and turned into the apology reply.
    #[instrument(skip(self, history), fields(question = %question, history = history.len()))]
    pub async fn answer(&self, question: &str, history: &[ChatMessage]) -> RagAnswer {
        info!("Processing question: {}", question);

        if history.is_empty() && is_greeting(question, &self.prompts.greetings) {
            debug!("Greeting short-circuit");
            return RagAnswer::canned(&self.prompts.greeting_reply, AnswerKind::Greeting);
        }

        let Some(backend) = &self.backend else {
            return RagAnswer::canned(&self.prompts.not_initialized, AnswerKind::Unavailable);
        };

        let sources = self.retriever.retrieve(question);

        if sources.is_empty() && self.on_no_match == NoMatchPolicy::Refuse {
            info!("No product matched, refusing without a model call");
            return RagAnswer::canned(&self.prompts.not_found, AnswerKind::NotFound);
        }

        let context_text = render_context(&sources, self.context_format);
        let messages = assemble(question, &context_text, history, &self.prompts.system);

        match backend.generate(&messages, &self.options).await {
            Ok(answer) => {
                debug!("Generated response with {} sources", sources.len());
                RagAnswer {
                    answer,
                    sources,
                    kind: AnswerKind::Generated,
                }
            }
            Err(e) => {
                error!("LLM backend {} failed: {}", backend.describe(), e);
                RagAnswer {
                    answer: self.prompts.apology.clone(),
                    sources,
                    kind: AnswerKind::Apology,
                }
            }
        }
    }
}

/// A RAG answer with the products it was grounded on.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    /// The reply text.
    pub answer: String,
    /// Products placed in the prompt.
    pub sources: Vec<ScoredMatch>,
    /// How the reply was produced.
    pub kind: AnswerKind,
}

impl RagAnswer {
    fn canned(text: &str, kind: AnswerKind) -> Self {
        Self {
            answer: text.to_string(),
            sources: Vec::new(),
            kind,
        }
    }

    /// Format the answer for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!(
                    "\n{} @ {} (score: {})",
                    source.record.name, source.record.store, source.score
                ));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductRecord;
    use crate::error::VitrinError;
    use crate::llm::Role;
    use crate::retrieval::RetrievalStrategy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockBackend {
        reply: std::result::Result<String, String>,
        calls: AtomicUsize,
        last_messages: Mutex<Vec<ChatMessage>>,
    }

    impl MockBackend {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
                last_messages: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err("connection refused".to_string()),
                calls: AtomicUsize::new(0),
                last_messages: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        async fn generate(
            &self,
            messages: &[ChatMessage],
            _options: &GenerationOptions,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_messages.lock().unwrap() = messages.to_vec();
            self.reply
                .clone()
                .map_err(VitrinError::BackendUnavailable)
        }

        fn describe(&self) -> String {
            "mock".to_string()
        }
    }

    struct CountingRetriever {
        inner: KeywordRetriever,
        scans: AtomicUsize,
    }

    impl Retriever for CountingRetriever {
        fn retrieve(&self, query: &str) -> Vec<ScoredMatch> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            self.inner.retrieve(query)
        }
    }

    fn retriever() -> Arc<CountingRetriever> {
        let catalog = Catalog::from_records(vec![ProductRecord::new(
            "Galaxy A54",
            12_000_000,
            "TechShop",
            Some(r#"{"RAM":"8GB"}"#.to_string()),
        )]);
        Arc::new(CountingRetriever {
            inner: KeywordRetriever::new(Arc::new(catalog)),
            scans: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_end_to_end_answer() {
        let retriever = retriever();
        let backend = MockBackend::replying("قیمت Galaxy A54 دوازده میلیون تومان است.");
        let engine = RagEngine::new(retriever.clone(), Some(backend.clone()));

        let answer = engine.answer("قیمت Galaxy A54", &[]).await;

        assert_eq!(answer.kind, AnswerKind::Generated);
        assert_eq!(answer.answer, "قیمت Galaxy A54 دوازده میلیون تومان است.");
        assert_eq!(answer.sources.len(), 1);
        assert!(answer.sources[0].score >= 2);

        let messages = backend.last_messages.lock().unwrap().clone();
        assert_eq!(messages[0].role, Role::System);
        let last = messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        for expected in ["قیمت Galaxy A54", "Galaxy A54", "12,000,000", "TechShop", "RAM: 8GB"] {
            assert!(last.content.contains(expected), "missing {}", expected);
        }
    }

    #[tokio::test]
    async fn test_greeting_short_circuit() {
        let retriever = retriever();
        let backend = MockBackend::replying("unused");
        let engine = RagEngine::new(retriever.clone(), Some(backend.clone()));

        let answer = engine.answer("سلام", &[]).await;

        assert_eq!(answer.kind, AnswerKind::Greeting);
        assert_eq!(answer.answer, Prompts::default().greeting_reply);
        assert_eq!(retriever.scans.load(Ordering::SeqCst), 0);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_greeting_with_history_goes_to_model() {
        let retriever = retriever();
        let backend = MockBackend::replying("سلام دوباره!");
        let engine = RagEngine::new(retriever.clone(), Some(backend.clone()));
        let history = vec![ChatMessage::user("قیمت Galaxy A54"), ChatMessage::assistant("۱۲ میلیون")];

        let answer = engine.answer("سلام", &history).await;

        assert_eq!(answer.kind, AnswerKind::Generated);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.last_messages.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_backend_failure_returns_apology() {
        let engine = RagEngine::new(retriever(), Some(MockBackend::failing()));

        let answer = engine.answer("قیمت Galaxy A54", &[]).await;

        assert_eq!(answer.kind, AnswerKind::Apology);
        assert_eq!(answer.answer, Prompts::default().apology);
        assert!(!answer.kind.is_recorded());
    }

    #[tokio::test]
    async fn test_no_match_asks_model_with_bare_question() {
        let backend = MockBackend::replying("اطلاعاتی پیدا نشد.");
        let engine = RagEngine::new(retriever(), Some(backend.clone()));

        let answer = engine.answer("قیمت لپ‌تاپ ایسوس", &[]).await;

        assert_eq!(answer.kind, AnswerKind::Generated);
        assert!(answer.sources.is_empty());
        let messages = backend.last_messages.lock().unwrap().clone();
        assert_eq!(messages.last().unwrap().content, "قیمت لپ‌تاپ ایسوس");
    }

    #[tokio::test]
    async fn test_no_match_refuse_policy() {
        let backend = MockBackend::replying("unused");
        let engine = RagEngine::new(retriever(), Some(backend.clone()))
            .with_no_match_policy(NoMatchPolicy::Refuse);

        let answer = engine.answer("قیمت لپ‌تاپ ایسوس", &[]).await;

        assert_eq!(answer.kind, AnswerKind::NotFound);
        assert_eq!(answer.answer, Prompts::default().not_found);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_without_backend() {
        let engine = RagEngine::new(retriever(), None);
        assert!(!engine.has_backend());

        let answer = engine.answer("قیمت Galaxy A54", &[]).await;
        assert_eq!(answer.kind, AnswerKind::Unavailable);
        assert_eq!(answer.answer, Prompts::default().not_initialized);

        let greeting = engine.answer("سلام", &[]).await;
        assert_eq!(greeting.kind, AnswerKind::Greeting);
    }

    #[tokio::test]
    async fn test_top_k_strategy_from_settings() {
        let mut settings = Settings::default();
        settings.rag.retrieval = crate::config::RetrievalMode::TopK;
        settings.rag.top_k = 2;

        let catalog = Arc::new(Catalog::from_records(vec![
            ProductRecord::new("Galaxy A54", 1, "TechShop", None),
            ProductRecord::new("Galaxy S23", 2, "TechShop", None),
            ProductRecord::new("Galaxy Tab S9", 3, "TechShop", None),
        ]));
        let engine = RagEngine::from_settings(&settings, catalog, None).unwrap();

        let matches = engine.search("galaxy");
        assert_eq!(matches.len(), 2);
        assert_eq!(settings.rag.strategy(), RetrievalStrategy::TopK(2));
    }
}

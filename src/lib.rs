//! Vitrin - a chat assistant for an electronics storefront
//!
//! Vitrin answers shopper questions about a product catalog loaded from CSV.
//! Each question is matched against the catalog by word overlap, the matching
//! products are rendered into a context block, and a local (Ollama) or cloud
//! (OpenAI) model writes the answer.
//!
//! # Architecture
//!
//! - `catalog` - CSV loading and product records
//! - `retrieval` - Word-overlap scoring and top-k selection
//! - `rag` - Context formatting, prompt assembly and the answer engine
//! - `llm` - Chat backends behind the `ChatBackend` trait
//! - `session` - Per-session conversation history
//! - `server` - HTTP routes for the web chat page
//! - `orchestrator` - Wires settings, catalog and backend together
//!
//! # Example
//!
//! ```rust,no_run
//! use vitrin::config::Settings;
//! use vitrin::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let answer = orchestrator.engine().answer("قیمت Galaxy A54 چنده؟", &[]).await;
//!     println!("{}", answer.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod rag;
pub mod retrieval;
pub mod server;
pub mod session;

pub use error::{Result, VitrinError};

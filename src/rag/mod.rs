//! RAG (Retrieval-Augmented Generation) over the product catalog.
//!
//! Retrieval picks matching products, `context` renders them, `prompt`
//! assembles the model messages and `RagEngine` ties it all to a backend.

pub mod context;
pub mod prompt;
mod response;

pub use context::{format_context, format_context_json, format_price, render_context};
pub use prompt::{assemble, is_greeting};
pub use response::{AnswerKind, RagAnswer, RagEngine};

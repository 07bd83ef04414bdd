//! Prompt assembly.

use crate::llm::{ChatMessage, ConversationTurn, PromptMessage};

/// Heading placed before the product context in the user message.
pub const CONTEXT_HEADING: &str = "[اطلاعات محصولات]";

/// Punctuation stripped from the edges of each word before greeting matching.
const GREETING_PUNCTUATION: &[char] = &['!', '?', '.', ',', '؟', '،', '؛'];

/// Build the message sequence for one question.
///
/// The result is: the system instruction, every history turn in order, then
/// the question. Non-empty context is appended to the question under
/// [`CONTEXT_HEADING`].
pub fn assemble(
    question: &str,
    context_text: &str,
    history: &[ConversationTurn],
    system_instruction: &str,
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_instruction));
    messages.extend(history.iter().cloned());

    let user_content = if context_text.is_empty() {
        question.to_string()
    } else {
        format!("{}\n\n{}\n{}", question, CONTEXT_HEADING, context_text)
    };
    messages.push(ChatMessage::user(user_content));

    messages
}

/// Whether the question consists only of greeting words.
pub fn is_greeting(question: &str, greetings: &[String]) -> bool {
    let lowered = question.to_lowercase();
    let mut words = lowered
        .split_whitespace()
        .map(|w| w.trim_matches(GREETING_PUNCTUATION))
        .filter(|w| !w.is_empty())
        .peekable();

    if words.peek().is_none() {
        return false;
    }
    words.all(|w| greetings.iter().any(|g| g.to_lowercase() == w))
}

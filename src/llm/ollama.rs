//! Local Ollama backend.

use super::{http_client, ChatBackend, ChatMessage, GenerationOptions};
use crate::error::{Result, VitrinError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Backend for a local Ollama server's `/api/chat` endpoint.
pub struct OllamaBackend {
    http: Client,
    base: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: RequestOptions<'a>,
}

#[derive(Serialize)]
struct RequestOptions<'a> {
    temperature: f32,
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl ChatResponse {
    fn into_answer(self) -> Result<String> {
        self.message
            .map(|m| m.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| VitrinError::Generation("Empty response from Ollama".to_string()))
    }
}

impl OllamaBackend {
    /// Create a backend for the server at `host` (e.g. `http://127.0.0.1:11434`).
    pub fn new(host: &str, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base)
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    #[instrument(skip(self, messages, options), fields(model = %self.model, messages = messages.len()))]
    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: RequestOptions {
                temperature: options.temperature,
                num_predict: options.max_output_tokens,
                stop: (!options.stop.is_empty()).then_some(options.stop.as_slice()),
            },
        };

        let resp = self
            .http
            .post(self.chat_url())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let answer = resp.json::<ChatResponse>().await?.into_answer()?;

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    fn describe(&self) -> String {
        format!("ollama ({} @ {})", self.model, self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url_trims_slash() {
        let backend =
            OllamaBackend::new("http://localhost:11434/", "phi3:mini", Duration::from_secs(5))
                .unwrap();
        assert_eq!(backend.chat_url(), "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::system("be brief"), ChatMessage::user("سلام")];
        let stop = vec!["\n".to_string()];
        let body = ChatRequest {
            model: "phi3:mini",
            messages: &messages,
            stream: false,
            options: RequestOptions {
                temperature: 0.5,
                num_predict: 64,
                stop: Some(stop.as_slice()),
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "سلام");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 64);
        assert_eq!(json["options"]["stop"][0], "\n");
    }

    #[test]
    fn test_parse_chat_reply() {
        let raw = r#"{
            "model": "phi3:mini",
            "created_at": "2024-05-01T10:00:00Z",
            "message": {"role": "assistant", "content": " قیمت آن ۱۲ میلیون تومان است. "},
            "done": true,
            "total_duration": 512000000
        }"#;
        let reply: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(reply.into_answer().unwrap(), "قیمت آن ۱۲ میلیون تومان است.");
    }

    #[test]
    fn test_reply_without_message_is_generation_error() {
        let reply: ChatResponse =
            serde_json::from_str(r#"{"model": "phi3:mini", "done": true}"#).unwrap();
        assert!(matches!(reply.into_answer(), Err(VitrinError::Generation(_))));

        let blank: ChatResponse =
            serde_json::from_str(r#"{"message": {"role": "assistant", "content": "  "}}"#).unwrap();
        assert!(matches!(blank.into_answer(), Err(VitrinError::Generation(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_backend_unavailable() {
        let backend =
            OllamaBackend::new("http://127.0.0.1:9", "phi3:mini", Duration::from_secs(2)).unwrap();
        let err = backend
            .generate(&[ChatMessage::user("hi")], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VitrinError::BackendUnavailable(_)));
    }
}

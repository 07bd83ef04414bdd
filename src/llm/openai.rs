//! OpenAI chat-completions backend.

use super::{http_client, ChatBackend, ChatMessage, GenerationOptions, Role};
use crate::error::{Result, VitrinError};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, Stop,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI accepts at most this many stop sequences.
const MAX_STOP_SEQUENCES: usize = 4;

/// Cloud backend using the OpenAI chat-completions API.
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiBackend {
    /// Create a backend with an explicit API key and request timeout.
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config).with_http_client(http_client(timeout)?);

        Ok(Self {
            client,
            model: model.to_string(),
        })
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let built: ChatCompletionRequestMessage = match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| VitrinError::Generation(e.to_string()))?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| VitrinError::Generation(e.to_string()))?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| VitrinError::Generation(e.to_string()))?
            .into(),
    };
    Ok(built)
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    #[instrument(skip(self, messages, options), fields(model = %self.model, messages = messages.len()))]
    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String> {
        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(options.temperature)
            .max_completion_tokens(options.max_output_tokens);
        if !options.stop.is_empty() {
            let stop: Vec<String> = options
                .stop
                .iter()
                .take(MAX_STOP_SEQUENCES)
                .cloned()
                .collect();
            args.stop(Stop::StringArray(stop));
        }
        let request = args
            .build()
            .map_err(|e| VitrinError::Generation(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            VitrinError::BackendUnavailable(format!("OpenAI API error: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| VitrinError::Generation("Empty response from OpenAI".to_string()))?;

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    fn describe(&self) -> String {
        format!("openai ({})", self.model)
    }
}

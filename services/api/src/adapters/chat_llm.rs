//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the chat-completion LLM used by semantic
//! search and personalized suggestions. It implements the `ChatCompletionService`
//! port from the `core` crate against any OpenAI-compatible endpoint.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use course_search_core::ports::{ChatCompletionService, ChatRequest, PortError, PortResult};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatCompletionService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the shared client from an API key and an optional gateway URL.
    pub fn client(api_key: &str, api_base: Option<&str>) -> Client<OpenAIConfig> {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }
        Client::with_config(config)
    }

    fn messages(request: &ChatRequest) -> PortResult<Vec<ChatCompletionRequestMessage>> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.as_str())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            );
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );
        Ok(messages)
    }
}

//=========================================================================================
// `ChatCompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatCompletionService for OpenAiChatAdapter {
    /// Sends the prompt and returns the text content of the first choice.
    async fn complete(&self, request: ChatRequest) -> PortResult<Option<String>> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(Self::messages(&request)?).n(1);
        if let Some(temperature) = request.temperature {
            args.temperature(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            args.max_tokens(max_tokens);
        }
        let chat_request = args
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| PortError::Unavailable(e.to_string()))?;

        // An empty choice list or a choice without text is reported as `None`.
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        debug!(model = %self.model, has_content = content.is_some(), "Chat completion returned");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_put_system_before_user() {
        let request = ChatRequest::new("Find me a course").with_system("Answer in JSON");

        let messages = OpenAiChatAdapter::messages(&request).unwrap();

        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_messages_without_system_prompt() {
        let messages = OpenAiChatAdapter::messages(&ChatRequest::new("Suggest courses")).unwrap();

        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::User(_)));
    }
}

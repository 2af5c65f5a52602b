//! One-shot chat with a language model.

use domain::{AiError, ChatMessage, LlmConfig, ModelName, OpenMap, ProviderName};

use crate::config::Config;
use crate::dto::{ChatMessageInput, ChatOnceInput, ChatOnceOutput};
use crate::error::Result;
use crate::ports::{AiChatPort, ChatRequest};

/// Validates a chat request, calls the model once and returns its answer.
pub struct ChatOnce<C: AiChatPort> {
    chat: C,
    default_temperature: f64,
    default_max_tokens: i64,
}

impl<C: AiChatPort> ChatOnce<C> {
    pub fn new(chat: C, config: &Config) -> Self {
        Self {
            chat,
            default_temperature: config.default_temperature,
            default_max_tokens: config.default_max_tokens,
        }
    }

    /// Runs the use case.
    ///
    /// The first invalid part of the request is returned as a domain error
    /// and the model is not called.
    #[tracing::instrument(skip(self, input), fields(provider = %input.config.provider, model = %input.config.model))]
    pub async fn execute(&self, input: ChatOnceInput) -> Result<ChatOnceOutput> {
        let request = self.build_request(input)?;

        let response = self.chat.chat(request).await?;
        tracing::debug!(
            total_tokens = response.usage.map(|u| u.total_tokens()),
            "chat answered"
        );

        Ok(ChatOnceOutput {
            answer: response.answer,
            usage: response.usage.map(Into::into),
            raw: response.raw,
        })
    }

    fn build_request(&self, input: ChatOnceInput) -> std::result::Result<ChatRequest, AiError> {
        let model = ModelName::create(&input.config.model)?;
        let provider = ProviderName::create(&input.config.provider)?;
        let messages = build_messages(input.messages)?;

        let config = input.config;
        let config = LlmConfig::create(
            provider,
            model,
            config.temperature.unwrap_or(self.default_temperature),
            Some(config.max_tokens.unwrap_or(self.default_max_tokens)),
            config.top_p,
            config.stream,
            OpenMap::from_map(config.extra),
        )?;

        Ok(ChatRequest {
            tenant_id: input.tenant_id,
            project_id: input.project_id,
            messages,
            config,
        })
    }
}

fn build_messages(messages: Vec<ChatMessageInput>) -> std::result::Result<Vec<ChatMessage>, AiError> {
    messages
        .into_iter()
        .map(|m| ChatMessage::create(m.role, m.content, m.metadata.map(OpenMap::from_map)))
        .collect()
}

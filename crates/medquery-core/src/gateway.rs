//! Uniform access to the external inference endpoints.
//!
//! Two kinds of model sit behind one trait: a general-purpose chat model
//! (intent classification, table selection) and a code-generation model
//! (SQL synthesis). The gateway only marshals requests and responses;
//! callers decide what a failure means.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to build completion request: {0}")]
    Request(String),

    #[error("model call failed: {0}")]
    Remote(String),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("model returned an empty response")]
    EmptyResponse,
}

/// Interface to the two external models.
///
/// Injected as `Arc<dyn LlmGateway>` so tests can substitute a scripted
/// fake. No retry logic lives here; callers pick their own fallback.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Chat-style completion at the given sampling temperature.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, GatewayError>;

    /// Completion against the code-generation model.
    async fn generate_code(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GatewayError>;
}

/// Production gateway over OpenAI-compatible endpoints.
///
/// The chat client talks to the hosted chat model; the code client points
/// at the local code model's OpenAI-compatible base URL (e.g. Ollama's
/// `/v1`). Every call is bounded by `timeout`.
pub struct OpenAiGateway {
    chat: Client<OpenAIConfig>,
    chat_model: String,
    code: Client<OpenAIConfig>,
    code_model: String,
    timeout: Duration,
}

impl OpenAiGateway {
    pub fn new(
        chat_config: OpenAIConfig,
        chat_model: impl Into<String>,
        code_config: OpenAIConfig,
        code_model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            chat: Client::with_config(chat_config),
            chat_model: chat_model.into(),
            code: Client::with_config(code_config),
            code_model: code_model.into(),
            timeout,
        }
    }

    fn build_messages(
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Vec<ChatCompletionRequestMessage>, GatewayError> {
        Ok(vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()
                    .map_err(|e| GatewayError::Request(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt)
                    .build()
                    .map_err(|e| GatewayError::Request(e.to_string()))?,
            ),
        ])
    }

    async fn request(
        &self,
        client: &Client<OpenAIConfig>,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
        temperature: Option<f32>,
    ) -> Result<String, GatewayError> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(model)
            .messages(Self::build_messages(system_prompt, user_prompt)?);
        if let Some(t) = temperature {
            builder.temperature(t);
        }
        let request = builder
            .build()
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, client.chat().create(request))
            .await
            .map_err(|_| GatewayError::Timeout(self.timeout))?
            .map_err(|e| GatewayError::Remote(e.to_string()))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or(GatewayError::EmptyResponse)
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        self.request(
            &self.chat,
            &self.chat_model,
            system_prompt,
            user_prompt,
            Some(temperature),
        )
        .await
    }

    async fn generate_code(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GatewayError> {
        self.request(&self.code, &self.code_model, system_prompt, user_prompt, None)
            .await
    }
}

/// Strip a Markdown code fence from model output before parsing.
///
/// Models wrap structured output in ```json / ```sql fences often enough
/// that every parse path runs through this first.
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(stripped) = trimmed.strip_prefix("```") {
        // Language tag, if any, ends at the first newline.
        let body = match stripped.find('\n') {
            Some(idx) => &stripped[idx + 1..],
            None => stripped,
        };
        if let Some(end) = body.rfind("```") {
            return body[..end].trim();
        }
        return body.trim();
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fence_with_language_tag() {
        let fenced = "```json\n{\"intent\": {}}\n```";
        assert_eq!(strip_code_fence(fenced), "{\"intent\": {}}");
    }

    #[test]
    fn strips_bare_fence() {
        let fenced = "```\nSELECT 1;\n```";
        assert_eq!(strip_code_fence(fenced), "SELECT 1;");
    }

    #[test]
    fn leaves_plain_text_alone() {
        let plain = "SELECT * FROM providers;";
        assert_eq!(strip_code_fence(plain), plain);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(strip_code_fence("  \n```sql\nSELECT 1\n```\n "), "SELECT 1");
    }
}

//! Typed boundary around the chat-completion endpoint.
//!
//! The pipeline talks to `CompletionBackend` only; `ChatClient` is the
//! production implementation for the OpenAI-compatible providers. Responses
//! are deserialized into a fixed shape and rejected when a required field
//! is absent, instead of propagating missing data downstream.

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    error::{KonspektError, Result},
    provider::Provider,
};

/// One model call's result: the generated text and its token usage.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A single request/response model invocation.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_content: &str) -> Result<Completion>;
}

pub struct ChatClient {
    client: reqwest::Client,
    provider: Provider,
    api_key: String,
}

impl ChatClient {
    /// Build a client for the given provider. Fails when the provider's API
    /// key environment variable is not set.
    pub fn new(provider: Provider) -> Result<Self> {
        let api_key = provider.validate_api_key()?;
        Ok(Self {
            client: reqwest::Client::new(),
            provider,
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: ChatUsage,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[async_trait]
impl CompletionBackend for ChatClient {
    async fn complete(&self, system_prompt: &str, user_content: &str) -> Result<Completion> {
        let config = self.provider.config();

        let response = self
            .client
            .post(config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": config.model,
                "messages": [
                    {
                        "role": "system",
                        "content": system_prompt,
                    },
                    {
                        "role": "user",
                        "content": user_content,
                    },
                ],
                "temperature": 0.2,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, provider = self.provider.name(), "completion request rejected");
            return Err(KonspektError::CompletionFailed {
                reason: format!("{status}: {body}"),
            });
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|err| KonspektError::MalformedResponse {
                    reason: err.to_string(),
                })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| KonspektError::MalformedResponse {
                reason: "response carried no choices".to_string(),
            })?;

        Ok(Completion {
            text: choice.message.content,
            input_tokens: parsed.usage.prompt_tokens,
            output_tokens: parsed.usage.completion_tokens,
        })
    }
}

//! HTTP client for an Anthropic-style Messages API.
//!
//! The one completion surface both capability adapters share: system prompt
//! plus a single user message in, concatenated text blocks out.

use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use crate::domain::errors::CapabilityError;
use crate::domain::models::CompletionConfig;

/// Message role in the Messages API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Caller turn.
    User,
    /// Model turn.
    Assistant,
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Author role.
    pub role: MessageRole,
    /// Message text.
    pub content: String,
}

/// Request body for the Messages API.
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    /// Model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Conversation, a single user message here.
    pub messages: Vec<Message>,
}

/// Content block in a response.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Plain text block.
    #[serde(rename = "text")]
    Text {
        /// The text payload.
        text: String,
    },
    /// Any block shape this adapter does not consume.
    #[serde(other)]
    Other,
}

/// Response body from the Messages API.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    /// Content blocks.
    pub content: Vec<ContentBlock>,
    /// Why generation stopped.
    pub stop_reason: Option<String>,
}

/// Completion client over the Messages API.
pub struct CompletionClient {
    config: CompletionConfig,
    client: Client,
}

impl CompletionClient {
    /// Build a client from completion settings.
    pub fn new(config: CompletionConfig) -> Result<Self, CapabilityError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                CapabilityError::Transport(format!("failed to create HTTP client: {e}"))
            })?;
        Ok(Self { config, client })
    }

    /// Completion settings this client was built with.
    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// API key from config or environment.
    fn api_key(&self) -> Result<String, CapabilityError> {
        self.config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                CapabilityError::Transport(
                    "no API key configured and ANTHROPIC_API_KEY not set".to_string(),
                )
            })
    }

    /// Run one completion and return the concatenated text blocks.
    pub async fn complete(
        &self,
        model: &str,
        system: Option<&str>,
        prompt: &str,
    ) -> Result<String, CapabilityError> {
        let api_key = self.api_key()?;

        let request = MessagesRequest {
            model: model.to_string(),
            max_tokens: self.config.max_tokens,
            system: system.map(ToString::to_string),
            messages: vec![Message {
                role: MessageRole::User,
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&request)
            .send()
            .await
            .map_err(|e| CapabilityError::Transport(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            return Err(CapabilityError::Transport(format!(
                "API error {status}: {excerpt}"
            )));
        }

        let result: MessagesResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::InvalidResponse(format!("malformed body: {e}")))?;

        let text = result
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            return Err(CapabilityError::InvalidResponse(
                "response contained no text content".to_string(),
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(server_url: &str) -> CompletionConfig {
        CompletionConfig {
            base_url: server_url.to_string(),
            api_key: Some("test-key".to_string()),
            ..CompletionConfig::default()
        }
    }

    #[tokio::test]
    async fn complete_extracts_text_blocks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"content":[{"type":"text","text":"hello"},{"type":"text","text":"world"}],"stop_reason":"end_turn"}"#,
            )
            .create_async()
            .await;

        let client = CompletionClient::new(config_for(&server.url())).unwrap();
        let text = client.complete("model-x", None, "hi").await.unwrap();
        assert_eq!(text, "hello\nworld");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_error_maps_to_transport() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(429)
            .with_body(r#"{"error":{"type":"rate_limit_error"}}"#)
            .create_async()
            .await;

        let client = CompletionClient::new(config_for(&server.url())).unwrap();
        let err = client.complete("model-x", None, "hi").await.unwrap_err();
        assert!(matches!(err, CapabilityError::Transport(_)));
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn empty_content_is_an_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"content":[],"stop_reason":"end_turn"}"#)
            .create_async()
            .await;

        let client = CompletionClient::new(config_for(&server.url())).unwrap();
        let err = client.complete("model-x", None, "hi").await.unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidResponse(_)));
    }
}

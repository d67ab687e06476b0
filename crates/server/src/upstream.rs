use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::UpstreamSettings;

const SYSTEM_PROMPT: &str =
    "You are a wise, warm and grounded tarot reader. You answer in flowing prose.";

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("upstream payload could not be parsed: {0}")]
    Malformed(String),
    #[error("upstream returned no text")]
    Empty,
}

/// The external text generator. Implementations are called once per
/// interpretation; retries are not expected.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, credential: &str, prompt: &str) -> Result<String, GeneratorError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Talks to an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct ChatCompletionsGenerator {
    client: Client,
    url: String,
    model: String,
    max_tokens: u32,
}

impl ChatCompletionsGenerator {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, GeneratorError> {
        let client = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self {
            client,
            url: settings.url.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
        })
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsGenerator {
    async fn generate(&self, credential: &str, prompt: &str) -> Result<String, GeneratorError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GeneratorError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let parsed: ChatCompletionResponse = serde_json::from_slice(&bytes)
            .map_err(|err| GeneratorError::Malformed(err.to_string()))?;

        extract_text(parsed)
    }
}

fn extract_text(response: ChatCompletionResponse) -> Result<String, GeneratorError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(GeneratorError::Empty)
}

#[cfg(test)]
#[path = "tests/upstream_tests.rs"]
mod tests;

//! Completion service client
//!
//! Thin wrapper around an OpenAI-compatible chat-completions endpoint
//! (Groq). Only the text of the first choice is exposed; callers own
//! prompt construction and response parsing.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::{CompletionConfig, COMPLETION_API_KEY_ENV};
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct CompletionClient {
    http: Client,
    api_key: SecretString,
    config: CompletionConfig,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig, api_key: SecretString) -> Self {
        Self {
            http: Client::new(),
            api_key,
            config,
        }
    }

    /// Build a client with the key from `GROQ_API_KEY`.
    pub fn from_env(config: CompletionConfig) -> Result<Self> {
        let key = std::env::var(COMPLETION_API_KEY_ENV).map_err(|_| {
            Error::Config(format!(
                "Environment variable {} not set",
                COMPLETION_API_KEY_ENV
            ))
        })?;
        Ok(Self::new(config, SecretString::from(key)))
    }

    /// Send a chat completion request and return the first choice's text.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Completion(format!(
                "Completion request failed with {}: {}",
                status, body
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Completion(format!("Malformed completion response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Completion("Completion response had no choices".to_string()))
    }
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("endpoint", &self.config.endpoint)
            .field("model", &self.config.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

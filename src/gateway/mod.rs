//! Text completion through an OpenAI-compatible chat completions API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{config::GatewayConfig, models::chat::Sender};

/// Instruction sent ahead of every prompt.
pub const SYSTEM_PROMPT: &str = "i want you to act as an AI assistant helping in writing and summarizing notes, nothing else! only answer to user's query that are based on notes and avoid any other conversation. if user ask to write a note, make the note short and in less than 500 chars";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("AI gateway responded with status {status}")]
    Api {
        status: u16,
        /// Human readable reason reported by the API, if any.
        message: Option<String>,
    },

    #[error("Request to AI gateway failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("AI gateway returned no completion")]
    EmptyResponse,
}

impl GatewayError {
    /// The reason worth showing to a user, when the API gave one.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

#[async_trait]
pub trait AiGateway: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct OpenRouterGateway {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenRouterGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let url = if config.base_url.ends_with("/chat/completions") {
            config.base_url.clone()
        } else {
            format!("{}/chat/completions", config.base_url.trim_end_matches('/'))
        };

        Ok(Self {
            client: builder.build()?,
            url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl AiGateway for OpenRouterGateway {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![
                CompletionMessage {
                    role: Sender::SystemDeveloper.role(),
                    content: SYSTEM_PROMPT,
                },
                CompletionMessage {
                    role: Sender::User.role(),
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error.message);
            tracing::error!("AI gateway returned {}: {}", status, body);
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GatewayError::EmptyResponse)
    }
}

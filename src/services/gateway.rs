//! Client for the AI gateway's OpenAI-compatible chat-completion endpoint.
//!
//! One call per analysis: the system and user prompts are the entire
//! message history, and there is no retry.

use anyhow::Context;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument};
use url::Url;

use crate::error::ApiError;
use crate::services::prompts::PromptPair;

pub const COMPLETIONS_PATH: &str = "v1/chat/completions";
pub const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("AI gateway API key is not configured")]
    MissingApiKey,

    #[error("AI gateway rate limit exceeded")]
    RateLimited,

    #[error("AI gateway credits exhausted")]
    QuotaExceeded,

    #[error("AI gateway returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("AI gateway request failed")]
    Transport(#[source] reqwest::Error),

    #[error("AI gateway reply could not be read")]
    InvalidReply(#[source] reqwest::Error),
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::MissingApiKey => ApiError::ServiceUnavailable(err.to_string()),
            GatewayError::RateLimited => ApiError::RateLimited,
            GatewayError::QuotaExceeded => ApiError::QuotaExceeded,
            other => ApiError::Upstream(anyhow::Error::new(other)),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Client for the AI gateway.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: Option<SecretString>,
}

impl GatewayClient {
    pub fn new(
        client: Client,
        base_url: &Url,
        model: &str,
        api_key: Option<SecretString>,
    ) -> anyhow::Result<Self> {
        let endpoint = base_url
            .join(COMPLETIONS_PATH)
            .context("Failed to build AI gateway endpoint")?;

        tracing::info!(endpoint = %endpoint, model = model, "AI gateway client initialized");

        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
            api_key,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fail fast when no API key is configured, before any other work.
    pub fn ensure_configured(&self) -> Result<(), GatewayError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(GatewayError::MissingApiKey)
        }
    }

    /// Send the prompt pair and return the completion text.
    ///
    /// A reply without `choices[0].message.content` yields an empty string;
    /// the decoder turns that into the fallback record.
    #[instrument(skip(self, prompts), fields(model = %self.model))]
    pub async fn complete(
        &self,
        prompts: &PromptPair,
        request_id: Option<&str>,
    ) -> Result<String, GatewayError> {
        let api_key = self.api_key.as_ref().ok_or(GatewayError::MissingApiKey)?;

        let body = CompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompts.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompts.user,
                },
            ],
            temperature: TEMPERATURE,
        };

        let mut req = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key.expose_secret())
            .json(&body);

        if let Some(rid) = request_id {
            req = req.header("x-request-id", rid);
        }

        debug!(url = %self.endpoint, "AI gateway request");

        let response = req.send().await.map_err(GatewayError::Transport)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "AI gateway error");

            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => GatewayError::RateLimited,
                StatusCode::PAYMENT_REQUIRED => GatewayError::QuotaExceeded,
                _ => GatewayError::Status { status, body },
            });
        }

        let reply: CompletionResponse = response.json().await.map_err(GatewayError::InvalidReply)?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();

        debug!(length = content.len(), "AI gateway reply received");

        Ok(content)
    }
}

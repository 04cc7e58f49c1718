/// LLM Client: the single point of entry for all Claude API calls in the analyzer.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All LLM interactions MUST go through this module.
///
/// Calls made here are single-shot. Every failure is classified exactly once, at
/// this boundary, into a transient kind or a permanent error; retrying belongs to
/// [`retry::with_backoff`].
///
/// Model: claude-sonnet-4-5 (hardcoded, not configurable)
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::retry::{TransientFailure, TransientKind};

pub mod prompts;
pub mod retry;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{kind} (status {status:?}): {message}")]
    Transient {
        kind: TransientKind,
        status: Option<u16>,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode LLM response: {0}")]
    Decode(String),
}

impl TransientFailure for LlmError {
    fn transient_kind(&self) -> Option<TransientKind> {
        match self {
            LlmError::Transient { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Maps an HTTP status to a transient kind. `None` means the status is either
/// a success or a permanent failure.
pub fn classify_status(status: StatusCode) -> Option<TransientKind> {
    match status.as_u16() {
        429 => Some(TransientKind::RateLimited),
        500 | 502 | 503 | 529 => Some(TransientKind::Unavailable),
        408 | 504 => Some(TransientKind::DeadlineExceeded),
        _ => None,
    }
}

fn classify_transport(err: reqwest::Error) -> LlmError {
    let kind = if err.is_timeout() {
        Some(TransientKind::DeadlineExceeded)
    } else if err.is_connect() {
        Some(TransientKind::Unavailable)
    } else {
        None
    };

    match kind {
        Some(kind) => LlmError::Transient {
            kind,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        },
        None if err.is_decode() => LlmError::Decode(err.to_string()),
        None => LlmError::Http(err),
    }
}

/// The text-generation primitive the analysis stages depend on.
///
/// Carried as `Arc<dyn TextGenerator>` so tests can script responses and
/// failures without a network.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends one prompt and returns the model's text payload.
    async fn generate(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The single LLM client used by both analysis stages.
/// Wraps the Anthropic Messages API; constructed once at startup.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, api_key })
    }

    /// Makes one call to the Claude API, returning the full response object.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            return Err(match classify_status(status) {
                Some(kind) => {
                    warn!("LLM API returned {}: {}", status, message);
                    LlmError::Transient {
                        kind,
                        status: Some(status.as_u16()),
                        message,
                    }
                }
                None => LlmError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let llm_response: LlmResponse = response.json().await.map_err(classify_transport)?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, system).await?;
        // An empty payload is a successful call; the caller's JSON parse rejects it.
        Ok(response.text().unwrap_or_default().to_string())
    }
}

/// Removes every ```json / ``` fence marker the model may wrap around its JSON,
/// along with surrounding whitespace.
pub fn strip_json_fences(text: &str) -> String {
    text.trim()
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Cleans an LLM text payload and parses it as JSON.
pub fn parse_json_response(text: &str) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::from_str(&strip_json_fences(text))
}

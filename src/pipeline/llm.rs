//! Chat-completion client: one user message in, generated text out.
//!
//! All failure modes are classified into [`CompletionError`] variants; the
//! caller never sees a raw `reqwest` or `serde_json` error. Refusals that do
//! not need the network (blank prompt, missing credential) are decided
//! before a request is built.
//!
//! There is no retry. One call is one attempt.

use crate::config::AnalysisConfig;
use crate::error::CompletionError;
use crate::output::CompletionOutcome;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Detail of the configuration error raised when no credential is set.
pub const MISSING_KEY_DETAIL: &str = "provider API key is missing or blank";

/// Anything that can turn a prompt into generated text.
///
/// The orchestrator holds an `Arc<dyn CompletionClient>`, so tests and
/// alternative providers can stand in for [`ChatCompletionClient`].
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<CompletionOutcome, CompletionError>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// Generation parameters sent with every request.
#[derive(Clone)]
pub struct CompletionSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub top_p: f32,
    pub timeout: Duration,
}

impl std::fmt::Debug for CompletionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSettings")
            .field("api_url", &self.api_url)
            .field(
                "api_key",
                &self.api_key.as_deref().map(crate::config::mask_credential),
            )
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("top_p", &self.top_p)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl From<&AnalysisConfig> for CompletionSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }
}

/// OpenAI-compatible `/chat/completions` client over `reqwest`.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    client: reqwest::Client,
    settings: CompletionSettings,
}

impl ChatCompletionClient {
    pub fn new(client: reqwest::Client, settings: CompletionSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    /// The JSON body sent for `prompt`.
    pub fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            top_p: self.settings.top_p,
            stream: false,
            stop: None,
        }
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<CompletionOutcome, CompletionError> {
        if prompt.trim().is_empty() {
            return Err(CompletionError::EmptyPrompt);
        }
        let api_key = match self.settings.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(CompletionError::Configuration {
                    detail: MISSING_KEY_DETAIL.into(),
                })
            }
        };

        let response = self
            .client
            .post(&self.settings.api_url)
            .bearer_auth(api_key)
            .timeout(self.settings.timeout)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| CompletionError::Transport {
                message: describe_transport_error(&e, self.settings.timeout),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            return Err(CompletionError::Provider {
                http_status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::Transport {
                message: describe_transport_error(&e, self.settings.timeout),
            })?;
        parse_completion(&body)
    }

    fn model(&self) -> &str {
        &self.settings.model
    }
}

/// Extract `choices[0].message.content` from a chat-completion body.
pub fn parse_completion(body: &str) -> Result<CompletionOutcome, CompletionError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::MalformedResponse {
            detail: e.to_string(),
        })?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::MalformedResponse {
            detail: "`choices` is empty".into(),
        })?;

    Ok(CompletionOutcome {
        content: choice.message.content,
    })
}

/// Body of a non-2xx answer, or a note saying why it could not be read.
async fn read_error_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(e) => format!("<failed to read response body: {e}>"),
    }
}

fn describe_transport_error(e: &reqwest::Error, timeout: Duration) -> String {
    if e.is_timeout() {
        format!("timed out after {}s", timeout.as_secs())
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

/// Request body for `/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: usize,
    pub top_p: f32,
    pub stream: bool,
    pub stop: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

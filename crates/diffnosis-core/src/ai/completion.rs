use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ai::transport::Transport;
use crate::config::{RelaySettings, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::error::RelayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One element of the outbound `messages` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionResponseMessage,
}

#[derive(Deserialize)]
struct CompletionResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

/// Outcome of one completion call. Failures carry only a coarse reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionResult {
    Success(String),
    Failure(String),
}

/// Turns a prompt into a completion. The relay session only sees this trait.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Resolves exactly once, to either a success or a failure.
    async fn complete(&self, prompt: &str) -> CompletionResult;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl From<&RelaySettings> for CompletionOptions {
    fn from(settings: &RelaySettings) -> Self {
        Self {
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

/// Chat-completions client: one user message in, one string out.
pub struct CompletionClient<T> {
    transport: T,
    options: CompletionOptions,
}

impl<T: Transport> CompletionClient<T> {
    pub fn new(transport: T, options: CompletionOptions) -> Self {
        Self { transport, options }
    }

    pub fn build_request(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.options.model.clone(),
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: prompt.to_string(),
            }],
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        }
    }

    /// Like [`Completer::complete`] but keeps the error detail.
    pub async fn query(&self, prompt: &str) -> Result<String, RelayError> {
        let request = self.build_request(prompt);
        debug!(model = %request.model, prompt_chars = prompt.chars().count(), "Sending completion request");

        let body = self.transport.send(&request).await?;
        parse_completion(&body)
    }
}

#[async_trait]
impl<T: Transport> Completer for CompletionClient<T> {
    async fn complete(&self, prompt: &str) -> CompletionResult {
        match self.query(prompt).await {
            Ok(content) => CompletionResult::Success(content),
            Err(e) => {
                warn!("Completion failed: {e}");
                CompletionResult::Failure(e.failure_reason().to_string())
            }
        }
    }
}

/// Pull `choices[0].message.content` out of a response body.
pub fn parse_completion(body: &str) -> Result<String, RelayError> {
    let response: CompletionResponse = serde_json::from_str(body).map_err(|e| {
        debug!("Raw response: {body}");
        RelayError::malformed(format!("unexpected JSON: {e}"))
    })?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| RelayError::malformed("response has no choices"))
}

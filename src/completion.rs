use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One chat-completion call: model, ordered messages and sampling limits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Content of the first message with the given role, if any.
    pub fn message(&self, role: Role) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }
}

/// Text-completion boundary. Everything semantic happens behind this call.
pub trait CompletionClient {
    /// Send the request and return the first generated message's text.
    fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

impl<C: CompletionClient + ?Sized> CompletionClient for &C {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        (**self).complete(request)
    }
}

impl<C: CompletionClient + ?Sized> CompletionClient for Box<C> {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        (**self).complete(request)
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible chat completions over HTTP
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
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

pub struct OpenAiClient {
    endpoint: String,
    api_key: String,
    agent: ureq::Agent,
}

impl OpenAiClient {
    pub fn new(api_base: &str, api_key: String, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint: chat_endpoint(api_base),
            api_key,
            agent,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        debug!(
            model = %request.model,
            max_tokens = request.max_tokens,
            "sending completion request"
        );

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Content-Type", "application/json")
            .send_json(request)
            .map_err(describe_http_error)?;

        let body: ChatCompletionResponse = response
            .into_json()
            .map_err(|e| Error::Completion(format!("failed to parse completion response: {e}")))?;

        first_choice_text(body)
    }
}

fn chat_endpoint(api_base: &str) -> String {
    format!("{}/chat/completions", api_base.trim_end_matches('/'))
}

fn first_choice_text(body: ChatCompletionResponse) -> Result<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::Completion("completion response has no message content".to_string()))
}

fn describe_http_error(err: ureq::Error) -> Error {
    match err {
        ureq::Error::Status(code, response) => {
            let detail = response
                .into_json::<serde_json::Value>()
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| "no error detail".to_string());
            Error::Completion(format!("completion API returned {code}: {detail}"))
        }
        ureq::Error::Transport(t) => Error::Completion(format!("completion request failed: {t}")),
    }
}

use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::completion::{ChatMessage, CompletionClient, CompletionRequest};
use crate::config::Config;
use crate::error::Result;
use crate::prompts::PromptEngine;

/// Static rate-limit policy: a fixed pause after each call, a longer one after failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    pub delay: Duration,
    pub error_delay: Duration,
}

impl Throttle {
    pub const fn none() -> Self {
        Self {
            delay: Duration::ZERO,
            error_delay: Duration::ZERO,
        }
    }

    pub fn pause(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }

    pub fn back_off(&self) {
        if !self.error_delay.is_zero() {
            thread::sleep(self.error_delay);
        }
    }
}

/// Sampling limits for one kind of call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Everything a run needs to talk to the model, built once per invocation.
pub struct Session<C> {
    client: C,
    prompts: PromptEngine,
    model: String,
    throttle: Throttle,
}

impl<C: CompletionClient> Session<C> {
    pub fn new(
        client: C,
        prompts: PromptEngine,
        model: impl Into<String>,
        throttle: Throttle,
    ) -> Self {
        Self {
            client,
            prompts,
            model: model.into(),
            throttle,
        }
    }

    pub fn from_config(client: C, config: &Config) -> Self {
        let prompts = PromptEngine::new(config.prompts_dir.as_ref().map(Into::into));
        let throttle = Throttle {
            delay: config.request_delay,
            error_delay: config.error_delay,
        };
        Self::new(client, prompts, config.model.clone(), throttle)
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Render `{prefix}-system` and `{prefix}-user` and send them as one request.
    pub fn ask<S: Serialize>(&self, prefix: &str, ctx: S, sampling: Sampling) -> Result<String> {
        let system = self.prompts.render(&format!("{prefix}-system"), &ctx)?;
        let user = self.prompts.render(&format!("{prefix}-user"), &ctx)?;
        self.send(
            vec![ChatMessage::system(system), ChatMessage::user(user)],
            sampling,
        )
    }

    /// Render a single template and send it as the only (user) message.
    pub fn ask_user<S: Serialize>(&self, name: &str, ctx: S, sampling: Sampling) -> Result<String> {
        let user = self.prompts.render(name, &ctx)?;
        self.send(vec![ChatMessage::user(user)], sampling)
    }

    fn send(&self, messages: Vec<ChatMessage>, sampling: Sampling) -> Result<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        };
        self.client.complete(&request)
    }
}

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::completion::{CompletionClient, CompletionRequest};
use crate::error::{Error, Result};

type Handler = Box<dyn Fn(&CompletionRequest) -> Result<String>>;

/// Completion client that replays scripted replies and records every request.
pub struct StubClient {
    replies: RefCell<VecDeque<Result<String>>>,
    handler: Option<Handler>,
    calls: RefCell<Vec<CompletionRequest>>,
}

impl StubClient {
    /// Reply with each string in order, then fail.
    pub fn replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_results(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    pub fn from_results(results: Vec<Result<String>>) -> Self {
        Self {
            replies: RefCell::new(results.into()),
            handler: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Answer every request with `handler`.
    pub fn with_handler(handler: impl Fn(&CompletionRequest) -> Result<String> + 'static) -> Self {
        Self {
            replies: RefCell::new(VecDeque::new()),
            handler: Some(Box::new(handler)),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::with_handler(|_| Err(Error::Completion("connection refused".to_string())))
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.borrow().clone()
    }
}

impl CompletionClient for StubClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.calls.borrow_mut().push(request.clone());
        if let Some(ref handler) = self.handler {
            return handler(request);
        }
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Completion("no more stub replies".to_string())))
    }
}

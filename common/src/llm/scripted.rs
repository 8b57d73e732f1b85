//! In-process completion client that replays queued responses.

use crate::error::{Result, SciSciError};
use crate::llm::model::{CompletionClient, CompletionRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_ok(self, response: impl Into<String>) -> Self {
        self.push(Ok(response.into()));
        self
    }

    pub fn then_err(self, error: SciSciError) -> Self {
        self.push(Err(error));
        self
    }

    pub fn push(&self, response: Result<String>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    /// every request received so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        self.responses
            .lock()
            .map_err(|_| SciSciError::Completion("scripted client poisoned".to_string()))?
            .pop_front()
            .unwrap_or_else(|| Err(SciSciError::Completion("no scripted response left".to_string())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

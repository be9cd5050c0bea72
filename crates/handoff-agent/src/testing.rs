// ABOUTME: Test utilities for handoff-agent: a stub client and a scripted client.
// ABOUTME: Used to drive the swarm loop deterministically without real API calls.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::runtime::{CompletionError, GenerateRequest, GenerateResponse, LlmClient};

/// A stub LLM client that always returns a pre-configured text response.
///
/// The response has no tool calls, so a run using it ends after one turn.
#[derive(Debug, Clone)]
pub struct StubLlmClient {
    response_text: String,
}

impl StubLlmClient {
    /// Create a stub client that always returns the given text.
    pub fn new(response_text: &str) -> Self {
        Self {
            response_text: response_text.to_owned(),
        }
    }

    /// Create a stub client that returns "Done."
    pub fn done() -> Self {
        Self::new("Done.")
    }
}

#[async_trait]
impl LlmClient for StubLlmClient {
    async fn generate(&self, _request: &GenerateRequest) -> Result<GenerateResponse, CompletionError> {
        Ok(GenerateResponse::text(&self.response_text))
    }

    fn provider_name(&self) -> &str {
        "stub"
    }

    fn model_name(&self) -> &str {
        "stub-model"
    }
}

/// A client that replays queued responses in order and records every
/// request it receives. An exhausted script answers with a provider error.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<GenerateResponse>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<GenerateResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue another response.
    pub fn push(&self, response: GenerateResponse) {
        self.lock_responses().push_back(response);
    }

    /// Every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lock_responses().len()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<GenerateResponse>> {
        self.responses.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, CompletionError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());
        self.lock_responses()
            .pop_front()
            .ok_or_else(|| CompletionError::Provider("scripted client has no responses left".to_string()))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

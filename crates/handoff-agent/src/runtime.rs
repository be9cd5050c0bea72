// ABOUTME: Defines the LlmClient trait every model provider adapter implements.
// ABOUTME: Also defines the provider-agnostic request/response shapes and CompletionError.

use async_trait::async_trait;
use serde::Serialize;

use handoff_core::{Message, ToolCall, ToolChoice, ToolDefinition};

/// One model call: everything a provider needs to produce a single step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: ToolChoice,
    pub max_steps: u32,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub parallel_tool_calls: Option<bool>,
}

/// What the model produced for one call: optional text and zero or more
/// tool calls. Tools are not executed by the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
}

impl GenerateResponse {
    /// A plain text answer with no tool calls.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
            finish_reason: Some("stop".to_string()),
        }
    }

    /// A response requesting the given tool calls.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            text: None,
            tool_calls: calls,
            finish_reason: Some("tool_calls".to_string()),
        }
    }

    /// Add one tool call to the response.
    pub fn with_tool_call(mut self, call: ToolCall) -> Self {
        self.tool_calls.push(call);
        self.finish_reason = Some("tool_calls".to_string());
        self
    }
}

/// Errors from the model boundary. These are never recovered inside a run.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

/// Trait that all LLM provider adapters must implement. Each provider
/// translates a GenerateRequest into its own API and parses the reply.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Perform exactly one model call.
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, CompletionError>;

    /// Provider name for logging and display (e.g. "openai").
    fn provider_name(&self) -> &str;

    /// Model used when neither the agent nor the run names one.
    fn model_name(&self) -> &str;
}

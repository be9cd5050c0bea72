// ABOUTME: Wiring-time configuration errors for agents, tools, and the handoff graph.
// ABOUTME: Every variant is fatal and raised before any orchestration run starts.

use thiserror::Error;

/// Errors raised while constructing agents, normalizing tool sets, or wiring
/// the handoff graph. None of these are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid agent id '{0}': must be non-empty and match [a-zA-Z0-9_]")]
    InvalidAgentId(String),

    #[error("invalid tool name '{0}': must be 1-64 characters of [a-zA-Z0-9_-]")]
    InvalidToolName(String),

    #[error("agent '{agent}' declares tool '{name}' more than once")]
    DuplicateTool { agent: String, name: String },

    #[error("agent '{0}' is registered more than once")]
    DuplicateAgent(String),

    #[error("unknown agent '{0}'")]
    UnknownAgent(String),
}

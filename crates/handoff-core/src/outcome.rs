// ABOUTME: Per-turn and per-run outcome types produced by the orchestration loop.
// ABOUTME: RunOutcome keeps normal completion, turn-limit exhaustion and stall aborts distinguishable.

use std::sync::Arc;

use serde::Serialize;

use crate::agent::{Agent, AgentId};
use crate::context::ContextVariables;
use crate::message::Message;

/// What one turn produced, folded into the run state immediately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    pub messages: Vec<Message>,
    /// Set only when the turn requested a handoff.
    pub next_agent: Option<AgentId>,
    pub context_variables: ContextVariables,
}

/// How a run terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The active agent answered without calling tools, called a terminal
    /// tool, or tool execution was disabled.
    Completed,
    /// The history grew by the maximum number of turns.
    TurnLimit,
    /// The model echoed a tool result; no agent is left active.
    Stalled,
}

/// The result of a full orchestration run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Only the messages produced during this run.
    pub messages: Vec<Message>,
    /// The agent active at termination, or None after a stall.
    pub agent: Option<Arc<Agent>>,
    pub context_variables: ContextVariables,
    pub outcome: RunOutcome,
    /// Number of model calls made.
    pub turns: usize,
}

impl RunResult {
    pub fn agent_id(&self) -> Option<&AgentId> {
        self.agent.as_ref().map(|a| a.id())
    }

    /// Text of the last message that has any.
    pub fn last_text(&self) -> Option<String> {
        self.messages.iter().rev().find_map(Message::text)
    }

    pub fn is_stalled(&self) -> bool {
        self.outcome == RunOutcome::Stalled
    }
}

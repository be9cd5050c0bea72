// ABOUTME: Run events published by the swarm on a broadcast channel.
// ABOUTME: Observers subscribe for progress; publishing never blocks a run.

use serde::Serialize;
use serde_json::Value;

use handoff_core::{AgentId, RunOutcome};

/// Capacity of the swarm's event channel. Slow subscribers lag, runs never wait.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Something observable that happened during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SwarmEvent {
    TurnStarted {
        agent: AgentId,
        turn: usize,
    },
    AssistantText {
        agent: AgentId,
        text: String,
    },
    ToolCalled {
        agent: AgentId,
        tool: String,
        result: Value,
        is_error: bool,
    },
    AgentSwitched {
        from: AgentId,
        to: AgentId,
    },
    RunFinished {
        outcome: RunOutcome,
        agent: Option<AgentId>,
        turns: usize,
    },
    /// The run aborted with an error instead of finishing.
    RunFailed {
        error: String,
    },
}

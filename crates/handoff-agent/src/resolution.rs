// ABOUTME: Turns one completion's tool calls and results into history messages and a turn outcome.
// ABOUTME: Honors the first handoff per turn and replaces every handoff payload with a plain marker.

use serde_json::Value;

use handoff_core::{AgentId, Message, ToolCall, ToolOutcome, TurnOutcome, merge_context};

use crate::completion::{ToolResultRecord, outcome_payload};

/// Recorded in place of the handoff that was honored.
pub const TRANSFERRED_MARKER: &str = "transferred.";

/// Recorded in place of any further handoff requested in the same turn.
pub const IGNORED_TRANSFER_MARKER: &str = "transfer ignored: another transfer was already requested.";

/// Build the turn outcome for `agent`: the assistant tool-call message, one
/// tool message per result, the handoff target if any, and the merged
/// context updates (in result order).
pub fn resolve_turn(agent: &AgentId, calls: &[ToolCall], results: Vec<ToolResultRecord>) -> TurnOutcome {
    let mut outcome = TurnOutcome::default();
    if !calls.is_empty() {
        outcome
            .messages
            .push(Message::tool_calls(calls).with_agent(agent.as_str()));
    }

    for record in results {
        let payload = match &record.outcome {
            ToolOutcome::Handoff(target) => {
                if outcome.next_agent.is_none() {
                    outcome.next_agent = Some(target.resolve());
                    Value::String(TRANSFERRED_MARKER.to_string())
                } else {
                    tracing::warn!(agent = %agent, tool = %record.tool_name, "ignoring additional handoff in the same turn");
                    Value::String(IGNORED_TRANSFER_MARKER.to_string())
                }
            }
            other => outcome_payload(other).unwrap_or(Value::Null),
        };

        outcome.messages.push(
            Message::tool_result(record.tool_call_id, record.tool_name, payload, record.is_error)
                .with_agent(agent.as_str()),
        );
        merge_context(&mut outcome.context_variables, record.context_variables);
    }

    outcome
}

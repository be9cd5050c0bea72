// ABOUTME: Best-effort repetition guard that spots a conversation repeating itself.
// ABOUTME: A heuristic only: it can miss loops and it can flag legitimate repetition.

use serde_json::Value;

use crate::message::{ContentPart, Message, MessageContent, Role, result_text};

/// Number of identical tail messages that counts as a stall.
pub const DEFAULT_STALL_THRESHOLD: usize = 2;

/// True when the last `threshold` messages of `history` are all equal by role
/// and content. Tool-call ids are ignored since providers mint fresh ones for
/// identical calls. Thresholds below 2 never report a stall.
pub fn is_stalled(history: &[Message], threshold: usize) -> bool {
    if threshold < 2 || history.len() < threshold {
        return false;
    }
    let tail = &history[history.len() - threshold..];
    let first = fingerprint(&tail[0]);
    tail[1..].iter().all(|m| fingerprint(m) == first)
}

/// True when `text` repeats the most recent tool result in `history`.
pub fn echoes_tool_result(text: &str, history: &[Message]) -> bool {
    history
        .iter()
        .rev()
        .find_map(|m| m.tool_result_values().last().copied())
        .is_some_and(|result| result_text(result) == text)
}

fn fingerprint(message: &Message) -> (Role, Value) {
    let content = match &message.content {
        MessageContent::Text(text) => Value::String(text.clone()),
        MessageContent::Parts(parts) => Value::Array(parts.iter().map(part_fingerprint).collect()),
    };
    (message.role, content)
}

fn part_fingerprint(part: &ContentPart) -> Value {
    match part {
        ContentPart::Text { text } => serde_json::json!({ "text": text }),
        ContentPart::ToolCall { tool_name, args, .. } => {
            serde_json::json!({ "call": tool_name, "args": args })
        }
        ContentPart::ToolResult {
            tool_name,
            result,
            is_error,
            ..
        } => serde_json::json!({ "result": tool_name, "value": result, "error": is_error }),
    }
}

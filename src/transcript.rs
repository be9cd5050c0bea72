// ABOUTME: Renders run messages as plain transcript lines for the terminal.
// ABOUTME: One line per text, tool call, or tool result, prefixed by the agent that produced it.

use handoff_core::message::result_text;
use handoff_core::{ContentPart, Message, MessageContent, Role};

/// Transcript lines for `message`, in content order.
pub fn render(message: &Message) -> Vec<String> {
    let who = match (message.role, message.originating_agent_id.as_deref()) {
        (Role::User, _) => "user".to_string(),
        (_, Some(agent)) => agent.to_string(),
        (Role::Assistant, None) => "assistant".to_string(),
        (Role::Tool, None) => "tool".to_string(),
    };

    match &message.content {
        MessageContent::Text(text) => vec![format!("{who}: {text}")],
        MessageContent::Parts(parts) => parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => format!("{who}: {text}"),
                ContentPart::ToolCall { tool_name, args, .. } => {
                    format!("{who} (call {tool_name}): {args}")
                }
                ContentPart::ToolResult {
                    tool_name,
                    result,
                    is_error,
                    ..
                } => {
                    let label = if *is_error { "error" } else { "tool" };
                    format!("{who} ({label} {tool_name}): {}", result_text(result))
                }
            })
            .collect(),
    }
}

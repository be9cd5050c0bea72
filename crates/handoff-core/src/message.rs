// ABOUTME: Conversation message model shared by the orchestration loop and provider clients.
// ABOUTME: Messages carry a role, text or typed parts, and the id of the agent that produced them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who a message is attributed to in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// One typed piece of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        args: Value,
    },
    #[serde(rename_all = "camelCase")]
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        result: Value,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

/// Message body: either plain text or a sequence of typed parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A single entry in the conversation history. Once appended to a run's
/// history a message is never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub originating_agent_id: Option<String>,
}

impl Message {
    /// A user message with plain text content.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
            originating_agent_id: None,
        }
    }

    /// An assistant message with plain text content.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
            originating_agent_id: None,
        }
    }

    /// An assistant message carrying the tool calls the model requested.
    pub fn tool_calls(calls: &[ToolCall]) -> Self {
        let parts = calls
            .iter()
            .map(|call| ContentPart::ToolCall {
                tool_call_id: call.id.clone(),
                tool_name: call.name.clone(),
                args: call.arguments.clone(),
            })
            .collect();
        Self {
            role: Role::Assistant,
            content: MessageContent::Parts(parts),
            originating_agent_id: None,
        }
    }

    /// A tool message answering the call identified by `tool_call_id`.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        result: Value,
        is_error: bool,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: MessageContent::Parts(vec![ContentPart::ToolResult {
                tool_call_id: tool_call_id.into(),
                tool_name: tool_name.into(),
                result,
                is_error,
            }]),
            originating_agent_id: None,
        }
    }

    /// Tag the message with the agent that produced or observed it.
    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.originating_agent_id = Some(agent_id.into());
        self
    }

    /// The textual content of the message, joining text parts. Returns None
    /// when the message has no text at all.
    pub fn text(&self) -> Option<String> {
        match &self.content {
            MessageContent::Text(text) => Some(text.clone()),
            MessageContent::Parts(parts) => {
                let texts: Vec<&str> = parts
                    .iter()
                    .filter_map(|part| match part {
                        ContentPart::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                if texts.is_empty() {
                    None
                } else {
                    Some(texts.join("\n"))
                }
            }
        }
    }

    /// All tool-call parts in this message.
    pub fn tool_call_parts(&self) -> Vec<ToolCall> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::ToolCall {
                        tool_call_id,
                        tool_name,
                        args,
                    } => Some(ToolCall::new(tool_call_id, tool_name, args.clone())),
                    _ => None,
                })
                .collect(),
        }
    }

    /// The payloads of every tool-result part in this message, in order.
    pub fn tool_result_values(&self) -> Vec<&Value> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::ToolResult { result, .. } => Some(result),
                    _ => None,
                })
                .collect(),
        }
    }
}

/// Render a tool-result payload as the text a model (or a human) would see.
/// Strings are taken verbatim; anything else is compact JSON.
pub fn result_text(result: &Value) -> String {
    match result {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

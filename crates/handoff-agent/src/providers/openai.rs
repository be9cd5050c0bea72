// ABOUTME: OpenAI Chat Completions adapter implementing the LlmClient trait.
// ABOUTME: Translates swarm messages and tool definitions into function-calling requests and back.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use ulid::Ulid;

use handoff_core::message::result_text;
use handoff_core::{ContentPart, Message, MessageContent, Role, ToolCall};

use crate::runtime::{CompletionError, GenerateRequest, GenerateResponse, LlmClient};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI client. Calls the Chat Completions API with function definitions
/// and maps `tool_calls` back into [`ToolCall`]s.
pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIClient {
    /// Create a new OpenAIClient reading configuration from environment variables.
    /// Required: `OPENAI_API_KEY`
    /// Optional: `OPENAI_BASE_URL` (defaults to https://api.openai.com)
    /// Optional: `OPENAI_MODEL` (defaults to gpt-4o)
    pub fn from_env() -> Result<Self, CompletionError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| CompletionError::Provider("OPENAI_API_KEY not set".to_string()))?;

        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::new(api_key, base_url, model))
    }

    /// Create a new OpenAIClient with explicit configuration.
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    /// Build the JSON request body for the Chat Completions API.
    pub fn build_request_body(request: &GenerateRequest) -> Value {
        let mut messages = vec![json!({
            "role": "system",
            "content": request.system_prompt
        })];
        for message in &request.messages {
            messages.extend(to_openai_messages(message));
        }

        let mut body = json!({
            "model": request.model,
            "messages": answer_dangling_tool_calls(messages),
        });

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
            body["tool_choice"] = json!(request.tool_choice.as_str());
            if let Some(parallel) = request.parallel_tool_calls {
                body["parallel_tool_calls"] = json!(parallel);
            }
        }

        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }

    /// Parse a Chat Completions response into text and tool calls.
    pub fn parse_response(response_body: &Value) -> Result<GenerateResponse, CompletionError> {
        let choice = response_body
            .get("choices")
            .and_then(|c| c.as_array())
            .ok_or_else(|| {
                CompletionError::InvalidResponse("missing choices array in response".to_string())
            })?
            .first()
            .ok_or_else(|| CompletionError::InvalidResponse("empty choices array".to_string()))?;

        let message = choice.get("message").ok_or_else(|| {
            CompletionError::InvalidResponse("missing message in choice".to_string())
        })?;

        let text = message
            .get("content")
            .and_then(|c| c.as_str())
            .filter(|c| !c.is_empty())
            .map(String::from);

        let tool_calls = match message.get("tool_calls").and_then(|t| t.as_array()) {
            Some(calls) => calls
                .iter()
                .map(parse_tool_call)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let finish_reason = choice
            .get("finish_reason")
            .and_then(|f| f.as_str())
            .map(String::from);

        Ok(GenerateResponse {
            text,
            tool_calls,
            finish_reason,
        })
    }
}

/// Convert one swarm message into zero or more Chat Completions messages.
/// Tool messages expand to one entry per result.
fn to_openai_messages(message: &Message) -> Vec<Value> {
    match (&message.role, &message.content) {
        (Role::User, _) => vec![json!({
            "role": "user",
            "content": message.text().unwrap_or_default()
        })],
        (Role::Assistant, MessageContent::Text(text)) => vec![json!({
            "role": "assistant",
            "content": text
        })],
        (Role::Assistant, MessageContent::Parts(_)) => {
            let calls: Vec<Value> = message
                .tool_call_parts()
                .iter()
                .map(|call| {
                    let arguments = match &call.arguments {
                        Value::String(raw) => raw.clone(),
                        other => other.to_string(),
                    };
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": { "name": call.name, "arguments": arguments }
                    })
                })
                .collect();
            let mut entry = json!({
                "role": "assistant",
                "content": message.text().map(Value::String).unwrap_or(Value::Null)
            });
            if !calls.is_empty() {
                entry["tool_calls"] = Value::Array(calls);
            }
            vec![entry]
        }
        (Role::Tool, MessageContent::Text(text)) => vec![json!({
            "role": "tool",
            "content": text
        })],
        (Role::Tool, MessageContent::Parts(parts)) => parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::ToolResult {
                    tool_call_id,
                    result,
                    ..
                } => Some(json!({
                    "role": "tool",
                    "tool_call_id": tool_call_id,
                    "content": result_text(result)
                })),
                _ => None,
            })
            .collect(),
    }
}

/// Chat Completions rejects an assistant `tool_calls` entry unless every id
/// is answered by a `tool` message before the next non-tool message. Terminal
/// calls and unexecuted calls have no result in history, so they get an empty
/// placeholder right after the calls they belong to.
fn answer_dangling_tool_calls(messages: Vec<Value>) -> Vec<Value> {
    let mut answered = Vec::with_capacity(messages.len());
    let mut pending: Vec<String> = Vec::new();

    for message in messages {
        let role = message["role"].as_str().unwrap_or_default().to_string();
        if role == "tool" {
            if let Some(id) = message["tool_call_id"].as_str() {
                pending.retain(|p| p != id);
            }
        } else {
            flush_placeholders(&mut answered, &mut pending);
        }

        if role == "assistant" {
            pending = message["tool_calls"]
                .as_array()
                .map(|calls| {
                    calls
                        .iter()
                        .filter_map(|c| c["id"].as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default();
        }
        answered.push(message);
    }
    flush_placeholders(&mut answered, &mut pending);

    answered
}

fn flush_placeholders(messages: &mut Vec<Value>, pending: &mut Vec<String>) {
    for id in pending.drain(..) {
        messages.push(json!({ "role": "tool", "tool_call_id": id, "content": "" }));
    }
}

/// Parse a single tool_call. Arguments that are not valid JSON are kept as
/// the raw string so validation can report them back to the model.
fn parse_tool_call(tool_call: &Value) -> Result<ToolCall, CompletionError> {
    // Some OpenAI-compatible servers omit ids; results still need one to answer.
    let id = tool_call
        .get("id")
        .and_then(|i| i.as_str())
        .filter(|i| !i.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("call_{}", Ulid::new()));

    let function = tool_call.get("function").ok_or_else(|| {
        CompletionError::InvalidResponse("tool_call missing function".to_string())
    })?;

    let name = function
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| CompletionError::InvalidResponse("function missing name".to_string()))?;

    let raw = function
        .get("arguments")
        .and_then(|a| a.as_str())
        .unwrap_or("");

    let arguments = if raw.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
    };

    Ok(ToolCall::new(id, name, arguments))
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, CompletionError> {
        let body = Self::build_request_body(request);
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Provider(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CompletionError::RateLimited);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CompletionError::Unauthorized(
                "check OPENAI_API_KEY".to_string(),
            ));
        }

        if status.is_server_error() {
            return Err(CompletionError::Provider(format!("Server error: {}", status)));
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Provider(format!(
                "API error {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(format!("failed to parse JSON: {}", e)))?;

        Self::parse_response(&response_body)
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_core::{ToolChoice, ToolDefinition};

    fn request(messages: Vec<Message>, tools: Vec<ToolDefinition>) -> GenerateRequest {
        GenerateRequest {
            model: "gpt-4o".to_string(),
            system_prompt: "You are a triage agent.".to_string(),
            messages,
            tools,
            tool_choice: ToolChoice::Auto,
            max_steps: 1,
            temperature: Some(0.0),
            max_tokens: None,
            parallel_tool_calls: Some(false),
        }
    }

    #[test]
    fn openai_client_creation() {
        let client = OpenAIClient::new(
            "test-key".to_string(),
            "https://api.openai.com/".to_string(),
            "gpt-4o".to_string(),
        );

        assert_eq!(client.provider_name(), "openai");
        assert_eq!(client.model_name(), "gpt-4o");
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, "https://api.openai.com");
    }

    #[test]
    fn builds_request_with_tool_history() {
        let history = vec![
            Message::user("weather in Paris?"),
            Message::tool_calls(&[ToolCall::new("call_1", "transferToWeather", json!({"agentId": "Weather"}))])
                .with_agent("Triage"),
            Message::tool_result("call_1", "transferToWeather", json!("transferred."), false)
                .with_agent("Triage"),
        ];
        let tools = vec![ToolDefinition {
            name: "weather".to_string(),
            description: "A tool for providing the weather.".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        }];

        let body = OpenAIClient::build_request_body(&request(history, tools));

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "weather in Paris?");
        assert!(messages[2]["content"].is_null());
        assert_eq!(messages[2]["tool_calls"][0]["function"]["name"], "transferToWeather");
        assert_eq!(
            messages[2]["tool_calls"][0]["function"]["arguments"],
            r#"{"agentId":"Weather"}"#
        );
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "call_1");
        assert_eq!(messages[3]["content"], "transferred.");

        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["parallel_tool_calls"], false);
        assert!(body.get("max_tokens").is_none());
    }

    fn tool_call_ids(messages: &[Value]) -> Vec<&str> {
        messages
            .iter()
            .filter_map(|m| m["tool_calls"].as_array())
            .flatten()
            .filter_map(|c| c["id"].as_str())
            .collect()
    }

    fn answered_ids(messages: &[Value]) -> Vec<&str> {
        messages
            .iter()
            .filter(|m| m["role"] == "tool")
            .filter_map(|m| m["tool_call_id"].as_str())
            .collect()
    }

    #[tokio::test]
    async fn terminal_call_in_history_is_answered_on_the_next_request() {
        use crate::swarm::{RunOptions, Swarm};
        use crate::testing::ScriptedClient;
        use handoff_core::{Agent, AgentGraph, AgentId, ParamType, ParameterSchema, ToolSpec};
        use std::sync::Arc;

        let agent = Agent::builder("Answerer")
            .tool(ToolSpec::terminal(
                "final_answer",
                "Provide the final answer.",
                ParameterSchema::new().required("answer", ParamType::String, "The answer"),
            ))
            .build()
            .unwrap();
        let graph = AgentGraph::wire([agent], []).unwrap();
        let client = Arc::new(ScriptedClient::new(vec![
            GenerateResponse::tool_calls(vec![ToolCall::new("c1", "final_answer", json!({"answer": "42"}))]),
            GenerateResponse::text("anything else?"),
        ]));
        let swarm = Swarm::new(graph, client.clone());
        let id = AgentId::new("Answerer").unwrap();

        let mut history = vec![Message::user("what is the answer?")];
        let first = swarm.run(&id, &history, RunOptions::default()).await.unwrap();
        history.extend(first.messages);
        history.push(Message::user("thanks"));
        swarm.run(&id, &history, RunOptions::default()).await.unwrap();

        let requests = client.requests();
        let body = OpenAIClient::build_request_body(&requests[1]);
        let messages = body["messages"].as_array().unwrap();

        assert_eq!(tool_call_ids(messages), vec!["c1"]);
        assert_eq!(answered_ids(messages), vec!["c1"]);
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["content"], "");
        assert_eq!(messages[4]["content"], "thanks");
    }

    #[test]
    fn placeholders_only_fill_missing_results() {
        let history = vec![
            Message::user("two lookups"),
            Message::tool_calls(&[
                ToolCall::new("c1", "weather", json!({"location": "Oslo"})),
                ToolCall::new("c2", "weather", json!({"location": "Rome"})),
            ]),
            Message::tool_result("c1", "weather", json!("sunny"), false),
        ];

        let body = OpenAIClient::build_request_body(&request(history, vec![]));
        let messages = body["messages"].as_array().unwrap();

        assert_eq!(answered_ids(messages), vec!["c1", "c2"]);
        assert_eq!(messages[3]["content"], "sunny");
        assert_eq!(messages[4]["content"], "");
        assert_eq!(messages.len(), 5);
    }

    #[test]
    fn omits_tool_fields_without_tools() {
        let body = OpenAIClient::build_request_body(&request(vec![Message::user("hi")], vec![]));
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert!(body.get("parallel_tool_calls").is_none());
    }

    #[test]
    fn parses_tool_call_response() {
        let response = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [
                            {
                                "id": "call_abc",
                                "type": "function",
                                "function": {
                                    "name": "weather",
                                    "arguments": "{\"location\": \"Paris\"}"
                                }
                            },
                            {
                                "id": "call_bad",
                                "type": "function",
                                "function": { "name": "weather", "arguments": "{\"location\": " }
                            }
                        ]
                    },
                    "finish_reason": "tool_calls"
                }
            ]
        });

        let parsed = OpenAIClient::parse_response(&response).unwrap();
        assert!(parsed.text.is_none());
        assert_eq!(parsed.tool_calls.len(), 2);
        assert_eq!(parsed.tool_calls[0].id, "call_abc");
        assert_eq!(parsed.tool_calls[0].arguments, json!({"location": "Paris"}));
        assert_eq!(parsed.tool_calls[1].arguments, json!("{\"location\": "));
        assert_eq!(parsed.finish_reason.as_deref(), Some("tool_calls"));
    }

    #[test]
    fn parses_text_response() {
        let response = json!({
            "choices": [
                {
                    "index": 0,
                    "message": { "role": "assistant", "content": "sunny, 20°C" },
                    "finish_reason": "stop"
                }
            ]
        });

        let parsed = OpenAIClient::parse_response(&response).unwrap();
        assert_eq!(parsed.text.as_deref(), Some("sunny, 20°C"));
        assert!(parsed.tool_calls.is_empty());
    }

    #[test]
    fn rejects_malformed_responses() {
        assert!(OpenAIClient::parse_response(&json!({})).is_err());
        assert!(OpenAIClient::parse_response(&json!({"choices": []})).is_err());
        let err = OpenAIClient::parse_response(&json!({
            "choices": [{"message": {"tool_calls": [{"id": "c", "type": "function"}]}}]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("missing function"));
    }

    #[test]
    fn mints_ids_for_tool_calls_without_one() {
        let response = json!({
            "choices": [{"message": {"tool_calls": [
                {"type": "function", "function": {"name": "weather", "arguments": ""}}
            ]}}]
        });
        let parsed = OpenAIClient::parse_response(&response).unwrap();
        assert!(parsed.tool_calls[0].id.starts_with("call_"));
        assert_eq!(parsed.tool_calls[0].arguments, json!({}));
    }

    #[tokio::test]
    #[cfg(feature = "live-test")]
    async fn openai_client_basic() {
        let client = OpenAIClient::from_env().expect("OPENAI_API_KEY must be set");
        let req = request(vec![Message::user("Say hello.")], vec![]);
        let result = client.generate(&GenerateRequest { model: client.model_name().to_string(), ..req }).await;
        assert!(result.is_ok(), "live test failed: {:?}", result.err());
    }
}

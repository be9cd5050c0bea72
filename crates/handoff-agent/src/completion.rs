// ABOUTME: Completion adapter: builds a model request for an agent, calls the client, and runs the tools it asked for.
// ABOUTME: Applies the repetition-guard hint and turns argument or tool failures into error tool results.

use std::sync::Arc;

use serde_json::Value;

use handoff_core::guard::{DEFAULT_STALL_THRESHOLD, is_stalled};
use handoff_core::{
    Agent, ContextVariables, Message, ToolCall, ToolChoice, ToolKind, ToolOutcome, ToolOutput,
};

use crate::runtime::{CompletionError, GenerateRequest, LlmClient};

/// Per-call knobs passed down from the run.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Replaces the agent's model for this call.
    pub model_override: Option<String>,
    /// When false, tool calls are returned but nothing is executed.
    pub execute_tools: bool,
    pub debug: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model_override: None,
            execute_tools: true,
            debug: false,
        }
    }
}

/// The outcome of running one tool call.
#[derive(Debug, Clone)]
pub struct ToolResultRecord {
    pub tool_call_id: String,
    pub tool_name: String,
    pub outcome: ToolOutcome,
    pub is_error: bool,
    pub context_variables: ContextVariables,
}

impl ToolResultRecord {
    fn error(call: &ToolCall, message: String) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            outcome: ToolOutcome::Text(message),
            is_error: true,
            context_variables: ContextVariables::new(),
        }
    }

    fn success(call: &ToolCall, output: ToolOutput) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            outcome: output.outcome,
            is_error: false,
            context_variables: output.context_variables,
        }
    }

    pub fn is_handoff(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Handoff(_))
    }
}

/// Everything one model call produced.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    /// One record per executed call, in call order. Terminal calls have none.
    pub tool_results: Vec<ToolResultRecord>,
    /// A terminal tool was called; its arguments are the final answer.
    pub terminal: bool,
}

impl Completion {
    /// Text if the model produced any non-empty text.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// Wraps an [`LlmClient`] with request building and tool execution.
#[derive(Clone)]
pub struct CompletionAdapter {
    client: Arc<dyn LlmClient>,
}

impl CompletionAdapter {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn LlmClient> {
        &self.client
    }

    /// Build the request for `agent` against `history`. The system prompt is
    /// rendered from `context`, and tool calls are disabled when the history
    /// tail repeats itself.
    pub fn build_request(
        &self,
        agent: &Agent,
        history: &[Message],
        context: &ContextVariables,
        options: &CompletionOptions,
    ) -> GenerateRequest {
        let model = options
            .model_override
            .clone()
            .or_else(|| agent.model().map(String::from))
            .unwrap_or_else(|| self.client.model_name().to_string());

        let settings = agent.settings();
        let tool_choice = if is_stalled(history, DEFAULT_STALL_THRESHOLD) {
            tracing::debug!(agent = %agent.id(), "history tail repeats, disabling tool calls");
            ToolChoice::None
        } else {
            settings.tool_choice
        };

        GenerateRequest {
            model,
            system_prompt: agent.instructions().render(context),
            messages: history.to_vec(),
            tools: agent.registry().definitions(),
            tool_choice,
            max_steps: agent.max_steps(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            parallel_tool_calls: settings.parallel_tool_calls,
        }
    }

    /// Make one model call for `agent` and execute the tool calls it returns,
    /// in order. Model errors propagate; tool errors become error results.
    pub async fn complete(
        &self,
        agent: &Agent,
        history: &[Message],
        context: &ContextVariables,
        options: &CompletionOptions,
    ) -> Result<Completion, CompletionError> {
        let request = self.build_request(agent, history, context, options);
        if options.debug {
            tracing::debug!(
                agent = %agent.id(),
                messages = request.messages.len(),
                tools = request.tools.len(),
                model = %request.model,
                "passing history to agent"
            );
        }

        let response = self.client.generate(&request).await?;
        if options.debug {
            tracing::debug!(agent = %agent.id(), response = ?response, "raw completion");
        }

        let mut completion = Completion {
            text: response.text,
            tool_calls: response.tool_calls,
            tool_results: Vec::new(),
            terminal: false,
        };

        if !options.execute_tools {
            return Ok(completion);
        }

        for call in &completion.tool_calls {
            match self.execute_call(agent, call, context).await {
                Some(record) => completion.tool_results.push(record),
                None => completion.terminal = true,
            }
        }

        Ok(completion)
    }

    /// Run one call. Returns None for terminal tools, which produce no result.
    async fn execute_call(
        &self,
        agent: &Agent,
        call: &ToolCall,
        context: &ContextVariables,
    ) -> Option<ToolResultRecord> {
        let Some(spec) = agent.registry().get(&call.name) else {
            tracing::warn!(agent = %agent.id(), tool = %call.name, "model called unknown tool");
            return Some(ToolResultRecord::error(
                call,
                format!("Error: Tool {} not found.", call.name),
            ));
        };

        let args = match spec.parameters.validate(&call.arguments, context) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(agent = %agent.id(), tool = %call.name, error = %e, "invalid tool arguments");
                return Some(ToolResultRecord::error(call, format!("Error: {e}")));
            }
        };

        match &spec.kind {
            ToolKind::Action(executor) => match executor.execute(args).await {
                Ok(output) => Some(ToolResultRecord::success(call, output)),
                Err(e) => {
                    tracing::warn!(agent = %agent.id(), tool = %call.name, error = %e, "tool execution failed");
                    Some(ToolResultRecord::error(call, format!("Error: {e}")))
                }
            },
            ToolKind::Handoff(target) => Some(ToolResultRecord::success(
                call,
                ToolOutput::handoff(target.clone()),
            )),
            ToolKind::Terminal => None,
        }
    }
}

/// The payload recorded in history for a non-handoff outcome.
pub fn outcome_payload(outcome: &ToolOutcome) -> Option<Value> {
    match outcome {
        ToolOutcome::Text(text) => Some(Value::String(text.clone())),
        ToolOutcome::Structured(value) => Some(value.clone()),
        ToolOutcome::Handoff(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::GenerateResponse;
    use crate::testing::ScriptedClient;
    use handoff_core::{AgentId, ParamType, ParameterSchema, ToolSpec};
    use serde_json::json;

    fn weather_agent() -> Agent {
        Agent::builder("Weather")
            .instructions("You are a weather agent.")
            .tool(ToolSpec::from_fn(
                "weather",
                "A tool for providing the weather.",
                ParameterSchema::new()
                    .required("location", ParamType::String, "The location")
                    .from_context("units", ParamType::String, false),
                |args| async move {
                    let location = args["location"].as_str().unwrap_or_default().to_string();
                    let units = args.get("units").and_then(|u| u.as_str()).unwrap_or("C").to_string();
                    if location == "Atlantis" {
                        anyhow::bail!("boom");
                    }
                    Ok(ToolOutput::text(format!("The weather in {location} is sunny ({units}).")))
                },
            ))
            .tool(ToolSpec::terminal(
                "final_answer",
                "Provide the final answer.",
                ParameterSchema::new().required("answer", ParamType::String, "The answer"),
            ))
            .handoff(AgentId::new("Triage").unwrap())
            .build()
            .unwrap()
    }

    fn call(id: &str, name: &str, args: Value) -> ToolCall {
        ToolCall::new(id, name, args)
    }

    #[tokio::test]
    async fn request_uses_override_then_agent_then_client_model() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let adapter = CompletionAdapter::new(client);
        let agent = weather_agent();
        let ctx = ContextVariables::new();

        let req = adapter.build_request(&agent, &[], &ctx, &CompletionOptions::default());
        assert_eq!(req.model, "scripted-model");
        assert_eq!(req.max_steps, 1);
        assert_eq!(req.system_prompt, "You are a weather agent.");

        let pinned = Agent::builder("Pinned").model("gpt-4o-mini").build().unwrap();
        let req = adapter.build_request(&pinned, &[], &ctx, &CompletionOptions::default());
        assert_eq!(req.model, "gpt-4o-mini");

        let options = CompletionOptions {
            model_override: Some("gpt-4.1".to_string()),
            ..Default::default()
        };
        let req = adapter.build_request(&pinned, &[], &ctx, &options);
        assert_eq!(req.model, "gpt-4.1");
    }

    #[tokio::test]
    async fn request_hides_context_params_and_disables_tools_on_repeat() {
        let adapter = CompletionAdapter::new(Arc::new(ScriptedClient::new(vec![])));
        let agent = weather_agent();
        let ctx = ContextVariables::new();

        let req = adapter.build_request(&agent, &[Message::user("hi")], &ctx, &CompletionOptions::default());
        assert_eq!(req.tool_choice, ToolChoice::Auto);
        let weather = req.tools.iter().find(|t| t.name == "weather").unwrap();
        assert!(weather.parameters["properties"].get("units").is_none());

        let repeated = vec![Message::assistant("again"), Message::assistant("again")];
        let req = adapter.build_request(&agent, &repeated, &ctx, &CompletionOptions::default());
        assert_eq!(req.tool_choice, ToolChoice::None);
    }

    #[tokio::test]
    async fn tools_run_in_order_and_failures_become_error_results() {
        let client = Arc::new(ScriptedClient::new(vec![GenerateResponse::tool_calls(vec![
            call("c1", "weather", json!({"location": "Paris"})),
            call("c2", "weather", json!({"location": "Atlantis"})),
            call("c3", "weather", json!({})),
            call("c4", "nope", json!({})),
            call("c5", "weather", Value::String("{not json".to_string())),
        ])]));
        let adapter = CompletionAdapter::new(client);
        let mut ctx = ContextVariables::new();
        ctx.insert("units".to_string(), json!("F"));

        let completion = adapter
            .complete(&weather_agent(), &[Message::user("weather?")], &ctx, &CompletionOptions::default())
            .await
            .unwrap();

        let rendered: Vec<(bool, String)> = completion
            .tool_results
            .iter()
            .map(|r| (r.is_error, format!("{:?}", outcome_payload(&r.outcome))))
            .collect();
        assert_eq!(rendered.len(), 5);
        assert!(!rendered[0].0);
        assert!(rendered[0].1.contains("The weather in Paris is sunny (F)."));
        assert!(rendered[1].0 && rendered[1].1.contains("Error: boom"));
        assert!(rendered[2].0 && rendered[2].1.contains("Missing required parameter: location"));
        assert!(rendered[3].0 && rendered[3].1.contains("Error: Tool nope not found."));
        assert!(rendered[4].0 && rendered[4].1.contains("arguments must be a JSON object"));
        assert!(!completion.terminal);
    }

    #[tokio::test]
    async fn handoff_and_terminal_calls_are_classified() {
        let client = Arc::new(ScriptedClient::new(vec![GenerateResponse::tool_calls(vec![
            call("c1", "transferToTriage", json!({"agentId": "Triage"})),
            call("c2", "final_answer", json!({"answer": "42"})),
        ])]));
        let adapter = CompletionAdapter::new(client);

        let completion = adapter
            .complete(&weather_agent(), &[], &ContextVariables::new(), &CompletionOptions::default())
            .await
            .unwrap();

        assert_eq!(completion.tool_results.len(), 1);
        assert!(completion.tool_results[0].is_handoff());
        assert!(completion.terminal);
    }

    #[tokio::test]
    async fn execute_tools_false_skips_execution() {
        let client = Arc::new(ScriptedClient::new(vec![GenerateResponse::tool_calls(vec![call(
            "c1",
            "weather",
            json!({"location": "Atlantis"}),
        )])]));
        let adapter = CompletionAdapter::new(client);
        let options = CompletionOptions {
            execute_tools: false,
            ..Default::default()
        };

        let completion = adapter
            .complete(&weather_agent(), &[], &ContextVariables::new(), &options)
            .await
            .unwrap();
        assert_eq!(completion.tool_calls.len(), 1);
        assert!(completion.tool_results.is_empty());
        assert!(!completion.terminal);
    }

    #[tokio::test]
    async fn client_errors_propagate() {
        let adapter = CompletionAdapter::new(Arc::new(ScriptedClient::new(vec![])));
        let err = adapter
            .complete(&weather_agent(), &[], &ContextVariables::new(), &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Provider(_)));
    }
}

// ABOUTME: The Swarm orchestration loop: drives the active agent turn by turn, executing handoffs.
// ABOUTME: Each run owns its own history and context; agents are shared read-only through the graph.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;

use handoff_core::guard::echoes_tool_result;
use handoff_core::message::result_text;
use handoff_core::{
    Agent, AgentGraph, AgentId, ContentPart, ContextVariables, Message, MessageContent, RunOutcome,
    RunResult, merge_context,
};

use crate::completion::{Completion, CompletionAdapter, CompletionOptions, outcome_payload};
use crate::config::SwarmConfig;
use crate::events::{EVENT_CHANNEL_CAPACITY, SwarmEvent};
use crate::resolution::resolve_turn;
use crate::runtime::{CompletionError, LlmClient};

/// Default bound on history growth per run.
pub const DEFAULT_MAX_TURNS: usize = 6;

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    #[error("unknown agent '{0}'")]
    UnknownAgent(String),

    #[error("completion failed for agent '{agent}': {source}")]
    Completion {
        agent: AgentId,
        #[source]
        source: CompletionError,
    },
}

/// Inputs that shape one run besides the starting agent and messages.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub context_variables: ContextVariables,
    /// Maximum number of messages the run may add before it stops. Checked
    /// before each turn, so a turn may overshoot it.
    pub max_turns: usize,
    pub debug: bool,
    pub model_override: Option<String>,
    pub execute_tools: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            context_variables: ContextVariables::new(),
            max_turns: DEFAULT_MAX_TURNS,
            debug: false,
            model_override: None,
            execute_tools: true,
        }
    }
}

impl RunOptions {
    /// Defaults taken from environment configuration.
    pub fn from_config(config: &SwarmConfig) -> Self {
        Self {
            max_turns: config.max_turns,
            debug: config.debug,
            ..Self::default()
        }
    }

    pub fn context_variables(mut self, context: ContextVariables) -> Self {
        self.context_variables = context;
        self
    }

    pub fn max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn model_override(mut self, model: impl Into<String>) -> Self {
        self.model_override = Some(model.into());
        self
    }

    pub fn execute_tools(mut self, execute: bool) -> Self {
        self.execute_tools = execute;
        self
    }

    fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            model_override: self.model_override.clone(),
            execute_tools: self.execute_tools,
            debug: self.debug,
        }
    }
}

/// Runs conversations over a wired agent graph.
pub struct Swarm {
    graph: Arc<AgentGraph>,
    adapter: CompletionAdapter,
    event_tx: broadcast::Sender<SwarmEvent>,
}

impl Swarm {
    pub fn new(graph: AgentGraph, client: Arc<dyn LlmClient>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            graph: Arc::new(graph),
            adapter: CompletionAdapter::new(client),
            event_tx,
        }
    }

    pub fn graph(&self) -> &AgentGraph {
        &self.graph
    }

    /// Receive events for every run started after subscribing.
    pub fn subscribe(&self) -> broadcast::Receiver<SwarmEvent> {
        self.event_tx.subscribe()
    }

    /// A handle bound to the agent named `id`.
    pub fn agent(&self, id: &str) -> Result<SwarmAgent<'_>, SwarmError> {
        let agent = self
            .graph
            .get_by_name(id)
            .cloned()
            .ok_or_else(|| SwarmError::UnknownAgent(id.to_string()))?;
        Ok(SwarmAgent { swarm: self, agent })
    }

    /// Run the conversation in `messages` starting at `agent` until it
    /// completes, hits the turn limit, or stalls. The returned messages are
    /// only those produced by this run. Every run ends with either a
    /// `RunFinished` or a `RunFailed` event.
    pub async fn run(
        &self,
        agent: &AgentId,
        messages: &[Message],
        options: RunOptions,
    ) -> Result<RunResult, SwarmError> {
        let result = self.drive(agent, messages, options).await;
        if let Err(e) = &result {
            self.publish(SwarmEvent::RunFailed {
                error: e.to_string(),
            });
        }
        result
    }

    async fn drive(
        &self,
        agent: &AgentId,
        messages: &[Message],
        options: RunOptions,
    ) -> Result<RunResult, SwarmError> {
        let mut active = self.lookup(agent)?;
        let mut history = messages.to_vec();
        let mut context = options.context_variables.clone();
        let start = history.len();
        let completion_options = options.completion_options();
        let mut turns = 0;

        let outcome = loop {
            if history.len() - start >= options.max_turns {
                tracing::info!(agent = %active.id(), turns, "turn limit reached");
                break RunOutcome::TurnLimit;
            }

            turns += 1;
            tracing::info!(agent = %active.id(), turn = turns, history = history.len(), "turn started");
            self.publish(SwarmEvent::TurnStarted {
                agent: active.id().clone(),
                turn: turns,
            });

            let completion = self
                .adapter
                .complete(&active, &history, &context, &completion_options)
                .await
                .map_err(|source| {
                    tracing::error!(agent = %active.id(), error = %source, "completion failed");
                    SwarmError::Completion {
                        agent: active.id().clone(),
                        source,
                    }
                })?;

            if let Some(text) = completion.text().map(str::to_string) {
                let stalled = echoes_tool_result(&text, &history) || echoes_own_result(&text, &completion);
                history.push(Message::assistant(text.as_str()).with_agent(active.id().as_str()));
                self.publish(SwarmEvent::AssistantText {
                    agent: active.id().clone(),
                    text,
                });
                if stalled {
                    tracing::warn!(agent = %active.id(), turn = turns, "assistant repeated a tool result, aborting run");
                    break RunOutcome::Stalled;
                }
            }

            if completion.tool_calls.is_empty() {
                if options.debug {
                    tracing::debug!(agent = %active.id(), "no tool calls, ending run");
                }
                break RunOutcome::Completed;
            }

            if !options.execute_tools {
                history.push(Message::tool_calls(&completion.tool_calls).with_agent(active.id().as_str()));
                break RunOutcome::Completed;
            }

            let terminal = completion.terminal;
            let turn = resolve_turn(active.id(), &completion.tool_calls, completion.tool_results);
            for message in &turn.messages {
                self.publish_tool_results(active.id(), message);
            }
            history.extend(turn.messages);
            merge_context(&mut context, turn.context_variables);

            if let Some(next) = turn.next_agent {
                let target = self.lookup(&next)?;
                tracing::info!(from = %active.id(), to = %next, "transferring");
                self.publish(SwarmEvent::AgentSwitched {
                    from: active.id().clone(),
                    to: next,
                });
                active = target;
            }

            if terminal {
                break RunOutcome::Completed;
            }
        };

        let agent = match outcome {
            RunOutcome::Stalled => None,
            _ => Some(active),
        };
        self.publish(SwarmEvent::RunFinished {
            outcome,
            agent: agent.as_ref().map(|a| a.id().clone()),
            turns,
        });

        Ok(RunResult {
            messages: history.split_off(start),
            agent,
            context_variables: context,
            outcome,
            turns,
        })
    }

    fn lookup(&self, id: &AgentId) -> Result<Arc<Agent>, SwarmError> {
        self.graph
            .get(id)
            .cloned()
            .ok_or_else(|| SwarmError::UnknownAgent(id.to_string()))
    }

    fn publish(&self, event: SwarmEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    fn publish_tool_results(&self, agent: &AgentId, message: &Message) {
        let MessageContent::Parts(parts) = &message.content else {
            return;
        };
        for part in parts {
            if let ContentPart::ToolResult {
                tool_name,
                result,
                is_error,
                ..
            } = part
            {
                tracing::info!(agent = %agent, tool = %tool_name, is_error, "tool result");
                self.publish(SwarmEvent::ToolCalled {
                    agent: agent.clone(),
                    tool: tool_name.clone(),
                    result: result.clone(),
                    is_error: *is_error,
                });
            }
        }
    }
}

/// True when `text` repeats the last result produced in the same completion.
fn echoes_own_result(text: &str, completion: &Completion) -> bool {
    completion
        .tool_results
        .last()
        .and_then(|r| outcome_payload(&r.outcome))
        .is_some_and(|v: Value| result_text(&v) == text)
}

/// An agent bound to a swarm.
pub struct SwarmAgent<'a> {
    swarm: &'a Swarm,
    agent: Arc<Agent>,
}

impl SwarmAgent<'_> {
    pub fn id(&self) -> &AgentId {
        self.agent.id()
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    /// One raw model call for this agent, tools executed, nothing recorded.
    pub async fn generate(
        &self,
        history: &[Message],
        context: &ContextVariables,
    ) -> Result<Completion, SwarmError> {
        self.swarm
            .adapter
            .complete(&self.agent, history, context, &CompletionOptions::default())
            .await
            .map_err(|source| SwarmError::Completion {
                agent: self.agent.id().clone(),
                source,
            })
    }

    /// Start a run with this agent active.
    pub async fn run(&self, messages: &[Message], options: RunOptions) -> Result<RunResult, SwarmError> {
        self.swarm.run(self.agent.id(), messages, options).await
    }
}

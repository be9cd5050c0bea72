// ABOUTME: Tool specifications: action tools with executors, synthesized handoff tools, terminal tools.
// ABOUTME: Tool execution yields a ToolOutcome that is either plain output or a handoff signal.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

use crate::agent::AgentId;
use crate::context::ContextVariables;
use crate::schema::{ParameterSchema, ToolArgs};

/// Something an action tool runs when the model invokes it. Arguments have
/// already been validated against the tool's schema.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, args: ToolArgs) -> anyhow::Result<ToolOutput>;
}

type BoxedToolFn = dyn Fn(ToolArgs) -> BoxFuture<'static, anyhow::Result<ToolOutput>> + Send + Sync;

/// Adapts an async closure into a [`ToolExecutor`].
pub struct FnTool {
    func: Box<BoxedToolFn>,
}

impl FnTool {
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ToolOutput>> + Send + 'static,
    {
        Self {
            func: Box::new(move |args| func(args).boxed()),
        }
    }
}

#[async_trait]
impl ToolExecutor for FnTool {
    async fn execute(&self, args: ToolArgs) -> anyhow::Result<ToolOutput> {
        (self.func)(args).await
    }
}

/// Where a handoff points. Either the target id itself or a zero-argument
/// callable producing it; the orchestrator resolves both the same way.
#[derive(Clone)]
pub enum HandoffTarget {
    Direct(AgentId),
    Deferred(Arc<dyn Fn() -> AgentId + Send + Sync>),
}

impl HandoffTarget {
    pub fn deferred<F>(func: F) -> Self
    where
        F: Fn() -> AgentId + Send + Sync + 'static,
    {
        HandoffTarget::Deferred(Arc::new(func))
    }

    /// The agent this handoff transfers control to.
    pub fn resolve(&self) -> AgentId {
        match self {
            HandoffTarget::Direct(id) => id.clone(),
            HandoffTarget::Deferred(func) => func(),
        }
    }
}

impl fmt::Debug for HandoffTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoffTarget::Direct(id) => f.debug_tuple("Direct").field(id).finish(),
            HandoffTarget::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// What a tool invocation produced.
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    Text(String),
    Structured(Value),
    /// Transfer control to another agent. Never written to history as-is.
    Handoff(HandoffTarget),
}

/// A tool's outcome plus any context-variable updates it wants merged.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub outcome: ToolOutcome,
    pub context_variables: ContextVariables,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_outcome(ToolOutcome::Text(text.into()))
    }

    pub fn structured(value: Value) -> Self {
        Self::from_outcome(ToolOutcome::Structured(value))
    }

    pub fn handoff(target: HandoffTarget) -> Self {
        Self::from_outcome(ToolOutcome::Handoff(target))
    }

    fn from_outcome(outcome: ToolOutcome) -> Self {
        Self {
            outcome,
            context_variables: ContextVariables::new(),
        }
    }

    /// Request that `key` be set in the run's context variables.
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context_variables.insert(key.into(), value);
        self
    }
}

impl From<String> for ToolOutput {
    fn from(text: String) -> Self {
        ToolOutput::text(text)
    }
}

impl From<&str> for ToolOutput {
    fn from(text: &str) -> Self {
        ToolOutput::text(text)
    }
}

/// How a tool behaves when invoked.
#[derive(Clone)]
pub enum ToolKind {
    Action(Arc<dyn ToolExecutor>),
    Handoff(HandoffTarget),
    /// No executor: the call's arguments are the final structured answer.
    Terminal,
}

impl fmt::Debug for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolKind::Action(_) => f.write_str("Action(..)"),
            ToolKind::Handoff(target) => f.debug_tuple("Handoff").field(target).finish(),
            ToolKind::Terminal => f.write_str("Terminal"),
        }
    }
}

/// A named, described, schema-validated capability of an agent.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
    pub kind: ToolKind,
}

impl ToolSpec {
    /// A tool backed by an executor.
    pub fn action(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
        executor: Arc<dyn ToolExecutor>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            kind: ToolKind::Action(executor),
        }
    }

    /// A tool backed by an async closure.
    pub fn from_fn<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
        func: F,
    ) -> Self
    where
        F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ToolOutput>> + Send + 'static,
    {
        Self::action(name, description, parameters, Arc::new(FnTool::new(func)))
    }

    /// A tool with no executor, used to force a structured final answer.
    pub fn terminal(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            kind: ToolKind::Terminal,
        }
    }

    pub fn is_handoff(&self) -> bool {
        matches!(self.kind, ToolKind::Handoff(_))
    }

    /// The model-facing definition of this tool.
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.to_json_schema(),
        }
    }
}

/// Provider-agnostic tool description sent with each model call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

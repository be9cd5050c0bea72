// ABOUTME: Core types for the handoff swarm: agents, tools, messages, handoff graph and guards.
// ABOUTME: Pure data and wiring logic; all I/O lives in handoff-agent.

pub mod agent;
pub mod context;
pub mod error;
pub mod graph;
pub mod guard;
pub mod handoff;
pub mod message;
pub mod outcome;
pub mod registry;
pub mod schema;
pub mod tool;

pub use agent::{Agent, AgentBuilder, AgentId, GenerationSettings, Instructions, ToolChoice};
pub use context::{ContextVariables, merge_context};
pub use error::ConfigError;
pub use graph::{AgentGraph, AgentGraphBuilder, HandoffEdge};
pub use handoff::{handoff_tool_name, make_handoff_tool};
pub use message::{ContentPart, Message, MessageContent, Role, ToolCall};
pub use outcome::{RunOutcome, RunResult, TurnOutcome};
pub use registry::{AgentTool, ToolRegistry};
pub use schema::{ParamType, ParameterSchema, ToolArgs, ValidationError};
pub use tool::{HandoffTarget, ToolDefinition, ToolKind, ToolOutcome, ToolOutput, ToolSpec};

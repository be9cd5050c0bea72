// ABOUTME: Normalizes an agent's mixed list of tools and handoff references into a name-keyed registry.
// ABOUTME: Handoff references become synthesized transfer tools; duplicate names fail fast.

use std::collections::HashMap;

use crate::agent::AgentId;
use crate::error::ConfigError;
use crate::handoff::make_handoff_tool;
use crate::tool::{ToolDefinition, ToolSpec};

/// Maximum tool name length accepted by common completion APIs.
const MAX_TOOL_NAME_LEN: usize = 64;

/// One entry in an agent's tool list: a plain tool, or a reference to an
/// agent that control can be handed to.
#[derive(Debug, Clone)]
pub enum AgentTool {
    Tool(ToolSpec),
    Handoff(AgentId),
}

impl From<ToolSpec> for AgentTool {
    fn from(spec: ToolSpec) -> Self {
        AgentTool::Tool(spec)
    }
}

impl From<AgentId> for AgentTool {
    fn from(id: AgentId) -> Self {
        AgentTool::Handoff(id)
    }
}

/// Ordered, name-keyed tool set consumed by the completion adapter.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolSpec>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Convert `entries` into a registry for the agent `owner`. Tool order is
    /// preserved. Fails on invalid or duplicate tool names, including a plain
    /// tool colliding with a synthesized `transferTo<id>` name.
    pub fn normalize(owner: &AgentId, entries: &[AgentTool]) -> Result<Self, ConfigError> {
        let mut registry = Self::default();

        for entry in entries {
            let spec = match entry {
                AgentTool::Tool(spec) => spec.clone(),
                AgentTool::Handoff(target) => make_handoff_tool(target),
            };

            if !is_valid_tool_name(&spec.name) {
                return Err(ConfigError::InvalidToolName(spec.name));
            }
            if registry.index.contains_key(&spec.name) {
                return Err(ConfigError::DuplicateTool {
                    agent: owner.to_string(),
                    name: spec.name,
                });
            }

            registry.index.insert(spec.name.clone(), registry.tools.len());
            registry.tools.push(spec);
        }

        tracing::debug!(agent = %owner, tools = registry.tools.len(), "normalized tool registry");
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Model-facing definitions of every tool, in declaration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(ToolSpec::definition).collect()
    }
}

fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_TOOL_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

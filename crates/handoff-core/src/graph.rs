// ABOUTME: Two-phase wiring of agents into a handoff graph: register agents, then add edges.
// ABOUTME: The built graph is an arena of shared agents plus an inspectable handoff edge list.

use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::{Agent, AgentId};
use crate::error::ConfigError;
use crate::registry::AgentTool;

/// A directed "may hand off to" relation between two agents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandoffEdge {
    pub from: AgentId,
    pub to: AgentId,
}

impl HandoffEdge {
    pub fn new(from: AgentId, to: AgentId) -> Self {
        Self { from, to }
    }
}

/// The wired set of agents for a swarm. Immutable once built; agents are
/// shared by `Arc` and never copied by a run.
#[derive(Debug, Clone, Default)]
pub struct AgentGraph {
    agents: Vec<Arc<Agent>>,
    index: HashMap<AgentId, usize>,
    edges: Vec<HandoffEdge>,
}

impl AgentGraph {
    pub fn builder() -> AgentGraphBuilder {
        AgentGraphBuilder::default()
    }

    /// Wire `agents` with `edges` in one step.
    pub fn wire(
        agents: impl IntoIterator<Item = Agent>,
        edges: impl IntoIterator<Item = HandoffEdge>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        for agent in agents {
            builder = builder.agent(agent);
        }
        for edge in edges {
            builder = builder.handoff(edge.from, edge.to);
        }
        builder.build()
    }

    pub fn get(&self, id: &AgentId) -> Option<&Arc<Agent>> {
        self.index.get(id).map(|&i| &self.agents[i])
    }

    /// Look up an agent by raw id string.
    pub fn get_by_name(&self, id: &str) -> Option<&Arc<Agent>> {
        self.agents.iter().find(|a| a.id().as_str() == id)
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.index.contains_key(id)
    }

    /// Agents in registration order.
    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    /// Every handoff edge, whether declared on the agent or added while wiring.
    pub fn edges(&self) -> &[HandoffEdge] {
        &self.edges
    }

    /// The agents `from` may hand off to, in declaration order.
    pub fn handoff_targets(&self, from: &AgentId) -> Vec<&AgentId> {
        self.edges
            .iter()
            .filter(|e| &e.from == from)
            .map(|e| &e.to)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Collects agents and edges; `build` validates the whole graph at once.
#[derive(Debug, Default)]
pub struct AgentGraphBuilder {
    agents: Vec<Agent>,
    edges: Vec<HandoffEdge>,
}

impl AgentGraphBuilder {
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Let `from` hand off to `to`. Cycles are allowed.
    pub fn handoff(mut self, from: AgentId, to: AgentId) -> Self {
        self.edges.push(HandoffEdge::new(from, to));
        self
    }

    /// Validate ids and edges, attach a handoff tool per edge, and freeze.
    pub fn build(self) -> Result<AgentGraph, ConfigError> {
        let mut index = HashMap::new();
        for (i, agent) in self.agents.iter().enumerate() {
            if index.insert(agent.id().clone(), i).is_some() {
                return Err(ConfigError::DuplicateAgent(agent.id().to_string()));
            }
        }

        let mut edges = Vec::new();
        for agent in &self.agents {
            for tool in agent.tools() {
                if let AgentTool::Handoff(target) = tool {
                    edges.push(HandoffEdge::new(agent.id().clone(), target.clone()));
                }
            }
        }

        let mut agents = self.agents;
        for edge in &self.edges {
            let Some(&from) = index.get(&edge.from) else {
                return Err(ConfigError::UnknownAgent(edge.from.to_string()));
            };
            agents[from].extend_tools([AgentTool::Handoff(edge.to.clone())])?;
        }
        edges.extend(self.edges);

        if let Some(edge) = edges.iter().find(|e| !index.contains_key(&e.to)) {
            return Err(ConfigError::UnknownAgent(edge.to.to_string()));
        }

        tracing::debug!(agents = agents.len(), edges = edges.len(), "wired agent graph");

        Ok(AgentGraph {
            agents: agents.into_iter().map(Arc::new).collect(),
            index,
            edges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> AgentId {
        AgentId::new(raw).unwrap()
    }

    fn agent(raw: &str) -> Agent {
        Agent::builder(raw).build().unwrap()
    }

    #[test]
    fn cyclic_handoffs_wire_both_directions() {
        let graph = AgentGraph::builder()
            .agent(agent("Triage"))
            .agent(agent("Weather"))
            .handoff(id("Triage"), id("Weather"))
            .handoff(id("Weather"), id("Triage"))
            .build()
            .unwrap();

        let triage = graph.get(&id("Triage")).unwrap();
        let weather = graph.get(&id("Weather")).unwrap();
        assert_eq!(triage.registry().names(), vec!["transferToWeather"]);
        assert_eq!(weather.registry().names(), vec!["transferToTriage"]);
        assert_eq!(graph.handoff_targets(&id("Triage")), vec![&id("Weather")]);
        assert_eq!(graph.edges().len(), 2);
    }

    #[test]
    fn declared_handoffs_become_edges() {
        let triage = Agent::builder("Triage").handoff(id("Email")).build().unwrap();
        let graph = AgentGraph::wire([triage, agent("Email")], []).unwrap();

        assert_eq!(graph.edges(), &[HandoffEdge::new(id("Triage"), id("Email"))]);
        assert!(graph.get_by_name("Email").is_some());
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn duplicate_agents_fail() {
        let err = AgentGraph::wire([agent("Triage"), agent("Triage")], []).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateAgent("Triage".to_string()));
    }

    #[test]
    fn edges_to_or_from_unknown_agents_fail() {
        let err = AgentGraph::wire(
            [agent("Triage")],
            [HandoffEdge::new(id("Triage"), id("Ghost"))],
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::UnknownAgent("Ghost".to_string()));

        let err = AgentGraph::wire(
            [agent("Triage")],
            [HandoffEdge::new(id("Ghost"), id("Triage"))],
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::UnknownAgent("Ghost".to_string()));

        let declared = Agent::builder("Triage").handoff(id("Ghost")).build().unwrap();
        assert!(AgentGraph::wire([declared], []).is_err());
    }

    #[test]
    fn repeated_edge_is_a_duplicate_tool() {
        let err = AgentGraph::builder()
            .agent(agent("Triage"))
            .agent(agent("Weather"))
            .handoff(id("Triage"), id("Weather"))
            .handoff(id("Triage"), id("Weather"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTool { .. }));
    }
}

// ABOUTME: Agent identity and configuration: validated id, model, instructions, tools, generation settings.
// ABOUTME: Agents are built once during wiring and shared by reference across every run.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::ContextVariables;
use crate::error::ConfigError;
use crate::registry::{AgentTool, ToolRegistry};
use crate::tool::ToolSpec;

/// Each model call performs exactly one step; the orchestrator drives any
/// multi-step behavior.
pub const MAX_STEPS_PER_CALL: u32 = 1;

/// A validated agent identifier. Only `[a-zA-Z0-9_]` is allowed because the
/// id is embedded in synthesized tool names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigError> {
        let id = id.into();
        let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(Self(id))
        } else {
            Err(ConfigError::InvalidAgentId(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AgentId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AgentId::new(value)
    }
}

impl From<AgentId> for String {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An agent's system prompt, either fixed or rendered from context variables.
#[derive(Clone)]
pub enum Instructions {
    Static(String),
    Dynamic(Arc<dyn Fn(&ContextVariables) -> String + Send + Sync>),
}

impl Instructions {
    /// The system prompt for a call made with `context`.
    pub fn render(&self, context: &ContextVariables) -> String {
        match self {
            Instructions::Static(text) => text.clone(),
            Instructions::Dynamic(func) => func(context),
        }
    }
}

impl Default for Instructions {
    fn default() -> Self {
        Instructions::Static("You are a helpful agent.".to_string())
    }
}

impl fmt::Debug for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instructions::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Instructions::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Whether the model may, must, or must not call tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
    Required,
    None,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::Required => "required",
            ToolChoice::None => "none",
        }
    }
}

/// Default generation parameters applied to every call an agent makes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationSettings {
    pub tool_choice: ToolChoice,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub parallel_tool_calls: Option<bool>,
}

/// A named bundle of model, instructions, and tools.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    model: Option<String>,
    instructions: Instructions,
    tools: Vec<AgentTool>,
    registry: ToolRegistry,
    settings: GenerationSettings,
}

impl Agent {
    /// Start building an agent. The id is validated by [`AgentBuilder::build`].
    pub fn builder(id: impl Into<String>) -> AgentBuilder {
        AgentBuilder {
            id: id.into(),
            model: None,
            instructions: Instructions::default(),
            tools: Vec::new(),
            settings: GenerationSettings::default(),
        }
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    /// The model this agent asks for, or None to use the client default.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn instructions(&self) -> &Instructions {
        &self.instructions
    }

    /// The tool list as declared, handoff references included.
    pub fn tools(&self) -> &[AgentTool] {
        &self.tools
    }

    /// The normalized, name-keyed tool set.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn max_steps(&self) -> u32 {
        MAX_STEPS_PER_CALL
    }

    /// Append tool entries and re-normalize. Only called while wiring, before
    /// the agent is shared.
    pub(crate) fn extend_tools(
        &mut self,
        entries: impl IntoIterator<Item = AgentTool>,
    ) -> Result<(), ConfigError> {
        let mut tools = self.tools.clone();
        tools.extend(entries);
        self.registry = ToolRegistry::normalize(&self.id, &tools)?;
        self.tools = tools;
        Ok(())
    }
}

/// Builder for [`Agent`]. Validation happens once, in `build`.
pub struct AgentBuilder {
    id: String,
    model: Option<String>,
    instructions: Instructions,
    tools: Vec<AgentTool>,
    settings: GenerationSettings,
}

impl AgentBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn instructions(mut self, text: impl Into<String>) -> Self {
        self.instructions = Instructions::Static(text.into());
        self
    }

    /// Render the system prompt from the running context variables on every call.
    pub fn dynamic_instructions<F>(mut self, func: F) -> Self
    where
        F: Fn(&ContextVariables) -> String + Send + Sync + 'static,
    {
        self.instructions = Instructions::Dynamic(Arc::new(func));
        self
    }

    pub fn tool(mut self, spec: ToolSpec) -> Self {
        self.tools.push(AgentTool::Tool(spec));
        self
    }

    /// Declare a handoff to the agent with `target` id.
    pub fn handoff(mut self, target: AgentId) -> Self {
        self.tools.push(AgentTool::Handoff(target));
        self
    }

    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.settings.tool_choice = choice;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.settings.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.settings.max_tokens = Some(max_tokens);
        self
    }

    pub fn parallel_tool_calls(mut self, enabled: bool) -> Self {
        self.settings.parallel_tool_calls = Some(enabled);
        self
    }

    /// Validate the id and tool names and produce the agent.
    pub fn build(self) -> Result<Agent, ConfigError> {
        let id = AgentId::new(self.id)?;
        let registry = ToolRegistry::normalize(&id, &self.tools)?;
        Ok(Agent {
            id,
            model: self.model,
            instructions: self.instructions,
            tools: self.tools,
            registry,
            settings: self.settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParameterSchema;
    use crate::tool::ToolOutput;
    use serde_json::json;

    #[test]
    fn agent_id_accepts_identifier_charset_only() {
        assert!(AgentId::new("Weather_Agent_2").is_ok());
        for bad in ["", "Weather Agent", "weather-agent", "agent!", "ägent"] {
            assert_eq!(
                AgentId::new(bad),
                Err(ConfigError::InvalidAgentId(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn agent_id_deserialization_validates() {
        let ok: AgentId = serde_json::from_value(json!("Triage")).unwrap();
        assert_eq!(ok.as_str(), "Triage");
        assert!(serde_json::from_value::<AgentId>(json!("not valid")).is_err());
    }

    #[test]
    fn build_rejects_invalid_id() {
        let err = Agent::builder("bad id").build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidAgentId("bad id".to_string()));
    }

    #[test]
    fn build_normalizes_tools_and_keeps_settings() {
        let agent = Agent::builder("Weather")
            .model("gpt-4o-mini")
            .instructions("You are a weather agent.")
            .tool(ToolSpec::from_fn("weather", "Weather", ParameterSchema::new(), |_| async {
                Ok(ToolOutput::text("sunny"))
            }))
            .handoff(AgentId::new("Triage").unwrap())
            .tool_choice(ToolChoice::Required)
            .temperature(0.2)
            .build()
            .unwrap();

        assert_eq!(agent.id().as_str(), "Weather");
        assert_eq!(agent.model(), Some("gpt-4o-mini"));
        assert_eq!(agent.registry().names(), vec!["weather", "transferToTriage"]);
        assert_eq!(agent.tools().len(), 2);
        assert_eq!(agent.settings().tool_choice, ToolChoice::Required);
        assert_eq!(agent.settings().temperature, Some(0.2));
        assert_eq!(agent.max_steps(), 1);
    }

    #[test]
    fn dynamic_instructions_render_from_context() {
        let agent = Agent::builder("Greeter")
            .dynamic_instructions(|ctx| {
                let name = ctx.get("name").and_then(|v| v.as_str()).unwrap_or("friend");
                format!("Greet {name} warmly.")
            })
            .build()
            .unwrap();

        let mut ctx = ContextVariables::new();
        assert_eq!(agent.instructions().render(&ctx), "Greet friend warmly.");
        ctx.insert("name".to_string(), json!("Ada"));
        assert_eq!(agent.instructions().render(&ctx), "Greet Ada warmly.");
    }

    #[test]
    fn extend_tools_rejects_duplicates_and_leaves_agent_unchanged() {
        let mut agent = Agent::builder("Triage")
            .handoff(AgentId::new("Weather").unwrap())
            .build()
            .unwrap();

        let err = agent
            .extend_tools([AgentTool::Handoff(AgentId::new("Weather").unwrap())])
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTool { .. }));
        assert_eq!(agent.registry().len(), 1);

        agent
            .extend_tools([AgentTool::Handoff(AgentId::new("Email").unwrap())])
            .unwrap();
        assert_eq!(agent.registry().names(), vec!["transferToWeather", "transferToEmail"]);
    }
}

// ABOUTME: Factory for the synthesized transferTo<id> tools that signal agent handoffs.
// ABOUTME: Invoking one carries no payload; the handoff target is the whole message.

use crate::agent::AgentId;
use crate::schema::ParameterSchema;
use crate::tool::{HandoffTarget, ToolKind, ToolSpec};

/// Prefix of every synthesized handoff tool name.
pub const HANDOFF_TOOL_PREFIX: &str = "transferTo";

/// The parameter a model fills with the target agent id to confirm a transfer.
pub const HANDOFF_AGENT_PARAM: &str = "agentId";

/// The deterministic tool name for a handoff to `target`.
pub fn handoff_tool_name(target: &AgentId) -> String {
    format!("{HANDOFF_TOOL_PREFIX}{target}")
}

/// Build the handoff tool for `target`. Its only parameter is a literal that
/// accepts exactly the target's id.
pub fn make_handoff_tool(target: &AgentId) -> ToolSpec {
    make_handoff_tool_with(target, HandoffTarget::Direct(target.clone()))
}

/// Build a handoff tool for `target` whose transfer is resolved through the
/// given `resolver` (for example a deferred lookup).
pub fn make_handoff_tool_with(target: &AgentId, resolver: HandoffTarget) -> ToolSpec {
    ToolSpec {
        name: handoff_tool_name(target),
        description: format!("A tool to transfer responsibility to the {target} agent."),
        parameters: ParameterSchema::new().literal(
            HANDOFF_AGENT_PARAM,
            target.as_str(),
            &format!("The id of the {target} agent."),
        ),
        kind: ToolKind::Handoff(resolver),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextVariables;
    use serde_json::json;

    #[test]
    fn handoff_tool_is_named_after_target() {
        let target = AgentId::new("Weather_Agent").unwrap();
        let tool = make_handoff_tool(&target);

        assert_eq!(tool.name, "transferToWeather_Agent");
        assert!(tool.is_handoff());
        assert!(tool.description.contains("Weather_Agent"));
        match &tool.kind {
            ToolKind::Handoff(resolver) => assert_eq!(resolver.resolve(), target),
            other => panic!("expected handoff kind, got {:?}", other),
        }
    }

    #[test]
    fn handoff_tool_rejects_other_agent_ids() {
        let target = AgentId::new("Weather").unwrap();
        let tool = make_handoff_tool(&target);
        let ctx = ContextVariables::new();

        assert!(tool.parameters.validate(&json!({"agentId": "Weather"}), &ctx).is_ok());
        assert!(tool.parameters.validate(&json!({"agentId": "Email"}), &ctx).is_err());
        assert!(tool.parameters.validate(&json!({}), &ctx).is_err());
    }

    #[test]
    fn deferred_resolver_is_kept() {
        let target = AgentId::new("Email").unwrap();
        let captured = target.clone();
        let tool = make_handoff_tool_with(&target, HandoffTarget::deferred(move || captured.clone()));
        match &tool.kind {
            ToolKind::Handoff(HandoffTarget::Deferred(func)) => assert_eq!(func(), target),
            other => panic!("expected deferred handoff, got {:?}", other),
        }
    }
}

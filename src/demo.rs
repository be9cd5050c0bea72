// ABOUTME: Demo agent graph: a triage agent that hands off to weather and email specialists.
// ABOUTME: Specialists hand back to triage, so the graph is cyclic.

use handoff_core::{Agent, AgentGraph, AgentId, ConfigError, ParamType, ParameterSchema, ToolOutput, ToolSpec};

pub const TRIAGE_AGENT: &str = "Triage_Agent";
pub const WEATHER_AGENT: &str = "Weather_Agent";
pub const EMAIL_AGENT: &str = "Email_Agent";

/// The first message shown before the user's prompt.
pub const GREETING: &str = "Hey, would you like to know about the weather or send an email?";

const TRIAGE_INSTRUCTIONS: &str = "You are to answer the user's questions. \
    If you are unable to answer the question, you should transfer responsibility to another \
    agent to retrieve additional information to inform your answer.";

const WEATHER_INSTRUCTIONS: &str = "You are a weather agent. You need to provide the weather. \
    You can only use the weather tool to answer the question. \
    You should attempt to resolve the user's request based on the tools you have available. \
    After which, if you are still unable to fulfil the user's request you should transfer \
    responsibility to another agent.";

const EMAIL_INSTRUCTIONS: &str = "You are an email agent. You need to send an email. \
    Once you have enough information you should request for the user to confirm the email details. \
    You should attempt to resolve the user's request based on the tools you have available. \
    After which, if you are still unable to fulfil the user's request you should transfer \
    responsibility to another agent.";

pub fn weather_tool() -> ToolSpec {
    ToolSpec::from_fn(
        "weather",
        "A tool for providing the weather.",
        ParameterSchema::new().required("location", ParamType::String, "The location to get weather for"),
        |args| async move {
            let location = args.get("location").and_then(|v| v.as_str()).unwrap_or_default();
            Ok(ToolOutput::text(format!("The weather in {location} is sunny.")))
        },
    )
}

pub fn email_tool() -> ToolSpec {
    ToolSpec::from_fn(
        "email",
        "A tool for sending an email.",
        ParameterSchema::new()
            .required("to", ParamType::String, "The email address of the recipient")
            .required("subject", ParamType::String, "The subject of the email")
            .required("body", ParamType::String, "The body of the email"),
        |args| async move {
            let field = |key: &str| args.get(key).and_then(|v| v.as_str()).unwrap_or_default().to_string();
            let (to, subject, body) = (field("to"), field("subject"), field("body"));
            Ok(ToolOutput::text(format!(
                "Email sent to {to} with subject \"{subject}\" and body \"{body}\"."
            ))
            .with_context("last_email_to", serde_json::Value::String(to)))
        },
    )
}

/// Wire triage to both specialists and both specialists back to triage.
pub fn demo_graph() -> Result<AgentGraph, ConfigError> {
    let triage = Agent::builder(TRIAGE_AGENT)
        .instructions(TRIAGE_INSTRUCTIONS)
        .build()?;
    let weather = Agent::builder(WEATHER_AGENT)
        .instructions(WEATHER_INSTRUCTIONS)
        .tool(weather_tool())
        .build()?;
    let email = Agent::builder(EMAIL_AGENT)
        .model("gpt-4o-mini")
        .instructions(EMAIL_INSTRUCTIONS)
        .tool(email_tool())
        .build()?;

    let triage_id = AgentId::new(TRIAGE_AGENT)?;
    let weather_id = AgentId::new(WEATHER_AGENT)?;
    let email_id = AgentId::new(EMAIL_AGENT)?;

    AgentGraph::builder()
        .agent(triage)
        .agent(weather)
        .agent(email)
        .handoff(triage_id.clone(), weather_id.clone())
        .handoff(triage_id.clone(), email_id.clone())
        .handoff(weather_id, triage_id.clone())
        .handoff(email_id, triage_id)
        .build()
}

// ABOUTME: Entry point for the handoff binary.
// ABOUTME: Loads configuration, wires the demo agents, runs one conversation turn and prints the transcript.

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;

use handoff::demo::{GREETING, TRIAGE_AGENT, demo_graph};
use handoff::transcript;
use handoff_agent::{RunOptions, Swarm, SwarmConfig, SwarmEvent, create_llm_client};
use handoff_core::{AgentId, Message, RunOutcome};

/// Run one prompt through the triage / weather / email agent swarm.
#[derive(Debug, Parser)]
#[command(name = "handoff", version, about)]
struct Cli {
    /// Agent that receives the prompt.
    #[arg(long, default_value = TRIAGE_AGENT)]
    agent: String,

    /// Maximum history growth for the run (overrides HANDOFF_MAX_TURNS).
    #[arg(long)]
    max_turns: Option<usize>,

    /// Model for every call in the run (overrides HANDOFF_MODEL).
    #[arg(long)]
    model: Option<String>,

    /// Log per-turn debug dumps.
    #[arg(long)]
    debug: bool,

    /// Record tool calls without executing them.
    #[arg(long)]
    no_tools: bool,

    /// The user's message.
    #[arg(required = true, num_args = 1..)]
    prompt: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "handoff=debug,handoff_agent=debug,handoff_core=debug"
    } else {
        "handoff=info,handoff_agent=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let config = SwarmConfig::from_env().context("invalid HANDOFF_* configuration")?;
    let model = cli.model.clone().or_else(|| config.model.clone());
    let (client, resolved_model) = create_llm_client(&config.provider, model.as_deref())?;
    tracing::info!(provider = %config.provider, model = %resolved_model, "handoff starting up");

    let swarm = Swarm::new(demo_graph()?, client);
    let agent = AgentId::new(cli.agent.as_str())?;

    let mut options = RunOptions::from_config(&config)
        .debug(cli.debug || config.debug)
        .execute_tools(!cli.no_tools);
    if let Some(max_turns) = cli.max_turns {
        options = options.max_turns(max_turns);
    }
    if let Some(model) = cli.model {
        options = options.model_override(model);
    }

    let mut events = swarm.subscribe();
    let watcher = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SwarmEvent::AgentSwitched { from, to }) => {
                    println!("-- {from} transferred to {to}");
                }
                Ok(SwarmEvent::RunFinished { .. } | SwarmEvent::RunFailed { .. }) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event watcher fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let messages = vec![
        Message::assistant(GREETING).with_agent(TRIAGE_AGENT),
        Message::user(cli.prompt.join(" ")),
    ];
    let result = swarm.run(&agent, &messages, options).await?;
    watcher.await.ok();

    for message in &result.messages {
        for line in transcript::render(message) {
            println!("{line}");
        }
    }

    match (result.outcome, result.agent_id()) {
        (RunOutcome::Stalled, _) => println!("-- run stopped: the agent repeated a tool result"),
        (RunOutcome::TurnLimit, Some(agent)) => {
            println!("-- turn limit reached with {agent} active")
        }
        (_, Some(agent)) => println!("-- finished with {agent} after {} turns", result.turns),
        (_, None) => {}
    }

    Ok(())
}

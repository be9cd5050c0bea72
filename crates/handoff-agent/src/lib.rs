// ABOUTME: Runtime for the handoff swarm: model clients, completion adapter and the orchestration loop.
// ABOUTME: Drives agents turn by turn over a wired handoff graph from handoff-core.

pub mod client;
pub mod completion;
pub mod config;
pub mod events;
pub mod providers;
pub mod resolution;
pub mod runtime;
pub mod swarm;
pub mod testing;

pub use client::create_llm_client;
pub use completion::{Completion, CompletionAdapter, CompletionOptions, ToolResultRecord};
pub use config::{SwarmConfig, SwarmConfigError};
pub use events::SwarmEvent;
pub use resolution::{IGNORED_TRANSFER_MARKER, TRANSFERRED_MARKER, resolve_turn};
pub use runtime::{CompletionError, GenerateRequest, GenerateResponse, LlmClient};
pub use swarm::{DEFAULT_MAX_TURNS, RunOptions, Swarm, SwarmAgent, SwarmError};

// ABOUTME: Environment-driven configuration for swarm runs and provider selection.
// ABOUTME: Reads HANDOFF_* variables with defaults and rejects malformed values.

use thiserror::Error;

use crate::swarm::DEFAULT_MAX_TURNS;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum SwarmConfigError {
    #[error("HANDOFF_MAX_TURNS must be a non-negative integer, got '{0}'")]
    InvalidMaxTurns(String),

    #[error("HANDOFF_DEBUG must be a boolean (true/false, 1/0, yes/no), got '{0}'")]
    InvalidDebug(String),
}

/// Swarm configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct SwarmConfig {
    pub max_turns: usize,
    pub debug: bool,
    pub provider: String,
    pub model: Option<String>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            debug: false,
            provider: "openai".to_string(),
            model: None,
        }
    }
}

impl SwarmConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - HANDOFF_MAX_TURNS: history growth bound per run (default: 6)
    /// - HANDOFF_DEBUG: verbose per-turn dumps (default: false)
    /// - HANDOFF_PROVIDER: LLM provider (default: openai)
    /// - HANDOFF_MODEL: model name (optional)
    pub fn from_env() -> Result<Self, SwarmConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SwarmConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_turns = match lookup("HANDOFF_MAX_TURNS").filter(|v| !v.is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| SwarmConfigError::InvalidMaxTurns(raw))?,
            None => defaults.max_turns,
        };

        let debug = match lookup("HANDOFF_DEBUG").filter(|v| !v.is_empty()) {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => return Err(SwarmConfigError::InvalidDebug(raw)),
            },
            None => defaults.debug,
        };

        let provider = lookup("HANDOFF_PROVIDER")
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults.provider);

        let model = lookup("HANDOFF_MODEL").filter(|m| !m.is_empty());

        Ok(Self {
            max_turns,
            debug,
            provider,
            model,
        })
    }
}

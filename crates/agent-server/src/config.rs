//! Server Configuration
//!
//! Everything is read from the environment (after `.env` is loaded).

use std::time::Duration;

use agent_core::{AgentConfig, AgentError, GenerationOptions};

/// Which note store backs the tools
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Weaviate,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self, AgentError> {
        match value.to_ascii_lowercase().as_str() {
            "weaviate" => Ok(StoreBackend::Weaviate),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AgentError::Config(format!("Unknown NOTE_STORE backend: {}", other))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub store: StoreBackend,
    pub agent: AgentConfig,
    /// Whole-run limit; the run is cancelled when it elapses
    pub run_timeout: Duration,
    /// Request to run once at startup
    pub startup_prompt: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            store: StoreBackend::Weaviate,
            agent: AgentConfig::default(),
            run_timeout: Duration::from_secs(120),
            startup_prompt: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, AgentError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AgentError::Config(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(None),
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AgentError> {
        let defaults = Self::default();
        let mut generation = GenerationOptions::default();

        if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
            generation.model = model;
        }
        if let Some(max_tokens) = env_parse("ANTHROPIC_MAX_TOKENS")? {
            generation.max_tokens = max_tokens;
        }
        generation.system_prompt = std::env::var("AGENT_SYSTEM_PROMPT").ok().filter(|p| !p.is_empty());

        let max_iterations = env_parse("AGENT_MAX_ITERATIONS")?
            .unwrap_or(defaults.agent.max_iterations);
        if max_iterations == 0 {
            return Err(AgentError::Config("AGENT_MAX_ITERATIONS must be at least 1".into()));
        }

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            store: match std::env::var("NOTE_STORE") {
                Ok(value) => StoreBackend::parse(&value)?,
                Err(_) => defaults.store,
            },
            agent: AgentConfig {
                max_iterations,
                generation,
                tool_timeout: env_parse::<u64>("AGENT_TOOL_TIMEOUT_SECS")?.map(Duration::from_secs),
            },
            run_timeout: env_parse::<u64>("AGENT_RUN_TIMEOUT_SECS")?
                .map_or(defaults.run_timeout, Duration::from_secs),
            startup_prompt: std::env::var("AGENT_PROMPT").ok().filter(|p| !p.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.store, StoreBackend::Weaviate);
        assert_eq!(config.agent.max_iterations, 10);
        assert!(config.startup_prompt.is_none());
    }

    #[test]
    fn test_store_backend_parsing() {
        assert_eq!(StoreBackend::parse("Memory").unwrap(), StoreBackend::Memory);
        assert_eq!(StoreBackend::parse("weaviate").unwrap(), StoreBackend::Weaviate);
        assert!(StoreBackend::parse("sqlite").is_err());
    }
}

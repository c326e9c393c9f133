// src/utils/config.rs
//! Engine configuration
//!
//! Layered configuration: an optional `arena.toml` file overridden by
//! `ARENA__*` environment variables (e.g. `ARENA__SERVER__PORT=9000`).

use crate::utils::errors::Result;
use serde::Deserialize;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Code execution sandbox settings
    pub sandbox: SandboxConfig,

    /// Oracle (LLM provider) settings
    pub oracle: OracleConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8000 }
    }
}

/// Sandbox settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Interpreter used to run candidate solutions
    pub python_bin: String,

    /// Wall-clock timeout per test case, in seconds
    pub test_timeout_secs: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self { python_bin: "python3".to_string(), test_timeout_secs: 5 }
    }
}

/// Oracle adapter settings (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Base URL of the chat-completions API
    pub base_url: String,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("arena").required(false))
            .add_source(config::Environment::with_prefix("ARENA").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

// src/oracle/mod.rs
//! Agent oracle capability
//!
//! The core never talks to an LLM provider directly. It depends on the
//! [`AgentOracle`] trait: given a persona-framed system prompt and a running
//! conversation, produce a text response. Provider selection, authentication
//! and response-shape quirks live behind this seam.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpOracle;

/// Persona framing for one player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Crewmate,
    Imposter,
}

/// Who authored a turn in a player's private conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    /// A prompt from the game (maps to the `user` role on chat APIs)
    Game,
    /// The player's own prior response (maps to `assistant`)
    Player,
}

/// One turn in a player's private conversation log
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl ChatTurn {
    pub fn game(text: impl Into<String>) -> Self {
        Self { speaker: Speaker::Game, text: text.into() }
    }

    pub fn player(text: impl Into<String>) -> Self {
        Self { speaker: Speaker::Player, text: text.into() }
    }
}

/// One oracle call on behalf of a player
#[derive(Debug)]
pub struct OracleRequest<'a> {
    /// Stable index of the player this call is made for
    pub player_index: usize,

    /// Persona the player is playing under
    pub role: Role,

    /// Backing agent binding (model tag)
    pub agent: &'a str,

    /// System framing derived from the persona
    pub system: &'a str,

    /// The player's full conversation so far, oldest first
    pub conversation: &'a [ChatTurn],

    /// Completion budget for this call
    pub max_tokens: u32,
}

/// Provider-level failures. Always recovered by the orchestrator: the player
/// simply contributes nothing for the phase.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Abstract capability: turn a persona and conversation into a text response
#[async_trait]
pub trait AgentOracle: Send + Sync {
    async fn respond(&self, request: OracleRequest<'_>) -> Result<String, OracleError>;
}

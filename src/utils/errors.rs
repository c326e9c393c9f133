// src/utils/errors.rs
//! Error taxonomy for the arena engine
//!
//! Caller-facing failures only. Per-player oracle failures are recovered
//! inside the orchestrator and never surface here, and sandbox faults are
//! always converted into failed-test records.

use thiserror::Error;

/// Errors surfaced by game operations
#[derive(Debug, Error)]
pub enum ArenaError {
    /// Bad game setup (e.g. wrong number of agent bindings)
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Unknown game identifier
    #[error("game not found: {0}")]
    NotFound(String),

    /// Operation not valid for the game's current lifecycle status
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Round/task bookkeeping is missing; indicates a programming error
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Configuration loading failed
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ArenaError>;

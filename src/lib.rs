// src/lib.rs
//! Imposter Arena Engine Library
//!
//! This library provides the core components for running "LLM Among Us":
//! a social-deduction programming competition played by four LLM agents.
//!
//! # Architecture
//!
//! The engine is structured into several key modules:
//!
//! - **game**: State model, task catalog, phase engine, registry service
//! - **orchestrator**: Concurrent per-player oracle fan-out and parsing
//! - **oracle**: Chat-completion provider abstraction and HTTP adapter
//! - **sandbox**: Subprocess execution of untrusted Python submissions
//! - **api**: HTTP and WebSocket surface
//! - **utils**: Configuration and error types

// Public module exports
pub mod api;
pub mod game;
pub mod oracle;
pub mod orchestrator;
pub mod sandbox;
pub mod utils;

// Re-export commonly used types
pub use game::service::GameService;
pub use oracle::{AgentOracle, HttpOracle};
pub use utils::config::EngineConfig;
pub use utils::errors::{ArenaError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

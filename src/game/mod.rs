// src/game/mod.rs
//! Game domain: state model, task catalog, phase engine, and registry service

pub mod catalog;
pub mod engine;
pub mod model;
pub mod service;

pub use engine::GameEngine;
pub use model::{Game, GameStatus, Phase, PublicState, Winner};
pub use service::GameService;

// src/orchestrator/memory.rs
//! Per-player conversation memory
//!
//! Each game owns four ordered message logs, one per player. The log is the
//! only persistent memory an agent has: every prompt and response accumulates
//! for the life of the game and is replayed in full on each oracle call.
//! Deleting the game discards all four logs atomically.
//!
//! Concurrent phase fan-out tasks each lock only their own player's log, so
//! the per-log mutex is never contended within a phase.

use crate::game::model::PLAYER_COUNT;
use crate::oracle::ChatTurn;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One game's worth of logs, indexable by player
pub type GameLogs = Arc<Vec<Mutex<Vec<ChatTurn>>>>;

#[derive(Default)]
pub struct ConversationStore {
    games: DashMap<String, GameLogs>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs for a game, created on first use
    pub fn logs(&self, game_id: &str) -> GameLogs {
        self.games
            .entry(game_id.to_string())
            .or_insert_with(|| {
                Arc::new((0..PLAYER_COUNT).map(|_| Mutex::new(Vec::new())).collect())
            })
            .clone()
    }

    /// Drop all logs for a game
    pub fn forget(&self, game_id: &str) {
        self.games.remove(game_id);
    }

    #[cfg(test)]
    pub fn contains(&self, game_id: &str) -> bool {
        self.games.contains_key(game_id)
    }
}

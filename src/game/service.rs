// src/game/service.rs
//! Game registry and lifecycle service
//!
//! Owns every live game and serializes mutation per game: each game sits
//! behind its own async mutex, so concurrent advance calls against one game
//! queue up while distinct games progress independently. State snapshots are
//! pushed to subscribers over a broadcast channel after every mutation.

use crate::game::engine::GameEngine;
use crate::game::model::{Game, PublicState, PLAYER_COUNT};
use crate::oracle::AgentOracle;
use crate::utils::config::EngineConfig;
use crate::utils::errors::{ArenaError, Result};
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::info;
use ulid::Ulid;

/// Agent bindings used when a create request names none
pub const DEFAULT_AGENTS: [&str; PLAYER_COUNT] = [
    "claude-sonnet-4-5-20250929",
    "gpt-5",
    "gemini-2.5-pro",
    "claude-sonnet-4-5-20250929",
];

/// Broadcast buffer per game; slow subscribers drop old snapshots
const UPDATE_CHANNEL_CAPACITY: usize = 32;

struct GameHandle {
    state: Mutex<Game>,
    updates: broadcast::Sender<PublicState>,
}

pub struct GameService {
    games: DashMap<String, Arc<GameHandle>>,
    engine: GameEngine,
}

impl GameService {
    pub fn new(oracle: Arc<dyn AgentOracle>, config: &EngineConfig) -> Self {
        Self { games: DashMap::new(), engine: GameEngine::new(oracle, config) }
    }

    /// Register a new lobby game with the given agent bindings (or the
    /// defaults) and a uniformly random imposter.
    pub fn create_game(&self, bindings: Option<Vec<String>>) -> Result<PublicState> {
        let bindings = match bindings {
            Some(bindings) if bindings.len() != PLAYER_COUNT => {
                return Err(ArenaError::InvalidConfiguration(format!(
                    "expected {PLAYER_COUNT} agent bindings, got {}",
                    bindings.len()
                )));
            }
            Some(bindings) => bindings,
            None => DEFAULT_AGENTS.iter().map(|s| s.to_string()).collect(),
        };

        let game_id = Ulid::new().to_string();
        let imposter_index = rand::thread_rng().gen_range(0..PLAYER_COUNT);
        let game = Game::new(game_id.clone(), bindings, imposter_index);
        let snapshot = game.to_public();

        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        self.games
            .insert(game_id.clone(), Arc::new(GameHandle { state: Mutex::new(game), updates }));

        info!(game = %game_id, "game created");
        Ok(snapshot)
    }

    /// Transition a lobby game into its first coding phase
    pub async fn start_game(&self, game_id: &str) -> Result<PublicState> {
        let handle = self.handle(game_id)?;
        let mut game = handle.state.lock().await;

        self.engine.start(&mut game)?;
        Ok(publish(&handle, &game))
    }

    /// Run the current phase to completion and move to the next one.
    /// Concurrent calls for the same game serialize on the game lock.
    pub async fn advance_phase(&self, game_id: &str) -> Result<PublicState> {
        let handle = self.handle(game_id)?;
        let mut game = handle.state.lock().await;

        self.engine.advance(&mut game).await?;
        Ok(publish(&handle, &game))
    }

    /// Current snapshot, imposter redacted until the game finishes
    pub async fn get_state(&self, game_id: &str) -> Result<PublicState> {
        let handle = self.handle(game_id)?;
        let game = handle.state.lock().await;
        Ok(game.to_public())
    }

    /// Drop a game and its conversation memory
    pub fn delete_game(&self, game_id: &str) -> Result<()> {
        self.games
            .remove(game_id)
            .ok_or_else(|| ArenaError::NotFound(format!("game {game_id}")))?;
        self.engine.forget_game(game_id);
        info!(game = %game_id, "game deleted");
        Ok(())
    }

    /// Receiver for state snapshots pushed after every mutation
    pub fn subscribe(&self, game_id: &str) -> Result<broadcast::Receiver<PublicState>> {
        Ok(self.handle(game_id)?.updates.subscribe())
    }

    fn handle(&self, game_id: &str) -> Result<Arc<GameHandle>> {
        self.games
            .get(game_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ArenaError::NotFound(format!("game {game_id}")))
    }
}

fn publish(handle: &GameHandle, game: &Game) -> PublicState {
    let snapshot = game.to_public();
    // Nobody listening is fine
    let _ = handle.updates.send(snapshot.clone());
    snapshot
}

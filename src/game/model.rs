// src/game/model.rs
//! Core data model for the arena
//!
//! The `Game` aggregate owns everything for one match: four players, the
//! rounds played so far, and the phase bookkeeping. Wire names are camelCase
//! to match the original frontend contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fixed number of players per game
pub const PLAYER_COUNT: usize = 4;

/// Rounds played before the imposter wins by surviving
pub const MAX_ROUNDS: usize = 5;

/// Shipped failures that hand the imposter the win
pub const MAX_FAILED_TASKS: u32 = 3;

/// Discussion sub-rounds per round
pub const DISCUSSION_ROUNDS: u32 = 3;

/// Game lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Lobby,
    InProgress,
    Finished,
}

/// Phase within a round, in strict order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lobby,
    Coding,
    Reveal,
    Discussion,
    Voting,
    Results,
    Finished,
}

/// Winning side, set when the game finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Crewmates,
    Imposter,
}

/// One of the four competitors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Stable index, 0-3
    pub index: usize,

    /// Display name shown to other players
    pub name: String,

    /// Backing agent binding (model/persona tag)
    pub model: String,

    /// Monotonic: once set, never cleared
    pub is_eliminated: bool,
}

/// Worked example shown in the task description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub output: String,
}

/// One hidden test: positional args and the expected return value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: Vec<Value>,
    pub expected: Value,
}

/// Immutable task specification from the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub function_name: String,
    pub description: String,
    pub examples: Vec<Example>,
    pub test_cases: Vec<TestCase>,
}

/// One player's code submission for a round
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub player_index: usize,
    pub code: String,
    pub timestamp: String,
}

/// One discussion message, tagged with its sub-round
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub player_index: usize,
    pub content: String,
    pub discussion_round: u32,
}

/// One player's vote: a solution to ship and a suspect
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub voter_index: usize,
    pub solution_vote: usize,
    pub suspect_vote: usize,
}

/// One failed test with its evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedTest {
    pub test_index: usize,
    pub input: Vec<Value>,
    pub expected: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of running one submission against a task's test cases
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub passed: bool,
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: Vec<FailedTest>,
}

/// One round: task, submissions, discussion, votes, and the shipped outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub round_number: usize,
    pub task: Task,
    pub submissions: Vec<Submission>,
    pub discussion: Vec<Message>,
    pub votes: Vec<Vote>,
    pub chosen_submission: Option<usize>,
    pub suspect_votes: BTreeMap<usize, usize>,
    pub test_result: Option<TestResult>,
    pub eliminated_player: Option<usize>,
}

impl Round {
    pub fn new(round_number: usize, task: Task) -> Self {
        Self {
            round_number,
            task,
            submissions: Vec::new(),
            discussion: Vec::new(),
            votes: Vec::new(),
            chosen_submission: None,
            suspect_votes: BTreeMap::new(),
            test_result: None,
            eliminated_player: None,
        }
    }
}

/// Root aggregate for one match
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub game_id: String,
    pub status: GameStatus,
    pub current_round: usize,
    pub current_phase: Phase,
    pub players: Vec<Player>,
    pub imposter_index: usize,
    pub rounds: Vec<Round>,
    pub winner: Option<Winner>,
    pub eliminated_player: Option<usize>,
    pub failed_task_count: u32,
    pub discussion_round_number: u32,
}

impl Game {
    /// Create a new game in the lobby. `bindings` must hold exactly
    /// [`PLAYER_COUNT`] entries and `imposter_index` must point at one of them.
    pub fn new(game_id: String, bindings: Vec<String>, imposter_index: usize) -> Self {
        debug_assert_eq!(bindings.len(), PLAYER_COUNT);
        debug_assert!(imposter_index < PLAYER_COUNT);

        let players = bindings
            .into_iter()
            .enumerate()
            .map(|(index, model)| Player {
                index,
                name: format!("Player {}", index + 1),
                model,
                is_eliminated: false,
            })
            .collect();

        Self {
            game_id,
            status: GameStatus::Lobby,
            current_round: 0,
            current_phase: Phase::Lobby,
            players,
            imposter_index,
            rounds: Vec::new(),
            winner: None,
            eliminated_player: None,
            failed_task_count: 0,
            discussion_round_number: 1,
        }
    }

    /// Indices of players still in the game, ascending
    pub fn active_players(&self) -> Vec<usize> {
        self.players
            .iter()
            .filter(|p| !p.is_eliminated)
            .map(|p| p.index)
            .collect()
    }

    /// Number of players still in the game
    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| !p.is_eliminated).count()
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.players.get(index).is_some_and(|p| !p.is_eliminated)
    }

    /// The round currently being played, if the game has started
    pub fn current_round_state(&self) -> Option<&Round> {
        self.current_round.checked_sub(1).and_then(|i| self.rounds.get(i))
    }

    pub fn current_round_state_mut(&mut self) -> Option<&mut Round> {
        self.current_round.checked_sub(1).and_then(|i| self.rounds.get_mut(i))
    }

    /// The round before the current one, if any
    pub fn previous_round_state(&self) -> Option<&Round> {
        self.current_round.checked_sub(2).and_then(|i| self.rounds.get(i))
    }

    /// Caller-facing view with the imposter redacted until the game finishes
    pub fn to_public(&self) -> PublicState {
        let imposter_index = if self.status == GameStatus::Finished {
            Some(self.imposter_index)
        } else {
            None
        };

        PublicState {
            game_id: self.game_id.clone(),
            status: self.status,
            current_round: self.current_round,
            current_phase: self.current_phase,
            players: self.players.clone(),
            imposter_index,
            rounds: self.rounds.clone(),
            winner: self.winner,
            eliminated_player: self.eliminated_player,
            failed_task_count: self.failed_task_count,
            discussion_round_number: self.discussion_round_number,
        }
    }
}

/// Full game aggregate with the imposter index redacted while in play
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicState {
    pub game_id: String,
    pub status: GameStatus,
    pub current_round: usize,
    pub current_phase: Phase,
    pub players: Vec<Player>,
    pub imposter_index: Option<usize>,
    pub rounds: Vec<Round>,
    pub winner: Option<Winner>,
    pub eliminated_player: Option<usize>,
    pub failed_task_count: u32,
    pub discussion_round_number: u32,
}

// src/game/engine.rs
//! Game phase state machine
//!
//! Drives one game through `coding -> reveal -> discussion (x3) -> voting ->
//! results` and either the next round or the finished state. The engine is
//! the sole mutator of a started game; callers serialize access per game.
//!
//! Win conditions are evaluated in fixed priority order at the end of every
//! results phase: imposter eliminated (crewmates win), three shipped failures
//! (imposter wins), round five complete (imposter wins).

use crate::game::catalog;
use crate::game::model::{
    Game, GameStatus, Phase, Round, Winner, DISCUSSION_ROUNDS, MAX_FAILED_TASKS, MAX_ROUNDS,
    PLAYER_COUNT,
};
use crate::oracle::AgentOracle;
use crate::orchestrator::parse::{tally_solution_votes, tally_suspect_votes};
use crate::orchestrator::prompts::PreviousRoundContext;
use crate::orchestrator::RoundOrchestrator;
use crate::sandbox::SandboxExecutor;
use crate::utils::config::EngineConfig;
use crate::utils::errors::{ArenaError, Result};
use std::sync::Arc;
use tracing::{info, warn};

pub struct GameEngine {
    orchestrator: RoundOrchestrator,
    sandbox: SandboxExecutor,
}

impl GameEngine {
    pub fn new(oracle: Arc<dyn AgentOracle>, config: &EngineConfig) -> Self {
        Self {
            orchestrator: RoundOrchestrator::new(oracle),
            sandbox: SandboxExecutor::new(&config.sandbox),
        }
    }

    /// Transition `lobby -> in_progress/coding` and materialize round 1
    pub fn start(&self, game: &mut Game) -> Result<()> {
        if game.status != GameStatus::Lobby {
            return Err(ArenaError::InvalidState(format!(
                "game {} already started",
                game.game_id
            )));
        }

        game.status = GameStatus::InProgress;
        game.current_round = 1;
        game.current_phase = Phase::Coding;
        begin_round(game, 1)?;

        info!(game = %game.game_id, "game started");
        Ok(())
    }

    /// Discard per-player conversation memory for a deleted game
    pub fn forget_game(&self, game_id: &str) {
        self.orchestrator.forget_game(game_id);
    }

    /// Perform the current phase's work and transition to the next phase
    pub async fn advance(&self, game: &mut Game) -> Result<()> {
        if game.status != GameStatus::InProgress {
            return Err(ArenaError::InvalidState(format!(
                "game {} is not in progress",
                game.game_id
            )));
        }

        let phase = game.current_phase;
        match phase {
            Phase::Coding => self.run_coding(game).await?,
            Phase::Reveal => self.run_reveal(game).await?,
            Phase::Discussion => self.run_discussion(game).await?,
            Phase::Voting => self.run_voting(game).await?,
            Phase::Results => self.run_results(game).await?,
            Phase::Lobby | Phase::Finished => {
                return Err(ArenaError::InvariantViolation(format!(
                    "in-progress game {} in phase {phase:?}",
                    game.game_id
                )));
            }
        }

        info!(game = %game.game_id, round = game.current_round, ?phase, next = ?game.current_phase, "phase complete");
        Ok(())
    }

    async fn run_coding(&self, game: &mut Game) -> Result<()> {
        // Outcome context from the previous round, if any
        let context = game
            .previous_round_state()
            .map(|prev| PreviousRoundContext {
                eliminated_player: prev.eliminated_player,
                last_task_passed: prev.test_result.as_ref().map(|r| r.passed),
            })
            .unwrap_or_default();

        let task = current_round(game)?.task.clone();
        let submissions = self.orchestrator.collect_submissions(game, &task, context).await;

        current_round_mut(game)?.submissions = submissions;
        game.current_phase = Phase::Reveal;
        Ok(())
    }

    async fn run_reveal(&self, game: &mut Game) -> Result<()> {
        let round = current_round(game)?;
        let task = round.task.clone();
        let submissions = round.submissions.clone();

        self.orchestrator.broadcast_reveal(game, &task, &submissions).await;

        game.current_phase = Phase::Discussion;
        game.discussion_round_number = 1;
        Ok(())
    }

    async fn run_discussion(&self, game: &mut Game) -> Result<()> {
        let round = current_round(game)?;
        let task = round.task.clone();
        let previous = round.discussion.clone();
        let sub_round = game.discussion_round_number;

        let messages = self.orchestrator.collect_messages(game, &task, sub_round, &previous).await;
        current_round_mut(game)?.discussion.extend(messages);

        if sub_round >= DISCUSSION_ROUNDS {
            game.current_phase = Phase::Voting;
        } else {
            game.discussion_round_number += 1;
        }
        Ok(())
    }

    async fn run_voting(&self, game: &mut Game) -> Result<()> {
        let round = current_round(game)?;
        let task = round.task.clone();
        let discussion = round.discussion.clone();

        let votes = self.orchestrator.collect_votes(game, &task, &discussion).await;

        let round = current_round_mut(game)?;
        round.chosen_submission = tally_solution_votes(&votes);
        round.suspect_votes = tally_suspect_votes(&votes);
        round.votes = votes;
        game.current_phase = Phase::Results;
        Ok(())
    }

    async fn run_results(&self, game: &mut Game) -> Result<()> {
        let round = current_round(game)?;
        let task = round.task.clone();
        let suspect_votes = round.suspect_votes.clone();

        // A chosen index with no matching submission means nothing shipped
        let chosen_code = round.chosen_submission.and_then(|chosen| {
            round
                .submissions
                .iter()
                .find(|s| s.player_index == chosen)
                .map(|s| s.code.clone())
        });

        let test_result = match chosen_code {
            Some(code) => {
                Some(self.sandbox.run_tests(&code, &task.function_name, &task.test_cases).await)
            }
            None => {
                warn!(game = %game.game_id, round = game.current_round, "no shipped solution");
                None
            }
        };

        let shipped_passed = test_result.as_ref().is_some_and(|r| r.passed);
        if !shipped_passed {
            game.failed_task_count += 1;
        }

        // Strict majority of the population active before this elimination.
        // The threshold shrinks as players drop out.
        let majority = game.active_count() / 2 + 1;
        let eliminated = (0..PLAYER_COUNT).find(|&idx| {
            game.is_active(idx) && suspect_votes.get(&idx).copied().unwrap_or(0) >= majority
        });

        if let Some(idx) = eliminated {
            game.players[idx].is_eliminated = true;
            game.eliminated_player = Some(idx);
            info!(game = %game.game_id, player = idx, "player eliminated");
        }

        let round = current_round_mut(game)?;
        round.test_result = test_result;
        round.eliminated_player = eliminated;

        if eliminated == Some(game.imposter_index) {
            finish(game, Winner::Crewmates);
        } else if game.failed_task_count >= MAX_FAILED_TASKS {
            finish(game, Winner::Imposter);
        } else if game.current_round >= MAX_ROUNDS {
            finish(game, Winner::Imposter);
        } else {
            game.current_round += 1;
            game.current_phase = Phase::Coding;
            game.discussion_round_number = 1;
            begin_round(game, game.current_round)?;
        }
        Ok(())
    }
}

fn begin_round(game: &mut Game, round_number: usize) -> Result<()> {
    let task = catalog::task_for_round(round_number).ok_or_else(|| {
        ArenaError::InvariantViolation(format!("no task for round {round_number}"))
    })?;
    game.rounds.push(Round::new(round_number, task.clone()));
    Ok(())
}

fn finish(game: &mut Game, winner: Winner) {
    game.status = GameStatus::Finished;
    game.current_phase = Phase::Finished;
    game.winner = Some(winner);
    info!(game = %game.game_id, ?winner, "game finished");
}

fn current_round<'a>(game: &'a Game) -> Result<&'a Round> {
    game.current_round_state().ok_or_else(|| {
        ArenaError::InvariantViolation(format!("game {} has no current round", game.game_id))
    })
}

fn current_round_mut<'a>(game: &'a mut Game) -> Result<&'a mut Round> {
    let game_id = game.game_id.clone();
    game.current_round_state_mut()
        .ok_or_else(|| ArenaError::InvariantViolation(format!("game {game_id} has no current round")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{OracleError, OracleRequest};
    use async_trait::async_trait;
    use std::collections::HashMap;

    const IMPOSTER: usize = 3;

    /// Deterministic oracle: answers coding prompts with a per-task solution,
    /// discussion prompts with chatter, and voting prompts with scripted
    /// per-player votes.
    struct ScriptedOracle {
        /// task title -> python source
        solutions: HashMap<&'static str, &'static str>,
        /// player index -> (1-based solution vote, 1-based suspect vote)
        votes: HashMap<usize, (usize, usize)>,
        /// players whose every call fails
        failing: Vec<usize>,
    }

    impl ScriptedOracle {
        fn correct() -> HashMap<&'static str, &'static str> {
            HashMap::from([
                (
                    "FizzBuzz",
                    "def fizzbuzz(n):\n    out = []\n    for i in range(1, n + 1):\n        if i % 15 == 0:\n            out.append(\"FizzBuzz\")\n        elif i % 3 == 0:\n            out.append(\"Fizz\")\n        elif i % 5 == 0:\n            out.append(\"Buzz\")\n        else:\n            out.append(str(i))\n    return out",
                ),
                (
                    "Valid Palindrome",
                    "def is_palindrome(s):\n    t = [c.lower() for c in s if c.isalnum()]\n    return t == t[::-1]",
                ),
                (
                    "Find Duplicates",
                    "def find_duplicates(nums):\n    seen = set()\n    dups = set()\n    for n in nums:\n        if n in seen:\n            dups.add(n)\n        seen.add(n)\n    return sorted(dups)",
                ),
                (
                    "Balanced Parentheses",
                    "def is_balanced(s):\n    pairs = {')': '(', ']': '[', '}': '{'}\n    stack = []\n    for c in s:\n        if c in '([{':\n            stack.append(c)\n        elif c in pairs:\n            if not stack or stack.pop() != pairs[c]:\n                return False\n    return not stack",
                ),
                (
                    "Roman Numeral to Integer",
                    "def roman_to_int(s):\n    values = {'I': 1, 'V': 5, 'X': 10, 'L': 50, 'C': 100, 'D': 500, 'M': 1000}\n    total = 0\n    for i, c in enumerate(s):\n        v = values[c]\n        if i + 1 < len(s) and v < values[s[i + 1]]:\n            total -= v\n        else:\n            total += v\n    return total",
                ),
            ])
        }

        fn broken() -> HashMap<&'static str, &'static str> {
            HashMap::from([
                ("FizzBuzz", "def fizzbuzz(n):\n    return []"),
                ("Valid Palindrome", "def is_palindrome(s):\n    return None"),
                ("Find Duplicates", "def find_duplicates(nums):\n    return None"),
                ("Balanced Parentheses", "def is_balanced(s):\n    return None"),
                ("Roman Numeral to Integer", "def roman_to_int(s):\n    return None"),
            ])
        }

        /// Everyone ships player 1's solution and suspects a different player,
        /// so votes never reach a majority.
        fn split_votes() -> HashMap<usize, (usize, usize)> {
            HashMap::from([(0, (1, 2)), (1, (1, 3)), (2, (1, 4)), (3, (1, 1))])
        }

        fn new(
            solutions: HashMap<&'static str, &'static str>,
            votes: HashMap<usize, (usize, usize)>,
        ) -> Self {
            Self { solutions, votes, failing: vec![] }
        }

        fn solution_for(&self, prompt: &str) -> Option<&'static str> {
            self.solutions
                .iter()
                .find(|(title, _)| prompt.contains(*title))
                .map(|(_, code)| *code)
        }
    }

    #[async_trait]
    impl AgentOracle for ScriptedOracle {
        async fn respond(&self, request: OracleRequest<'_>) -> std::result::Result<String, OracleError> {
            if self.failing.contains(&request.player_index) {
                return Err(OracleError::Provider("unavailable".into()));
            }

            let prompt = request
                .conversation
                .last()
                .map(|t| t.text.as_str())
                .unwrap_or_default();

            if prompt.contains("Submit your Python solution") {
                let code = self
                    .solution_for(prompt)
                    .ok_or_else(|| OracleError::MalformedResponse("unknown task".into()))?;
                Ok(format!("```python\n{code}\n```"))
            } else if prompt.contains("DISCUSSION ROUND") {
                Ok("The solutions look equivalent to me.".to_string())
            } else if prompt.contains("VOTING TIME") {
                let (solution, suspect) =
                    self.votes.get(&request.player_index).copied().unwrap_or((1, 1));
                Ok(format!("SOLUTION: {solution}\nSUSPECT: {suspect}\nREASON: gut feeling"))
            } else {
                Ok("Understood.".to_string())
            }
        }
    }

    fn engine(oracle: ScriptedOracle) -> GameEngine {
        GameEngine::new(Arc::new(oracle), &EngineConfig::default())
    }

    fn new_game() -> Game {
        let bindings = (0..4).map(|i| format!("agent-{i}")).collect();
        Game::new("test-game".into(), bindings, IMPOSTER)
    }

    /// Advance through one full round: coding, reveal, 3 discussions,
    /// voting, results.
    async fn play_round(engine: &GameEngine, game: &mut Game) {
        for _ in 0..7 {
            engine.advance(game).await.unwrap();
            if game.status == GameStatus::Finished {
                return;
            }
        }
    }

    #[test]
    fn test_start_materializes_round_one() {
        let engine = engine(ScriptedOracle::new(
            ScriptedOracle::correct(),
            ScriptedOracle::split_votes(),
        ));
        let mut game = new_game();

        engine.start(&mut game).unwrap();
        assert_eq!(game.status, GameStatus::InProgress);
        assert_eq!(game.current_phase, Phase::Coding);
        assert_eq!(game.current_round, 1);
        assert_eq!(game.rounds.len(), 1);
        assert_eq!(game.rounds[0].task.id, "fizzbuzz");

        // Starting twice is rejected
        assert!(matches!(engine.start(&mut game), Err(ArenaError::InvalidState(_))));
    }

    #[test]
    fn test_advance_requires_in_progress() {
        let engine = engine(ScriptedOracle::new(
            ScriptedOracle::correct(),
            ScriptedOracle::split_votes(),
        ));
        let mut game = new_game();

        let result = futures::executor::block_on(engine.advance(&mut game));
        assert!(matches!(result, Err(ArenaError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_phase_order_within_a_round() {
        let engine = engine(ScriptedOracle::new(
            ScriptedOracle::correct(),
            ScriptedOracle::split_votes(),
        ));
        let mut game = new_game();
        engine.start(&mut game).unwrap();

        engine.advance(&mut game).await.unwrap();
        assert_eq!(game.current_phase, Phase::Reveal);
        assert_eq!(game.rounds[0].submissions.len(), 4);

        engine.advance(&mut game).await.unwrap();
        assert_eq!(game.current_phase, Phase::Discussion);
        assert_eq!(game.discussion_round_number, 1);

        for expected_sub_round in [2u32, 3] {
            engine.advance(&mut game).await.unwrap();
            assert_eq!(game.discussion_round_number, expected_sub_round);
        }
        assert_eq!(game.current_phase, Phase::Discussion);

        engine.advance(&mut game).await.unwrap();
        assert_eq!(game.current_phase, Phase::Voting);
        assert_eq!(game.rounds[0].discussion.len(), 12);

        engine.advance(&mut game).await.unwrap();
        assert_eq!(game.current_phase, Phase::Results);
        assert_eq!(game.rounds[0].votes.len(), 4);
        assert_eq!(game.rounds[0].chosen_submission, Some(0));
    }

    #[tokio::test]
    async fn test_split_votes_eliminate_no_one_and_game_runs_five_rounds() {
        let engine = engine(ScriptedOracle::new(
            ScriptedOracle::correct(),
            ScriptedOracle::split_votes(),
        ));
        let mut game = new_game();
        engine.start(&mut game).unwrap();

        for round in 1..=5 {
            assert_eq!(game.current_round, round);
            play_round(&engine, &mut game).await;
            assert_eq!(game.rounds[round - 1].eliminated_player, None);
        }

        // Imposter survived all five rounds
        assert_eq!(game.status, GameStatus::Finished);
        assert_eq!(game.winner, Some(Winner::Imposter));
        assert_eq!(game.failed_task_count, 0);
        assert_eq!(game.rounds.len(), 5);
        assert_eq!(game.imposter_index, IMPOSTER);
    }

    #[tokio::test]
    async fn test_eliminating_the_imposter_wins_for_crewmates() {
        // Everyone suspects player 4 (the imposter). The imposter's own
        // self-suspicion re-routes to player 1, which stays short of majority.
        let votes = HashMap::from([(0, (1, 4)), (1, (1, 4)), (2, (1, 4)), (3, (1, 4))]);
        let engine = engine(ScriptedOracle::new(ScriptedOracle::correct(), votes));
        let mut game = new_game();
        engine.start(&mut game).unwrap();

        play_round(&engine, &mut game).await;

        assert_eq!(game.rounds[0].eliminated_player, Some(IMPOSTER));
        assert!(game.players[IMPOSTER].is_eliminated);
        assert_eq!(game.status, GameStatus::Finished);
        assert_eq!(game.winner, Some(Winner::Crewmates));
    }

    #[tokio::test]
    async fn test_three_failures_win_for_imposter() {
        let engine = engine(ScriptedOracle::new(
            ScriptedOracle::broken(),
            ScriptedOracle::split_votes(),
        ));
        let mut game = new_game();
        engine.start(&mut game).unwrap();

        play_round(&engine, &mut game).await;
        assert_eq!(game.failed_task_count, 1);
        play_round(&engine, &mut game).await;
        assert_eq!(game.failed_task_count, 2);
        play_round(&engine, &mut game).await;

        assert_eq!(game.failed_task_count, 3);
        assert_eq!(game.status, GameStatus::Finished);
        assert_eq!(game.winner, Some(Winner::Imposter));
        assert_eq!(game.rounds.len(), 3);
    }

    #[tokio::test]
    async fn test_eliminated_crewmate_is_excluded_from_later_rounds() {
        // Everyone suspects player 2 (a crewmate); player 1's self-suspicion
        // re-routes to player 1's first other active, player 0.
        let votes = HashMap::from([(0, (1, 2)), (1, (1, 2)), (2, (1, 2)), (3, (1, 2))]);
        let engine = engine(ScriptedOracle::new(ScriptedOracle::correct(), votes));
        let mut game = new_game();
        engine.start(&mut game).unwrap();

        play_round(&engine, &mut game).await;

        assert_eq!(game.rounds[0].eliminated_player, Some(1));
        assert!(game.players[1].is_eliminated);
        assert_eq!(game.status, GameStatus::InProgress);
        assert_eq!(game.current_round, 2);

        // Next round's fan-out skips the eliminated player everywhere
        engine.advance(&mut game).await.unwrap();
        let submitters: Vec<usize> =
            game.rounds[1].submissions.iter().map(|s| s.player_index).collect();
        assert_eq!(submitters, vec![0, 2, 3]);

        for _ in 0..4 {
            engine.advance(&mut game).await.unwrap();
        }
        assert_eq!(game.current_phase, Phase::Voting);
        assert!(game.rounds[1].discussion.iter().all(|m| m.player_index != 1));

        engine.advance(&mut game).await.unwrap();
        assert!(game.rounds[1].votes.iter().all(|v| v.voter_index != 1));
        // No self-suspicion anywhere
        assert!(game.rounds[1].votes.iter().all(|v| v.suspect_vote != v.voter_index));
    }

    #[tokio::test]
    async fn test_failed_agent_contributes_nothing() {
        let mut oracle = ScriptedOracle::new(
            ScriptedOracle::correct(),
            ScriptedOracle::split_votes(),
        );
        oracle.failing = vec![2];
        let engine = engine(oracle);
        let mut game = new_game();
        engine.start(&mut game).unwrap();

        engine.advance(&mut game).await.unwrap();
        let submitters: Vec<usize> =
            game.rounds[0].submissions.iter().map(|s| s.player_index).collect();
        assert_eq!(submitters, vec![0, 1, 3]);
        // Player 2 is skipped but not eliminated
        assert!(game.is_active(2));
    }

    #[tokio::test]
    async fn test_shrunken_majority_with_three_active_players() {
        let engine = engine(ScriptedOracle::new(
            ScriptedOracle::correct(),
            ScriptedOracle::split_votes(),
        ));
        let mut game = new_game();
        engine.start(&mut game).unwrap();

        // One player already out: threshold is 3/2 + 1 = 2
        game.players[3].is_eliminated = true;
        game.current_phase = Phase::Results;
        let round = game.current_round_state_mut().unwrap();
        round.suspect_votes = std::collections::BTreeMap::from([(0, 2)]);

        engine.advance(&mut game).await.unwrap();

        assert_eq!(game.rounds[0].eliminated_player, Some(0));
        assert!(game.players[0].is_eliminated);
    }

    #[tokio::test]
    async fn test_missing_chosen_submission_counts_as_failure() {
        let engine = engine(ScriptedOracle::new(
            ScriptedOracle::correct(),
            ScriptedOracle::split_votes(),
        ));
        let mut game = new_game();
        engine.start(&mut game).unwrap();

        // Votes chose a slot nobody submitted for
        game.current_phase = Phase::Results;
        game.current_round_state_mut().unwrap().chosen_submission = Some(2);

        engine.advance(&mut game).await.unwrap();

        assert_eq!(game.failed_task_count, 1);
        assert!(game.rounds[0].test_result.is_none());
        assert_eq!(game.current_round, 2);
    }

    #[tokio::test]
    async fn test_round_five_results_end_the_game() {
        let engine = engine(ScriptedOracle::new(
            ScriptedOracle::correct(),
            ScriptedOracle::split_votes(),
        ));
        let mut game = new_game();
        engine.start(&mut game).unwrap();

        // Fast-forward bookkeeping to round 5 results with nothing shipped
        game.current_round = 5;
        game.rounds = vec![
            Round::new(1, catalog::task_for_round(1).unwrap().clone()),
            Round::new(2, catalog::task_for_round(2).unwrap().clone()),
            Round::new(3, catalog::task_for_round(3).unwrap().clone()),
            Round::new(4, catalog::task_for_round(4).unwrap().clone()),
            Round::new(5, catalog::task_for_round(5).unwrap().clone()),
        ];
        game.current_phase = Phase::Results;

        engine.advance(&mut game).await.unwrap();

        assert_eq!(game.status, GameStatus::Finished);
        assert_eq!(game.winner, Some(Winner::Imposter));
    }
}

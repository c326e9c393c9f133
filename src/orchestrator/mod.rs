// src/orchestrator/mod.rs
//! Round orchestration: concurrent per-player oracle fan-out
//!
//! For each of the coding/discussion/voting phases, one request per currently
//! active player is dispatched concurrently; the phase blocks on the join
//! barrier until every request has completed or failed. Each player's call is
//! an independent unit of work: one agent failing (or its task panicking)
//! never corrupts another's turn - that player simply contributes nothing for
//! the phase. Eliminated players are never contacted.

pub mod memory;
pub mod parse;
pub mod prompts;

use crate::game::model::{Game, Message, Submission, Task, Vote};
use crate::oracle::{AgentOracle, ChatTurn, OracleRequest, Role};
use chrono::Utc;
use futures::future::join_all;
use memory::ConversationStore;
use prompts::PreviousRoundContext;
use std::sync::Arc;
use tracing::{debug, warn};

/// Completion budgets per phase, matching the original orchestration
const CODING_MAX_TOKENS: u32 = 1024;
const DISCUSSION_MAX_TOKENS: u32 = 300;
const VOTING_MAX_TOKENS: u32 = 200;

pub struct RoundOrchestrator {
    oracle: Arc<dyn AgentOracle>,
    memory: ConversationStore,
}

impl RoundOrchestrator {
    pub fn new(oracle: Arc<dyn AgentOracle>) -> Self {
        Self { oracle, memory: ConversationStore::new() }
    }

    /// Discard a game's conversation memory
    pub fn forget_game(&self, game_id: &str) {
        self.memory.forget(game_id);
    }

    fn role_of(game: &Game, player_index: usize) -> Role {
        if player_index == game.imposter_index {
            Role::Imposter
        } else {
            Role::Crewmate
        }
    }

    /// One prompt/response exchange with every listed player, concurrently.
    ///
    /// Each task appends the prompt to its own player's log, calls the oracle
    /// with the full conversation, and commits the response. On failure the
    /// uncommitted prompt is rolled back so logs stay prompt/response paired.
    /// Results come back keyed by player index, in ascending index order.
    async fn exchange(
        &self,
        game: &Game,
        max_tokens: u32,
        prompts: Vec<(usize, String)>,
    ) -> Vec<(usize, String)> {
        let logs = self.memory.logs(&game.game_id);
        let mut handles = Vec::with_capacity(prompts.len());

        for (player_index, prompt) in prompts {
            let oracle = Arc::clone(&self.oracle);
            let logs = Arc::clone(&logs);
            let role = Self::role_of(game, player_index);
            let system = prompts::system_prompt(role, player_index);
            let agent = game.players[player_index].model.clone();

            handles.push(tokio::spawn(async move {
                let mut log = logs[player_index].lock().await;
                log.push(ChatTurn::game(prompt));

                let request = OracleRequest {
                    player_index,
                    role,
                    agent: &agent,
                    system: &system,
                    conversation: log.as_slice(),
                    max_tokens,
                };
                let outcome = oracle.respond(request).await;

                match outcome {
                    Ok(text) => {
                        log.push(ChatTurn::player(text.clone()));
                        Some((player_index, text))
                    }
                    Err(e) => {
                        warn!(player = player_index, error = %e, "agent failed, skipping this phase");
                        log.pop();
                        None
                    }
                }
            }));
        }

        let mut results = Vec::new();
        for outcome in join_all(handles).await {
            match outcome {
                Ok(Some(pair)) => results.push(pair),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "agent task aborted, skipping this phase"),
            }
        }
        results
    }

    /// Coding phase: one submission per active player
    pub async fn collect_submissions(
        &self,
        game: &Game,
        task: &Task,
        context: PreviousRoundContext,
    ) -> Vec<Submission> {
        let prompt = prompts::coding_prompt(game.current_round, task, context);
        let prompts: Vec<_> =
            game.active_players().into_iter().map(|i| (i, prompt.clone())).collect();

        self.exchange(game, CODING_MAX_TOKENS, prompts)
            .await
            .into_iter()
            .map(|(player_index, response)| Submission {
                player_index,
                code: parse::extract_code(&response),
                timestamp: Utc::now().to_rfc3339(),
            })
            .collect()
    }

    /// Reveal phase: append every submission to every active player's
    /// context. Conversational memory only; no oracle calls.
    pub async fn broadcast_reveal(&self, game: &Game, task: &Task, submissions: &[Submission]) {
        let prompt = prompts::reveal_prompt(task, submissions);
        let logs = self.memory.logs(&game.game_id);

        for player_index in game.active_players() {
            logs[player_index].lock().await.push(ChatTurn::game(prompt.clone()));
        }
        debug!(game = %game.game_id, "revealed {} submissions", submissions.len());
    }

    /// Discussion phase: one message per active player for this sub-round
    pub async fn collect_messages(
        &self,
        game: &Game,
        task: &Task,
        discussion_round: u32,
        previous: &[Message],
    ) -> Vec<Message> {
        let prompt = prompts::discussion_prompt(discussion_round, task, previous);
        let prompts: Vec<_> =
            game.active_players().into_iter().map(|i| (i, prompt.clone())).collect();

        self.exchange(game, DISCUSSION_MAX_TOKENS, prompts)
            .await
            .into_iter()
            .map(|(player_index, response)| Message {
                player_index,
                content: parse::truncate_message(&response),
                discussion_round,
            })
            .collect()
    }

    /// Voting phase: one vote per active player
    pub async fn collect_votes(
        &self,
        game: &Game,
        task: &Task,
        discussion: &[Message],
    ) -> Vec<Vote> {
        let active = game.active_players();
        let prompts: Vec<_> = active
            .iter()
            .map(|&i| (i, prompts::voting_prompt(task, discussion, i)))
            .collect();

        self.exchange(game, VOTING_MAX_TOKENS, prompts)
            .await
            .into_iter()
            .map(|(voter_index, response)| {
                let (solution_vote, suspect_vote) =
                    parse::parse_vote(&response, voter_index, &active);
                Vote { voter_index, solution_vote, suspect_vote }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog;
    use crate::oracle::OracleError;
    use async_trait::async_trait;

    /// Oracle that answers every player with a fixed response, except the
    /// players listed as failing.
    struct FixedOracle {
        response: String,
        failing: Vec<usize>,
    }

    #[async_trait]
    impl AgentOracle for FixedOracle {
        async fn respond(&self, request: OracleRequest<'_>) -> Result<String, OracleError> {
            if self.failing.contains(&request.player_index) {
                return Err(OracleError::Provider("quota exceeded".into()));
            }
            Ok(self.response.clone())
        }
    }

    fn game() -> Game {
        let bindings = (0..4).map(|i| format!("agent-{i}")).collect();
        let mut game = Game::new("g1".into(), bindings, 3);
        game.current_round = 1;
        game
    }

    #[tokio::test]
    async fn test_collect_submissions_skips_eliminated_players() {
        let oracle = Arc::new(FixedOracle {
            response: "```python\ndef f():\n    return 1\n```".into(),
            failing: vec![],
        });
        let orchestrator = RoundOrchestrator::new(oracle);

        let mut game = game();
        game.players[2].is_eliminated = true;
        let task = catalog::task_for_round(1).unwrap();

        let submissions = orchestrator
            .collect_submissions(&game, task, PreviousRoundContext::default())
            .await;

        let indices: Vec<usize> = submissions.iter().map(|s| s.player_index).collect();
        assert_eq!(indices, vec![0, 1, 3]);
        assert_eq!(submissions[0].code, "def f():\n    return 1");
    }

    #[tokio::test]
    async fn test_one_agent_failure_does_not_abort_siblings() {
        let oracle = Arc::new(FixedOracle { response: "hello".into(), failing: vec![1] });
        let orchestrator = RoundOrchestrator::new(oracle);

        let game = game();
        let task = catalog::task_for_round(1).unwrap();

        let messages = orchestrator.collect_messages(&game, task, 1, &[]).await;
        let indices: Vec<usize> = messages.iter().map(|m| m.player_index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
    }

    #[tokio::test]
    async fn test_failed_exchange_rolls_back_prompt() {
        let oracle = Arc::new(FixedOracle { response: "hi".into(), failing: vec![1] });
        let orchestrator = RoundOrchestrator::new(oracle);

        let game = game();
        let task = catalog::task_for_round(1).unwrap();
        orchestrator.collect_messages(&game, task, 1, &[]).await;

        let logs = orchestrator.memory.logs("g1");
        // Successful player: prompt + response
        assert_eq!(logs[0].lock().await.len(), 2);
        // Failed player: nothing committed
        assert!(logs[1].lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_collect_votes_enforces_no_self_suspicion() {
        // Everyone answers SUSPECT: 1, so player 0 must be re-routed
        let oracle = Arc::new(FixedOracle {
            response: "SOLUTION: 1\nSUSPECT: 1\nREASON: vibes".into(),
            failing: vec![],
        });
        let orchestrator = RoundOrchestrator::new(oracle);

        let game = game();
        let task = catalog::task_for_round(1).unwrap();
        let votes = orchestrator.collect_votes(&game, task, &[]).await;

        assert_eq!(votes.len(), 4);
        for vote in &votes {
            assert_ne!(vote.suspect_vote, vote.voter_index);
        }
        assert_eq!(votes[0].suspect_vote, 1);
        assert_eq!(votes[1].suspect_vote, 0);
    }

    #[tokio::test]
    async fn test_reveal_appends_to_active_logs_only() {
        let oracle = Arc::new(FixedOracle { response: "x".into(), failing: vec![] });
        let orchestrator = RoundOrchestrator::new(oracle);

        let mut game = game();
        game.players[1].is_eliminated = true;
        let task = catalog::task_for_round(1).unwrap();

        orchestrator.broadcast_reveal(&game, task, &[]).await;

        let logs = orchestrator.memory.logs("g1");
        assert_eq!(logs[0].lock().await.len(), 1);
        assert!(logs[1].lock().await.is_empty());
        assert_eq!(logs[3].lock().await.len(), 1);
    }
}

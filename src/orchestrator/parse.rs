// src/orchestrator/parse.rs
//! Response interpretation and vote tallying
//!
//! Malformed agent output is never an error. Every parser here has a
//! documented fallback so the game always progresses, even under adversarial
//! or garbled model output.

use crate::game::model::Vote;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Hard cap on discussion message length, in characters
pub const MESSAGE_CHAR_LIMIT: usize = 500;

static CODE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:python)?\s*\n?(.*?)```").expect("static regex"));

static SOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"SOLUTION:\s*(\d)").expect("static regex"));

static SUSPECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"SUSPECT:\s*(\d)").expect("static regex"));

/// Extract code from a response: the first fenced block if present,
/// otherwise the whole response trimmed.
pub fn extract_code(response: &str) -> String {
    if let Some(captures) = CODE_BLOCK_RE.captures(response) {
        if let Some(block) = captures.get(1) {
            return block.as_str().trim().to_string();
        }
    }
    response.trim().to_string()
}

/// Trim and hard-cap a discussion message
pub fn truncate_message(response: &str) -> String {
    response.trim().chars().take(MESSAGE_CHAR_LIMIT).collect()
}

/// Parse `SOLUTION: <digit>` / `SUSPECT: <digit>` markers (1-based on the
/// wire, 0-based here).
///
/// Fallbacks: a missing or inactive index becomes the first active player;
/// a self-suspicion becomes the first *other* active player. `active` must
/// be non-empty and ascending.
pub fn parse_vote(response: &str, self_index: usize, active: &[usize]) -> (usize, usize) {
    let first_active = active[0];

    let parse_marker = |re: &Regex| -> Option<usize> {
        re.captures(response)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
    };

    let mut solution_vote = parse_marker(&SOLUTION_RE).unwrap_or(first_active);
    let mut suspect_vote = parse_marker(&SUSPECT_RE).unwrap_or(first_active);

    if !active.contains(&solution_vote) {
        solution_vote = first_active;
    }
    if !active.contains(&suspect_vote) {
        suspect_vote = first_active;
    }

    // Self-suspicion is structurally disallowed
    if suspect_vote == self_index {
        suspect_vote = active
            .iter()
            .copied()
            .find(|&p| p != self_index)
            .unwrap_or(first_active);
    }

    (solution_vote, suspect_vote)
}

/// Plurality winner of the solution votes, ties broken by first-seen order
/// during tallying (stable first-past-the-post). `None` when no votes exist.
pub fn tally_solution_votes(votes: &[Vote]) -> Option<usize> {
    let mut counts: Vec<(usize, usize)> = Vec::new();

    for vote in votes {
        match counts.iter_mut().find(|(idx, _)| *idx == vote.solution_vote) {
            Some((_, count)) => *count += 1,
            None => counts.push((vote.solution_vote, 1)),
        }
    }

    let mut winner: Option<(usize, usize)> = None;
    for (idx, count) in counts {
        // Strict > keeps the first-seen maximum
        if winner.map_or(true, |(_, best)| count > best) {
            winner = Some((idx, count));
        }
    }

    winner.map(|(idx, _)| idx)
}

/// Suspect votes grouped into per-player counts
pub fn tally_suspect_votes(votes: &[Vote]) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for vote in votes {
        *counts.entry(vote.suspect_vote).or_insert(0) += 1;
    }
    counts
}

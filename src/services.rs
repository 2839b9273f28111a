//! External collaborator boundary
//!
//! The engine never talks to a backend itself. At session end it hands the
//! final score to a [`SessionSink`], and whatever lives behind that trait
//! (HTTP client, bridge callback, test recorder) is someone else's problem.
//! Both calls are fire-and-forget from the engine's point of view.

use serde::{Deserialize, Serialize};

use crate::sim::{GamePhase, GameState, TickInput, tick};
use crate::tuning::Difficulty;

/// A reward granted for a finished session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponGrant {
    pub code: String,
    pub label: String,
}

/// Where finished sessions report to
pub trait SessionSink {
    /// Called once per round with the final score
    fn submit_score(&mut self, score: u32, difficulty: Difficulty);

    /// Called once per round after `submit_score`; the sink decides whether
    /// the score earned anything
    fn issue_reward(&mut self, _score: u32, _difficulty: Difficulty) -> Option<CouponGrant> {
        None
    }
}

/// Sink that swallows everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SessionSink for NullSink {
    fn submit_score(&mut self, _score: u32, _difficulty: Difficulty) {}
}

/// Sink that remembers every call, for tests and the demo
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub submissions: Vec<(u32, Difficulty)>,
    pub rewards: Vec<CouponGrant>,
}

impl SessionSink for RecordingSink {
    fn submit_score(&mut self, score: u32, difficulty: Difficulty) {
        self.submissions.push((score, difficulty));
    }

    fn issue_reward(&mut self, score: u32, difficulty: Difficulty) -> Option<CouponGrant> {
        let grant = CouponGrant {
            code: format!("QB-{score:06}"),
            label: format!("{} clear", difficulty.as_str()),
        };
        self.rewards.push(grant.clone());
        Some(grant)
    }
}

/// Owns a [`GameState`] and a sink, and watches for the end-of-round edge.
/// The sink fires exactly once per round, on the frame the phase first
/// becomes `GameOver` or `TimeUp`; staying there costs nothing more.
#[derive(Debug)]
pub struct Session<S: SessionSink> {
    pub state: GameState,
    pub sink: S,
    last_phase: GamePhase,
    last_grant: Option<CouponGrant>,
}

impl<S: SessionSink> Session<S> {
    pub fn new(state: GameState, sink: S) -> Self {
        let last_phase = state.phase;
        Self {
            state,
            sink,
            last_phase,
            last_grant: None,
        }
    }

    /// Tick the simulation and dispatch the end-of-round callbacks on the
    /// terminal edge
    pub fn advance(&mut self, input: &TickInput, dt: f32) {
        tick(&mut self.state, input, dt);

        let ended = is_terminal(self.state.phase);
        let was_ended = is_terminal(self.last_phase);
        if ended && !was_ended {
            let score = self.state.score;
            let difficulty = self.state.config.difficulty;
            self.sink.submit_score(score, difficulty);
            self.last_grant = self.sink.issue_reward(score, difficulty);
            if let Some(grant) = &self.last_grant {
                log::info!("reward issued: {} ({})", grant.code, grant.label);
            }
        } else if was_ended && !ended {
            // A new round started; the old grant belongs to the old round
            self.last_grant = None;
        }
        self.last_phase = self.state.phase;
    }

    /// Reward from the most recently finished round, if any
    pub fn last_grant(&self) -> Option<&CouponGrant> {
        self.last_grant.as_ref()
    }
}

fn is_terminal(phase: GamePhase) -> bool {
    matches!(phase, GamePhase::GameOver | GamePhase::TimeUp)
}

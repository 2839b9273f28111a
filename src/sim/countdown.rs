//! Cancelable countdown task
//!
//! Countdowns gate every serve. Only one can be live at a time: starting a
//! new one replaces the current task under a fresh generation number, and a
//! completion carrying a stale generation is discarded. A wall-clock safety
//! stop force-completes any task that outlives its cadence.

use serde::{Deserialize, Serialize};

use crate::consts::{COUNTDOWN_SAFETY_SECS, COUNTDOWN_START, COUNTDOWN_TICK_SECS};

/// What a finished countdown releases into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountdownTarget {
    /// Main-wave serve: counts through ServeAuto into Playing
    ServeMain,
    /// Quiz serve: releases the ball straight into QuizPlay
    ServeQuiz,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Countdown {
    /// Monotonic token; a task whose generation is behind the session's
    /// current one is dead no matter what its timers say
    pub generation: u64,
    pub target: CountdownTarget,
    /// Displayed count, 3 down to 1
    pub remaining: u32,
    tick_timer: f32,
    elapsed: f32,
}

impl Countdown {
    pub fn new(generation: u64, target: CountdownTarget) -> Self {
        Self {
            generation,
            target,
            remaining: COUNTDOWN_START,
            tick_timer: COUNTDOWN_TICK_SECS,
            elapsed: 0.0,
        }
    }

    /// Advance by `dt`. Returns true once the count has run out or the
    /// safety stop kicked in.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed >= COUNTDOWN_SAFETY_SECS {
            log::warn!(
                "countdown g{} ran past the {}s safety stop, forcing completion",
                self.generation,
                COUNTDOWN_SAFETY_SECS
            );
            return true;
        }
        self.tick_timer -= dt;
        while self.tick_timer <= 0.0 {
            if self.remaining <= 1 {
                return true;
            }
            self.remaining -= 1;
            self.tick_timer += COUNTDOWN_TICK_SECS;
        }
        false
    }
}

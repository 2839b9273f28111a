//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Frame stepping only, dt clamped to a fixed band
//! - Seeded RNG only, serialized in-place with the state
//! - Stable iteration order (targets and obstacles by index)
//! - No rendering or platform dependencies
//!
//! The embedding layer drives it solely through [`tick`] and reads it solely
//! through [`GameState::snapshot`].

pub mod countdown;
pub mod geom;
pub mod spawn;
pub mod state;
pub mod tick;

pub use countdown::{Countdown, CountdownTarget};
pub use geom::{
    RectEdge, circle_rect_hit, clamp_speed, resolve_circle_rect_bounce, round_to_tenth,
};
pub use spawn::{generate_wave, placement_band, spawn_obstacles};
pub use state::{
    Ball, BallView, EndReason, GameAction, GameEvent, GamePhase, GameState, Obstacle, Paddle,
    QuizArena, QuizOutcome, RectShape, Snapshot, Target, TargetView, action_transition,
};
pub use tick::{TickInput, tick};

//! Quiz Breaker - an arcade quiz-breakout mini-game engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (phase machine, physics, placement)
//! - `tuning`: Data-driven game balance per difficulty
//! - `quiz`: Static true/false quiz bank
//! - `services`: Session controller and the score/reward boundary
//!
//! Field coordinates are canvas-style: origin at the top-left corner, +y
//! pointing down. A ball with `vel.y > 0` is falling toward the paddle.

pub mod quiz;
pub mod services;
pub mod sim;
pub mod tuning;

pub use services::{CouponGrant, NullSink, RecordingSink, Session, SessionSink};
pub use sim::{GamePhase, GameState, Snapshot, TickInput, tick};
pub use tuning::{Difficulty, GameConfig};

/// Game configuration constants (difficulty-independent)
pub mod consts {
    /// Reference play-field size used by the demo and tests
    pub const FIELD_WIDTH: f32 = 480.0;
    pub const FIELD_HEIGHT: f32 = 720.0;

    /// Per-frame dt clamp; a stalled tab steps at most MAX_DT per frame
    pub const MIN_DT: f32 = 0.001;
    pub const MAX_DT: f32 = 0.033;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 7.0;
    /// Sub-step length as a fraction of the ball radius (tunneling guard)
    pub const SUBSTEP_FRACTION: f32 = 0.4;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 10;
    /// Serve direction jitter off vertical (radians)
    pub const SERVE_JITTER: f32 = 0.25;
    /// Quiz serves get a wider fan so either answer zone is reachable
    pub const QUIZ_SERVE_JITTER: f32 = 0.35;
    /// Ball is lost this far past the bottom edge
    pub const FALL_MARGIN: f32 = 24.0;

    /// Paddle defaults - centerline sits PADDLE_RAISE above the bottom edge
    pub const PADDLE_RAISE: f32 = 48.0;
    pub const PADDLE_HALF_HEIGHT: f32 = 7.0;
    /// Gap between the paddle top and a tethered ball
    pub const TETHER_GAP: f32 = 2.0;
    /// Horizontal steering impulse per unit hit offset, as a speed fraction
    pub const PADDLE_STEER: f32 = 0.6;

    /// Countdown cadence and safety stop
    pub const COUNTDOWN_START: u32 = 3;
    pub const COUNTDOWN_TICK_SECS: f32 = 1.0;
    pub const COUNTDOWN_SAFETY_SECS: f32 = 5.0;
    /// How long a quiz outcome stays on screen before play resumes
    pub const RESULT_DWELL_SECS: f32 = 1.2;

    /// Target placement band for centers, as fractions of the field size
    pub const BAND_INSET_X: f32 = 0.08;
    pub const BAND_TOP: f32 = 0.07;
    pub const BAND_BOTTOM: f32 = 0.52;
    /// Retry budget for non-overlapping placement before giving up
    pub const PLACEMENT_ATTEMPTS: u32 = 60;
    /// Spawn separation margin over the sum of radii
    pub const SPAWN_SEPARATION: f32 = 1.22;
    /// Distinct palette tags cycled across a wave
    pub const TARGET_HUES: u8 = 6;

    /// In-flight target behavior
    pub const REPULSION_TRIGGER: f32 = 1.04;
    pub const REPULSION_NUDGE: f32 = 6.0;
    pub const BAND_BOUNCE_DAMPING: f32 = 0.92;
    /// Drift re-steer: blend weight kept from the old velocity
    pub const STEER_BLEND_OLD: f32 = 0.55;
    pub const STEER_MIN_SECS: f32 = 0.35;
    pub const STEER_MAX_SECS: f32 = 1.05;
    /// Vertical component damping applied to fresh drift headings
    pub const VERTICAL_FLATTEN: f32 = 0.75;
    /// Sway oscillation rate (radians/s on the phase accumulator)
    pub const SWAY_RATE: f32 = 2.2;

    /// Score multiplier clamp
    pub const MULTIPLIER_MIN: f32 = 1.0;
    pub const MULTIPLIER_MAX: f32 = 5.0;

    /// Quiz arena geometry, as fractions of the field size
    pub const QUIZ_ZONE_RADIUS: f32 = 0.115;
    pub const QUIZ_ZONE_X: f32 = 0.25;
    pub const QUIZ_ZONE_Y: f32 = 0.30;
    pub const QUIZ_CHUTE_HALF_W: f32 = 0.02;
    pub const QUIZ_CHUTE_TOP: f32 = 0.12;
    pub const QUIZ_CHUTE_BOTTOM: f32 = 0.46;
    pub const QUIZ_SHELF_HALF_W: f32 = 0.16;
    pub const QUIZ_SHELF_Y: f32 = 0.52;
    pub const QUIZ_SHELF_HALF_H: f32 = 8.0;

    /// Obstacle patrol band between the targets and the paddle
    pub const OBSTACLE_BAND_TOP: f32 = 0.58;
    pub const OBSTACLE_ROW_GAP: f32 = 0.065;
    pub const OBSTACLE_HALF_W: f32 = 0.09;
    pub const OBSTACLE_HALF_H: f32 = 8.0;
}

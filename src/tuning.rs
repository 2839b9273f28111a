//! Data-driven game balance
//!
//! All per-difficulty numbers live here. A `GameConfig` is built once when a
//! session is created and is read-only while it runs; the simulation never
//! reaches around it for magic numbers.

use serde::{Deserialize, Serialize};

/// Difficulty levels selectable from the title screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "med" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// How a target moves while the main wave is live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionProfile {
    /// Stays where it spawned
    Hold,
    /// Wanders on a periodically re-picked heading
    Drift,
    /// Oscillates horizontally on a phase accumulator
    Sway,
}

/// Per-difficulty tunables for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub difficulty: Difficulty,

    // === Wave layout ===
    /// Nominal grid used for target counts (rows * cols targets per wave)
    pub rows: u32,
    pub cols: u32,
    pub target_radius_min: f32,
    pub target_radius_max: f32,
    /// How many targets per wave carry a quiz tag
    pub quiz_targets: usize,
    pub obstacle_count: usize,

    // === Target motion ===
    /// Profiles drawn from when spawning a wave
    pub motion_profiles: Vec<MotionProfile>,
    pub target_speed_min: f32,
    pub target_speed_max: f32,
    /// Peak horizontal speed for swaying targets (pixels/s)
    pub sway_amplitude: f32,
    /// Obstacle patrol speed (pixels/s)
    pub obstacle_speed: f32,

    // === Session ===
    pub session_secs: f32,

    // === Ball and paddle ===
    pub ball_min_speed: f32,
    pub ball_max_speed: f32,
    pub serve_speed: f32,
    pub paddle_width: f32,
    /// Keyboard paddle speed (pixels/s); pointer drag is absolute
    pub paddle_speed: f32,

    // === Scoring ===
    pub hit_score: u32,
    pub clear_bonus: u32,
    pub quiz_correct_base: u32,
    /// Flat deduction for a wrong quiz answer (score saturates at zero)
    pub quiz_wrong_penalty: u32,
    /// Multiplier delta per quiz outcome
    pub multiplier_step: f32,
}

impl GameConfig {
    /// Balance table. Numbers here are gameplay tuning, not physics; the
    /// simulation works for any self-consistent set.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        use MotionProfile::*;
        match difficulty {
            Difficulty::Easy => Self {
                difficulty,
                rows: 3,
                cols: 4,
                target_radius_min: 16.0,
                target_radius_max: 24.0,
                quiz_targets: 2,
                obstacle_count: 1,
                motion_profiles: vec![Hold, Sway],
                target_speed_min: 20.0,
                target_speed_max: 45.0,
                sway_amplitude: 26.0,
                obstacle_speed: 60.0,
                session_secs: 75.0,
                ball_min_speed: 240.0,
                ball_max_speed: 480.0,
                serve_speed: 300.0,
                paddle_width: 104.0,
                paddle_speed: 520.0,
                hit_score: 100,
                clear_bonus: 500,
                quiz_correct_base: 300,
                quiz_wrong_penalty: 150,
                multiplier_step: 0.5,
            },
            Difficulty::Normal => Self {
                difficulty,
                rows: 4,
                cols: 5,
                target_radius_min: 14.0,
                target_radius_max: 22.0,
                quiz_targets: 3,
                obstacle_count: 2,
                motion_profiles: vec![Sway, Drift],
                target_speed_min: 35.0,
                target_speed_max: 70.0,
                sway_amplitude: 34.0,
                obstacle_speed: 90.0,
                session_secs: 60.0,
                ball_min_speed: 260.0,
                ball_max_speed: 540.0,
                serve_speed: 330.0,
                paddle_width: 92.0,
                paddle_speed: 560.0,
                hit_score: 100,
                clear_bonus: 600,
                quiz_correct_base: 400,
                quiz_wrong_penalty: 200,
                multiplier_step: 0.5,
            },
            Difficulty::Hard => Self {
                difficulty,
                rows: 4,
                cols: 6,
                target_radius_min: 12.0,
                target_radius_max: 20.0,
                quiz_targets: 4,
                obstacle_count: 3,
                motion_profiles: vec![Drift, Sway],
                target_speed_min: 55.0,
                target_speed_max: 110.0,
                sway_amplitude: 44.0,
                obstacle_speed: 130.0,
                session_secs: 45.0,
                ball_min_speed: 300.0,
                ball_max_speed: 620.0,
                serve_speed: 380.0,
                paddle_width: 80.0,
                paddle_speed: 600.0,
                hit_score: 150,
                clear_bonus: 800,
                quiz_correct_base: 500,
                quiz_wrong_penalty: 250,
                multiplier_step: 0.5,
            },
        }
    }

    /// Targets spawned per wave
    pub fn target_count(&self) -> usize {
        (self.rows * self.cols) as usize
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::default())
    }
}

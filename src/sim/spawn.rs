//! Wave spawning: target placement and obstacle layout
//!
//! All randomness flows through the session RNG, so a seed reproduces the
//! exact same waves.

use glam::Vec2;
use rand::Rng;
use rand::seq::{IndexedRandom, index};
use rand_pcg::Pcg32;

use super::state::{GameState, Obstacle, Target};
use crate::consts::*;
use crate::quiz;
use crate::tuning::{GameConfig, MotionProfile};

/// Region target centers may occupy, inset so even the largest target stays
/// fully inside the field
pub fn placement_band(field: Vec2, config: &GameConfig) -> (Vec2, Vec2) {
    let r = config.target_radius_max;
    (
        Vec2::new(field.x * BAND_INSET_X + r, field.y * BAND_TOP + r),
        Vec2::new(field.x * (1.0 - BAND_INSET_X) - r, field.y * BAND_BOTTOM - r),
    )
}

/// Fresh drift heading: uniform direction with the vertical component
/// flattened, scaled into the configured speed range
pub fn drift_velocity(rng: &mut Pcg32, speed_min: f32, speed_max: f32) -> Vec2 {
    let speed = rng.random_range(speed_min..=speed_max);
    let heading = rng.random_range(0.0..std::f32::consts::TAU);
    Vec2::new(heading.cos(), heading.sin() * VERTICAL_FLATTEN) * speed
}

/// Build a fresh wave of targets
///
/// Placement is rejection-sampled: up to `PLACEMENT_ATTEMPTS` tries per
/// target for a spot clear of everything placed so far, then one unchecked
/// drop. A rare overlap beats an incomplete wave, and the in-flight
/// repulsion separates survivors within a few frames.
pub fn generate_wave(state: &mut GameState) {
    let count = state.config.target_count();
    let (band_min, band_max) = placement_band(state.field, &state.config);

    // Which slots carry a quiz, and which bank entries they get
    let quiz_count = state.config.quiz_targets.min(count);
    let quiz_slots: Vec<usize> = index::sample(&mut state.rng, count, quiz_count).into_vec();
    let bank = quiz::bank();
    let mut quiz_ids: Vec<u32> =
        index::sample(&mut state.rng, bank.len(), quiz_count.min(bank.len()))
            .iter()
            .map(|i| bank[i].id)
            .collect();
    while quiz_ids.len() < quiz_count {
        // Bank smaller than the quota: repeat entries in order
        quiz_ids.push(bank[quiz_ids.len() % bank.len()].id);
    }

    let radius_min = state.config.target_radius_min;
    let radius_max = state.config.target_radius_max;
    let speed_min = state.config.target_speed_min;
    let speed_max = state.config.target_speed_max;
    let profiles = state.config.motion_profiles.clone();

    let mut targets: Vec<Target> = Vec::with_capacity(count);
    for slot in 0..count {
        let mut placed = None;
        for _ in 0..PLACEMENT_ATTEMPTS {
            let radius = state.rng.random_range(radius_min..=radius_max);
            let pos = Vec2::new(
                state.rng.random_range(band_min.x..=band_max.x),
                state.rng.random_range(band_min.y..=band_max.y),
            );
            let clear = targets.iter().all(|t| {
                let min_d = (t.radius + radius) * SPAWN_SEPARATION;
                t.pos.distance_squared(pos) > min_d * min_d
            });
            if clear {
                placed = Some((pos, radius));
                break;
            }
        }
        let (pos, radius) = placed.unwrap_or_else(|| {
            (
                Vec2::new(
                    state.rng.random_range(band_min.x..=band_max.x),
                    state.rng.random_range(band_min.y..=band_max.y),
                ),
                state.rng.random_range(radius_min..=radius_max),
            )
        });

        let quiz_idx = quiz_slots.iter().position(|&s| s == slot);
        let profile = *profiles.choose(&mut state.rng).unwrap_or(&MotionProfile::Hold);
        let (vel, phase) = match profile {
            MotionProfile::Hold => (Vec2::ZERO, 0.0),
            MotionProfile::Drift => (drift_velocity(&mut state.rng, speed_min, speed_max), 0.0),
            MotionProfile::Sway => (
                Vec2::ZERO,
                state.rng.random_range(0.0..std::f32::consts::TAU),
            ),
        };

        targets.push(Target {
            pos,
            radius,
            hue: (slot % TARGET_HUES as usize) as u8,
            hp: 1,
            is_quiz: quiz_idx.is_some(),
            quiz_id: quiz_idx.map(|i| quiz_ids[i]).unwrap_or(0),
            profile,
            phase,
            vel,
            steer_timer: state.rng.random_range(STEER_MIN_SECS..=STEER_MAX_SECS),
        });
    }

    state.targets = targets;
    log::info!(
        "wave {} spawned: {} targets ({} quiz-tagged) at {}",
        state.wave,
        count,
        quiz_count,
        state.config.difficulty.as_str()
    );
}

/// Lay out the patrol obstacles between the target band and the paddle.
/// Called once per round; the same set persists across wave turnovers.
pub fn spawn_obstacles(state: &mut GameState) {
    let field = state.field;
    let speed = state.config.obstacle_speed;
    state.obstacles.clear();
    for i in 0..state.config.obstacle_count {
        let y = field.y * (OBSTACLE_BAND_TOP + OBSTACLE_ROW_GAP * i as f32);
        let half = Vec2::new(field.x * OBSTACLE_HALF_W, OBSTACLE_HALF_H);
        let from_left = i % 2 == 0;
        let x = if from_left { half.x } else { field.x - half.x };
        let dir = if from_left { 1.0 } else { -1.0 };
        let vx = dir * speed * state.rng.random_range(0.85..=1.15);
        state.obstacles.push(Obstacle {
            pos: Vec2::new(x, y),
            half,
            vx,
        });
    }
}

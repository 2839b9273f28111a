//! Per-frame simulation step
//!
//! One call advances everything: pending actions, the countdown and dwell
//! timers, the session clock, target and obstacle motion, paddle control,
//! and the sub-stepped ball. All state mutation funnels through here, so
//! the same inputs against the same seed replay the same session.

use glam::Vec2;
use rand::Rng;

use super::countdown::CountdownTarget;
use super::geom::{circle_rect_hit, clamp_speed, resolve_circle_rect_bounce, round_to_tenth};
use super::spawn;
use super::state::{
    EndReason, GameAction, GameEvent, GamePhase, GameState, QuizArena, QuizOutcome,
    action_transition,
};
use crate::consts::*;
use crate::quiz::{self, QuizAnswer};
use crate::tuning::MotionProfile;

/// Input sampled for a single tick
///
/// The embedding layer samples its devices once per frame; the latest value
/// wins and nothing is buffered. The booleans are one-shot presses.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer-drag x in field coordinates; wins over `axis` when present
    pub pointer_x: Option<f32>,
    /// Held key direction: -1 left, +1 right
    pub axis: i8,
    /// Begin a round from the title screen
    pub start: bool,
    /// Acknowledge the quiz prompt
    pub confirm: bool,
    /// Start over after game over / time up
    pub restart: bool,
    /// Back to the title screen
    pub to_title: bool,
}

/// Advance the simulation by one frame
///
/// `dt` is wall-clock seconds since the previous call, clamped to
/// `[MIN_DT, MAX_DT]` so a backgrounded tab cannot teleport the ball.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = dt.clamp(MIN_DT, MAX_DT);
    state.events.clear();

    apply_actions(state, input);
    // Serve queued by the previous frame's ServeAuto
    auto_serve(state);
    advance_countdown(state, dt);
    advance_result_dwell(state, dt);

    advance_session_clock(state, dt);
    if state.phase == GamePhase::Playing {
        move_targets(state, dt);
        move_obstacles(state, dt);
    }
    control_paddle(state, input, dt);
    state.tether_ball();
    if state.ball.released && state.phase.ball_live() {
        integrate_ball(state, dt);
    }
}

/// Translate one-shot inputs into phase-machine actions. At most one action
/// fires per frame; the transition table decides whether it applies.
fn apply_actions(state: &mut GameState, input: &TickInput) {
    let action = if input.start {
        Some(GameAction::Start)
    } else if input.confirm {
        Some(GameAction::ConfirmQuiz)
    } else if input.restart {
        Some(GameAction::Restart)
    } else if input.to_title {
        Some(GameAction::ToTitle)
    } else {
        None
    };
    let Some(action) = action else { return };
    if action_transition(state.phase, action).is_none() {
        return;
    }
    match action {
        GameAction::Start | GameAction::Restart => begin_round(state),
        GameAction::ConfirmQuiz => state.begin_countdown(CountdownTarget::ServeQuiz),
        GameAction::ToTitle => return_to_title(state),
    }
}

/// Full reset into a fresh countdown
fn begin_round(state: &mut GameState) {
    state.score = 0;
    state.multiplier = MULTIPLIER_MIN;
    state.time_left = state.config.session_secs;
    state.wave = 0;
    state.active_quiz = None;
    state.last_outcome = None;
    state.result_timer = 0.0;
    state.center_paddle();
    state.capture_ball();
    spawn::generate_wave(state);
    spawn::spawn_obstacles(state);
    state.tether_ball();
    state.begin_countdown(CountdownTarget::ServeMain);
    log::info!(
        "round started: {} difficulty, {}s on the clock",
        state.config.difficulty.as_str(),
        state.config.session_secs
    );
}

fn return_to_title(state: &mut GameState) {
    state.cancel_countdown();
    state.targets.clear();
    state.obstacles.clear();
    state.active_quiz = None;
    state.last_outcome = None;
    state.result_timer = 0.0;
    state.center_paddle();
    state.capture_ball();
    state.phase = GamePhase::Idle;
}

/// ServeAuto lasts exactly one frame: entered when the main countdown
/// finishes, released here on the next tick.
fn auto_serve(state: &mut GameState) {
    if state.phase != GamePhase::ServeAuto {
        return;
    }
    state.center_paddle();
    state.tether_ball();
    state.serve_ball(SERVE_JITTER);
    state.phase = GamePhase::Playing;
    state.events.push(GameEvent::Served);
    log::debug!("auto serve released the ball");
}

fn advance_countdown(state: &mut GameState, dt: f32) {
    let current = state.generation();
    let Some(cd) = state.countdown.as_mut() else {
        return;
    };
    if cd.generation != current {
        // Task outlived a restart; drop it without firing
        state.countdown = None;
        return;
    }
    if !cd.advance(dt) {
        return;
    }
    let target = cd.target;
    state.countdown = None;
    match target {
        CountdownTarget::ServeMain => {
            state.phase = GamePhase::ServeAuto;
        }
        CountdownTarget::ServeQuiz => {
            state.center_paddle();
            state.tether_ball();
            state.serve_ball(QUIZ_SERVE_JITTER);
            state.phase = GamePhase::QuizPlay;
            state.events.push(GameEvent::Served);
        }
    }
}

/// Hold the quiz outcome on screen, then count back into the main wave
fn advance_result_dwell(state: &mut GameState, dt: f32) {
    if state.phase != GamePhase::QuizResult {
        return;
    }
    state.result_timer -= dt;
    if state.result_timer > 0.0 {
        return;
    }
    state.result_timer = 0.0;
    state.active_quiz = None;
    state.begin_countdown(CountdownTarget::ServeMain);
    log::debug!("quiz dwell over, counting back into the wave");
}

/// The session clock only spends while the main wave is live; quiz phases
/// and countdowns are free time.
fn advance_session_clock(state: &mut GameState, dt: f32) {
    if state.phase != GamePhase::Playing {
        return;
    }
    state.time_left -= dt;
    if state.time_left <= 0.0 {
        state.time_left = 0.0;
        end_session(state, EndReason::TimeUp);
    }
}

fn end_session(state: &mut GameState, reason: EndReason) {
    state.phase = match reason {
        EndReason::BallOut => GamePhase::GameOver,
        EndReason::TimeUp => GamePhase::TimeUp,
    };
    state.cancel_countdown();
    state.capture_ball();
    state.events.push(GameEvent::SessionEnded {
        score: state.score,
        difficulty: state.config.difficulty,
        reason,
    });
    log::info!(
        "session over ({reason:?}): score={} waves={}",
        state.score,
        state.wave
    );
}

fn move_targets(state: &mut GameState, dt: f32) {
    let (band_min, band_max) = spawn::placement_band(state.field, &state.config);
    let speed_min = state.config.target_speed_min;
    let speed_max = state.config.target_speed_max;
    let sway_amplitude = state.config.sway_amplitude;

    for t in state.targets.iter_mut() {
        if !t.alive() {
            continue;
        }
        match t.profile {
            MotionProfile::Hold => {}
            MotionProfile::Drift => {
                t.steer_timer -= dt;
                if t.steer_timer <= 0.0 {
                    // Blend toward a fresh heading instead of snapping
                    let fresh = spawn::drift_velocity(&mut state.rng, speed_min, speed_max);
                    t.vel = t.vel * STEER_BLEND_OLD + fresh * (1.0 - STEER_BLEND_OLD);
                    t.steer_timer = state.rng.random_range(STEER_MIN_SECS..=STEER_MAX_SECS);
                }
            }
            MotionProfile::Sway => {
                t.phase += dt * SWAY_RATE;
                t.vel.x = t.phase.cos() * sway_amplitude;
            }
        }
        t.pos += t.vel * dt;

        // Reflect off the band, bleeding a little energy
        if t.pos.x < band_min.x {
            t.pos.x = band_min.x;
            t.vel.x = t.vel.x.abs() * BAND_BOUNCE_DAMPING;
        } else if t.pos.x > band_max.x {
            t.pos.x = band_max.x;
            t.vel.x = -t.vel.x.abs() * BAND_BOUNCE_DAMPING;
        }
        if t.pos.y < band_min.y {
            t.pos.y = band_min.y;
            t.vel.y = t.vel.y.abs() * BAND_BOUNCE_DAMPING;
        } else if t.pos.y > band_max.y {
            t.pos.y = band_max.y;
            t.vel.y = -t.vel.y.abs() * BAND_BOUNCE_DAMPING;
        }
    }

    repel_overlaps(state);
}

/// Pairwise soft repulsion: push overlapping live targets apart and nudge
/// their velocities away from each other
fn repel_overlaps(state: &mut GameState) {
    let n = state.targets.len();
    for i in 0..n {
        if !state.targets[i].alive() {
            continue;
        }
        for j in (i + 1)..n {
            if !state.targets[j].alive() {
                continue;
            }
            let delta = state.targets[j].pos - state.targets[i].pos;
            let min_d =
                (state.targets[i].radius + state.targets[j].radius) * REPULSION_TRIGGER;
            let dist_sq = delta.length_squared();
            if dist_sq >= min_d * min_d {
                continue;
            }
            let dist = dist_sq.sqrt();
            // Coincident centers get an arbitrary but deterministic axis
            let dir = if dist > 1e-4 { delta / dist } else { Vec2::X };
            let overlap = min_d - dist;
            let push = dir * (overlap * 0.5);
            state.targets[i].pos -= push;
            state.targets[j].pos += push;
            state.targets[i].vel -= dir * (overlap * REPULSION_NUDGE);
            state.targets[j].vel += dir * (overlap * REPULSION_NUDGE);
        }
    }
}

fn move_obstacles(state: &mut GameState, dt: f32) {
    let field_w = state.field.x;
    for o in state.obstacles.iter_mut() {
        o.pos.x += o.vx * dt;
        if o.pos.x - o.half.x < 0.0 {
            o.pos.x = o.half.x;
            o.vx = o.vx.abs();
        } else if o.pos.x + o.half.x > field_w {
            o.pos.x = field_w - o.half.x;
            o.vx = -o.vx.abs();
        }
    }
}

/// Locked phases pin the paddle to center; play phases take pointer or key
/// input; every other phase ignores movement entirely.
fn control_paddle(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.phase.control_locked() {
        state.center_paddle();
        return;
    }
    if !matches!(state.phase, GamePhase::Playing | GamePhase::QuizPlay) {
        return;
    }
    if let Some(x) = input.pointer_x {
        state.paddle.x = x;
    } else if input.axis != 0 {
        state.paddle.x += input.axis as f32 * state.config.paddle_speed * dt;
    }
    state.paddle.clamp_to_field(state.field.x);
}

/// Sub-stepped ball integration. Step count scales with speed so a fast
/// ball cannot tunnel through a thin rectangle.
fn integrate_ball(state: &mut GameState, dt: f32) {
    let speed = state.ball.vel.length();
    let step_size = state.ball.radius * SUBSTEP_FRACTION;
    let steps = ((speed * dt / step_size).ceil() as u32).clamp(1, MAX_SUBSTEPS);
    let sub_dt = dt / steps as f32;
    for _ in 0..steps {
        if !substep(state, sub_dt) {
            break;
        }
    }
}

/// One collision substep. Returns false when the frame must stop early: a
/// quiz opened, the session ended, or the ball was recaptured.
fn substep(state: &mut GameState, dt: f32) -> bool {
    let field = state.field;
    let min_speed = state.config.ball_min_speed;
    let max_speed = state.config.ball_max_speed;

    state.ball.pos += state.ball.vel * dt;

    // Side and top walls reflect; the bottom is open
    if state.ball.pos.x - state.ball.radius < 0.0 {
        state.ball.pos.x = state.ball.radius;
        state.ball.vel.x = state.ball.vel.x.abs();
    } else if state.ball.pos.x + state.ball.radius > field.x {
        state.ball.pos.x = field.x - state.ball.radius;
        state.ball.vel.x = -state.ball.vel.x.abs();
    }
    if state.ball.pos.y - state.ball.radius < 0.0 {
        state.ball.pos.y = state.ball.radius;
        state.ball.vel.y = state.ball.vel.y.abs();
    }

    // Paddle only matters to a descending ball
    if state.ball.vel.y > 0.0 {
        let (pmin, pmax) = state.paddle.bounds();
        if circle_rect_hit(state.ball.pos, state.ball.radius, pmin, pmax) {
            let speed = state.ball.vel.length();
            state.ball.pos.y = pmin.y - state.ball.radius - 0.5;
            state.ball.vel.y = -state.ball.vel.y.abs();
            // Steering: center hits go straight up, edge hits go wide
            let offset =
                ((state.ball.pos.x - state.paddle.x) / state.paddle.half_w).clamp(-1.0, 1.0);
            state.ball.vel.x += offset * speed * PADDLE_STEER;
            state.ball.vel = clamp_speed(state.ball.vel, min_speed, max_speed);
        }
    }

    match state.phase {
        GamePhase::Playing => {
            bounce_off_obstacles(state, min_speed, max_speed);
            if hit_targets(state) {
                return false;
            }
            check_wave_clear(state);
        }
        GamePhase::QuizPlay => {
            bounce_off_guides(state, min_speed, max_speed);
            if hit_answer_zone(state) {
                return false;
            }
        }
        _ => {}
    }

    !ball_fell_out(state)
}

fn bounce_off_obstacles(state: &mut GameState, min_speed: f32, max_speed: f32) {
    for i in 0..state.obstacles.len() {
        let (omin, omax) = state.obstacles[i].bounds();
        if circle_rect_hit(state.ball.pos, state.ball.radius, omin, omax) {
            resolve_circle_rect_bounce(
                &mut state.ball.pos,
                &mut state.ball.vel,
                state.ball.radius,
                omin,
                omax,
            );
            state.ball.vel = clamp_speed(state.ball.vel, min_speed, max_speed);
        }
    }
}

fn bounce_off_guides(state: &mut GameState, min_speed: f32, max_speed: f32) {
    let arena = QuizArena::for_field(state.field);
    for rect in [arena.chute, arena.shelf] {
        if circle_rect_hit(state.ball.pos, state.ball.radius, rect.min, rect.max) {
            resolve_circle_rect_bounce(
                &mut state.ball.pos,
                &mut state.ball.vel,
                state.ball.radius,
                rect.min,
                rect.max,
            );
            state.ball.vel = clamp_speed(state.ball.vel, min_speed, max_speed);
        }
    }
}

/// First overlapping target takes the hit; at most one bounce per substep.
/// Returns true when the destroyed target opened a quiz.
fn hit_targets(state: &mut GameState) -> bool {
    let mut hit = None;
    for (i, t) in state.targets.iter().enumerate() {
        if !t.alive() {
            continue;
        }
        let reach = t.radius + state.ball.radius;
        if state.ball.pos.distance_squared(t.pos) <= reach * reach {
            hit = Some(i);
            break;
        }
    }
    let Some(i) = hit else {
        return false;
    };

    state.ball.vel.y = -state.ball.vel.y;
    // Step clear of the target so the next substep can't re-collide
    let away = state.ball.vel.normalize_or_zero();
    state.ball.pos += away * 2.0;

    let t = &mut state.targets[i];
    t.hp = t.hp.saturating_sub(1);
    if t.alive() {
        return false;
    }
    let was_quiz = t.is_quiz;
    let quiz_id = t.quiz_id;
    state.events.push(GameEvent::TargetDestroyed { quiz: was_quiz });
    if was_quiz {
        open_quiz(state, quiz_id);
        true
    } else {
        let gain = (state.config.hit_score as f32 * state.multiplier).round() as u32;
        state.score = state.score.saturating_add(gain);
        false
    }
}

/// Freeze the wave and put the quiz statement up
fn open_quiz(state: &mut GameState, quiz_id: u32) {
    state.capture_ball();
    state.active_quiz = Some(quiz_id);
    state.phase = GamePhase::QuizPrompt;
    state.events.push(GameEvent::QuizOpened { quiz_id });
    log::info!("quiz {quiz_id} opened: {}", quiz::by_id(quiz_id).statement);
}

/// Cleared waves pay the bonus and regenerate immediately, same obstacles
fn check_wave_clear(state: &mut GameState) {
    if state.targets.is_empty() || state.targets.iter().any(|t| t.alive()) {
        return;
    }
    state.score = state.score.saturating_add(state.config.clear_bonus);
    state.wave += 1;
    state.events.push(GameEvent::WaveCleared);
    spawn::generate_wave(state);
    log::info!(
        "wave cleared, +{} bonus, next wave up",
        state.config.clear_bonus
    );
}

fn hit_answer_zone(state: &mut GameState) -> bool {
    let arena = QuizArena::for_field(state.field);
    for (center, answered) in [
        (arena.o_center, QuizAnswer::O),
        (arena.x_center, QuizAnswer::X),
    ] {
        let reach = arena.zone_radius + state.ball.radius;
        if state.ball.pos.distance_squared(center) <= reach * reach {
            resolve_quiz(state, answered);
            return true;
        }
    }
    false
}

fn resolve_quiz(state: &mut GameState, answered: QuizAnswer) {
    let quiz = quiz::by_id(state.active_quiz.unwrap_or(0));
    let correct = answered == quiz.answer;
    let step = state.config.multiplier_step;
    if correct {
        let gain = (state.config.quiz_correct_base as f32 * state.multiplier).round() as u32;
        state.score = state.score.saturating_add(gain);
        state.multiplier = round_to_tenth((state.multiplier + step).min(MULTIPLIER_MAX));
    } else {
        state.score = state.score.saturating_sub(state.config.quiz_wrong_penalty);
        state.multiplier = round_to_tenth((state.multiplier - step).max(MULTIPLIER_MIN));
    }
    state.capture_ball();
    state.last_outcome = Some(QuizOutcome {
        quiz_id: quiz.id,
        answered,
        correct,
    });
    state.result_timer = RESULT_DWELL_SECS;
    state.phase = GamePhase::QuizResult;
    state.events.push(GameEvent::QuizResolved { correct });
    log::info!(
        "quiz {} answered {answered:?}: {}",
        quiz.id,
        if correct { "correct" } else { "wrong" }
    );
}

/// A ball past the bottom margin ends the round in Playing but only costs
/// a re-serve in QuizPlay. Returns true when the ball was taken out of play.
fn ball_fell_out(state: &mut GameState) -> bool {
    if state.ball.pos.y <= state.field.y + FALL_MARGIN {
        return false;
    }
    match state.phase {
        GamePhase::Playing => {
            state.events.push(GameEvent::BallLost);
            end_session(state, EndReason::BallOut);
            true
        }
        GamePhase::QuizPlay => {
            state.capture_ball();
            state.begin_countdown(CountdownTarget::ServeQuiz);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::countdown::Countdown;
    use crate::sim::state::Target;
    use crate::tuning::Difficulty;

    const DT: f32 = 1.0 / 60.0;

    fn fixed_target(pos: Vec2) -> Target {
        Target {
            pos,
            radius: 16.0,
            hue: 0,
            hp: 1,
            is_quiz: false,
            quiz_id: 0,
            profile: MotionProfile::Hold,
            phase: 0.0,
            vel: Vec2::ZERO,
            steer_timer: 1.0,
        }
    }

    fn quiz_target(pos: Vec2, quiz_id: u32) -> Target {
        Target {
            is_quiz: true,
            quiz_id,
            ..fixed_target(pos)
        }
    }

    /// Run from the title through countdown and serve into Playing
    fn playing_state(seed: u64) -> GameState {
        let mut state = GameState::with_difficulty(Difficulty::Normal, seed);
        tick(
            &mut state,
            &TickInput {
                start: true,
                ..Default::default()
            },
            DT,
        );
        let idle = TickInput::default();
        for _ in 0..400 {
            if state.phase == GamePhase::Playing {
                break;
            }
            tick(&mut state, &idle, DT);
        }
        assert_eq!(state.phase, GamePhase::Playing);
        state
    }

    #[test]
    fn test_start_flow_reaches_playing_through_serve_auto() {
        let mut state = GameState::with_difficulty(Difficulty::Normal, 12345);
        assert_eq!(state.phase, GamePhase::Idle);

        tick(
            &mut state,
            &TickInput {
                start: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(state.phase, GamePhase::Countdown);
        assert_eq!(state.snapshot().countdown, Some(3));

        let idle = TickInput::default();
        let mut serve_auto_frames = 0;
        let mut served = 0;
        for _ in 0..400 {
            tick(&mut state, &idle, DT);
            if state.phase == GamePhase::ServeAuto {
                serve_auto_frames += 1;
            }
            served += state
                .events
                .iter()
                .filter(|e| **e == GameEvent::Served)
                .count();
            if state.phase == GamePhase::Playing {
                break;
            }
        }
        assert_eq!(serve_auto_frames, 1);
        assert_eq!(served, 1);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.ball.released);
        assert!(state.ball.vel.y < 0.0);
    }

    #[test]
    fn test_hit_target_scores_at_current_multiplier() {
        let mut state = GameState::with_difficulty(Difficulty::Normal, 1);
        state.phase = GamePhase::Playing;
        state.targets = vec![
            fixed_target(Vec2::new(240.0, 200.0)),
            fixed_target(Vec2::new(100.0, 150.0)),
        ];
        state.obstacles.clear();
        state.ball.released = true;
        state.ball.pos = Vec2::new(240.0, 260.0);
        state.ball.vel = Vec2::new(0.0, -state.config.serve_speed);

        let idle = TickInput::default();
        let mut destroyed = false;
        for _ in 0..30 {
            tick(&mut state, &idle, DT);
            if state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::TargetDestroyed { quiz: false }))
            {
                destroyed = true;
                break;
            }
        }
        assert!(destroyed);
        assert_eq!(state.score, state.config.hit_score);
        assert_eq!(state.multiplier, 1.0);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.targets.iter().filter(|t| t.alive()).count(), 1);
        // Bounce sent the ball back down
        assert!(state.ball.vel.y > 0.0);
    }

    #[test]
    fn test_last_target_pays_bonus_and_regenerates() {
        let mut state = GameState::with_difficulty(Difficulty::Normal, 2);
        state.phase = GamePhase::Playing;
        state.targets = vec![fixed_target(Vec2::new(240.0, 200.0))];
        state.obstacles.clear();
        state.ball.released = true;
        state.ball.pos = Vec2::new(240.0, 260.0);
        state.ball.vel = Vec2::new(0.0, -state.config.serve_speed);

        // Tiny steps keep the destroying substep the last one of its frame,
        // so the fresh wave is untouched when we inspect it
        let idle = TickInput::default();
        let mut cleared = false;
        for _ in 0..200 {
            tick(&mut state, &idle, MIN_DT);
            if state.events.contains(&GameEvent::WaveCleared) {
                cleared = true;
                break;
            }
        }
        assert!(cleared);
        assert_eq!(state.score, state.config.hit_score + state.config.clear_bonus);
        assert_eq!(state.wave, 1);
        assert_eq!(state.targets.len(), state.config.target_count());
        assert!(state.targets.iter().all(|t| t.alive()));
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_ball_out_ends_round() {
        let mut state = playing_state(3);
        state.ball.pos = Vec2::new(240.0, state.field.y + FALL_MARGIN + 1.0);
        state.ball.vel = Vec2::new(0.0, state.config.ball_min_speed);
        let score_before = state.score;

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.events.contains(&GameEvent::BallLost));
        assert!(state.events.iter().any(|e| matches!(
            e,
            GameEvent::SessionEnded {
                reason: EndReason::BallOut,
                ..
            }
        )));
        assert!(!state.ball.released);
        assert_eq!(state.score, score_before);

        // Terminal phase is inert without a restart
        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), DT);
            assert_eq!(state.phase, GamePhase::GameOver);
            assert!(state.events.is_empty());
        }
    }

    #[test]
    fn test_time_up_ends_round_once() {
        let mut state = playing_state(4);
        state.targets.clear();
        state.obstacles.clear();
        state.ball.pos = Vec2::new(240.0, 300.0);
        state.ball.vel = Vec2::new(0.0, -state.config.ball_min_speed);
        state.time_left = 0.05;

        let mut ended = 0;
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), DT);
            ended += state
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::SessionEnded { .. }))
                .count();
        }
        assert_eq!(state.phase, GamePhase::TimeUp);
        assert_eq!(state.time_left, 0.0);
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_quiz_target_freezes_wave_and_prompts() {
        let mut state = GameState::with_difficulty(Difficulty::Normal, 5);
        state.phase = GamePhase::Playing;
        state.targets = vec![
            quiz_target(Vec2::new(240.0, 200.0), 3),
            fixed_target(Vec2::new(100.0, 150.0)),
        ];
        state.obstacles.clear();
        state.ball.released = true;
        state.ball.pos = Vec2::new(240.0, 260.0);
        state.ball.vel = Vec2::new(0.0, -state.config.serve_speed);

        let idle = TickInput::default();
        for _ in 0..30 {
            tick(&mut state, &idle, DT);
            if state.phase == GamePhase::QuizPrompt {
                break;
            }
        }
        assert_eq!(state.phase, GamePhase::QuizPrompt);
        assert_eq!(state.active_quiz, Some(3));
        assert!(!state.ball.released);
        // Quiz targets never score directly
        assert_eq!(state.score, 0);

        // The prompt waits indefinitely; nothing advances
        let frozen = serde_json::to_string(&state.targets).unwrap();
        for _ in 0..120 {
            tick(&mut state, &idle, DT);
        }
        assert_eq!(state.phase, GamePhase::QuizPrompt);
        assert_eq!(serde_json::to_string(&state.targets).unwrap(), frozen);
    }

    #[test]
    fn test_quiz_correct_scores_and_steps_multiplier() {
        let mut state = GameState::with_difficulty(Difficulty::Normal, 6);
        // Quiz 1 answers O
        state.phase = GamePhase::QuizPlay;
        state.active_quiz = Some(1);
        state.ball.released = true;
        let arena = QuizArena::for_field(state.field);
        state.ball.pos = arena.o_center + Vec2::new(0.0, arena.zone_radius + 40.0);
        state.ball.vel = Vec2::new(0.0, -state.config.serve_speed);

        let idle = TickInput::default();
        for _ in 0..30 {
            tick(&mut state, &idle, DT);
            if state.phase == GamePhase::QuizResult {
                break;
            }
        }
        assert_eq!(state.phase, GamePhase::QuizResult);
        let outcome = state.last_outcome.unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.quiz_id, 1);
        assert_eq!(outcome.answered, QuizAnswer::O);
        assert_eq!(state.score, state.config.quiz_correct_base);
        assert_eq!(state.multiplier, 1.5);
        assert!(!state.ball.released);
    }

    #[test]
    fn test_quiz_wrong_penalizes_and_clamps_multiplier() {
        let mut state = GameState::with_difficulty(Difficulty::Normal, 7);
        state.phase = GamePhase::QuizPlay;
        state.active_quiz = Some(1);
        state.score = 150;
        state.multiplier = 1.0;
        state.ball.released = true;
        let arena = QuizArena::for_field(state.field);
        state.ball.pos = arena.x_center + Vec2::new(0.0, arena.zone_radius + 40.0);
        state.ball.vel = Vec2::new(0.0, -state.config.serve_speed);

        let idle = TickInput::default();
        for _ in 0..30 {
            tick(&mut state, &idle, DT);
            if state.phase == GamePhase::QuizResult {
                break;
            }
        }
        let outcome = state.last_outcome.unwrap();
        assert!(!outcome.correct);
        // 150 - 200 saturates instead of wrapping
        assert_eq!(state.score, 0);
        assert_eq!(state.multiplier, 1.0);
    }

    #[test]
    fn test_multiplier_caps_at_max() {
        let mut state = GameState::with_difficulty(Difficulty::Normal, 8);
        state.phase = GamePhase::QuizPlay;
        state.active_quiz = Some(1);
        state.multiplier = 4.8;
        state.ball.released = true;
        let arena = QuizArena::for_field(state.field);
        state.ball.pos = arena.o_center + Vec2::new(0.0, arena.zone_radius + 40.0);
        state.ball.vel = Vec2::new(0.0, -state.config.serve_speed);

        let idle = TickInput::default();
        for _ in 0..30 {
            tick(&mut state, &idle, DT);
            if state.phase == GamePhase::QuizResult {
                break;
            }
        }
        assert_eq!(state.multiplier, MULTIPLIER_MAX);
        assert_eq!(
            state.score,
            (state.config.quiz_correct_base as f32 * 4.8).round() as u32
        );
    }

    #[test]
    fn test_quiz_result_dwell_counts_back_into_wave() {
        let mut state = GameState::with_difficulty(Difficulty::Normal, 9);
        state.targets = vec![fixed_target(Vec2::new(100.0, 150.0))];
        state.phase = GamePhase::QuizResult;
        state.result_timer = RESULT_DWELL_SECS;
        state.active_quiz = Some(2);

        let idle = TickInput::default();
        let mut saw_countdown = false;
        for _ in 0..400 {
            tick(&mut state, &idle, DT);
            if state.phase == GamePhase::Countdown {
                saw_countdown = true;
                assert!(state.active_quiz.is_none());
            }
            if state.phase == GamePhase::Playing {
                break;
            }
        }
        assert!(saw_countdown);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.ball.released);
    }

    #[test]
    fn test_quiz_fall_through_is_a_free_retry() {
        let mut state = GameState::with_difficulty(Difficulty::Normal, 10);
        state.phase = GamePhase::QuizPlay;
        state.active_quiz = Some(4);
        state.score = 500;
        state.ball.released = true;
        state.ball.pos = Vec2::new(240.0, state.field.y + FALL_MARGIN + 1.0);
        state.ball.vel = Vec2::new(0.0, state.config.ball_min_speed);

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, GamePhase::QuizCountdown);
        assert_eq!(state.score, 500);
        assert!(!state.ball.released);
        assert!(!state
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::SessionEnded { .. })));

        // Counts back down and re-serves into the arena
        let idle = TickInput::default();
        for _ in 0..400 {
            tick(&mut state, &idle, DT);
            if state.phase == GamePhase::QuizPlay {
                break;
            }
        }
        assert_eq!(state.phase, GamePhase::QuizPlay);
        assert!(state.ball.released);
    }

    #[test]
    fn test_wave_frozen_across_whole_quiz_flow() {
        let mut state = GameState::with_difficulty(Difficulty::Normal, 11);
        state.phase = GamePhase::Playing;
        let mut mover = fixed_target(Vec2::new(150.0, 150.0));
        mover.profile = MotionProfile::Drift;
        mover.vel = Vec2::new(40.0, -20.0);
        state.targets = vec![quiz_target(Vec2::new(240.0, 200.0), 1), mover];
        spawn::spawn_obstacles(&mut state);
        state.ball.released = true;
        state.ball.pos = Vec2::new(240.0, 260.0);
        state.ball.vel = Vec2::new(0.0, -state.config.serve_speed);

        let idle = TickInput::default();
        for _ in 0..30 {
            tick(&mut state, &idle, DT);
            if state.phase == GamePhase::QuizPrompt {
                break;
            }
        }
        assert_eq!(state.phase, GamePhase::QuizPrompt);
        let frozen_targets = serde_json::to_string(&state.targets).unwrap();
        let frozen_obstacles = serde_json::to_string(&state.obstacles).unwrap();

        // Confirm, count down, answer, dwell out, count back in. Stop at
        // ServeAuto: the last frame before the wave goes live again.
        tick(
            &mut state,
            &TickInput {
                confirm: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(state.phase, GamePhase::QuizCountdown);

        let mut answered = false;
        for _ in 0..2000 {
            if state.phase == GamePhase::QuizPlay && !answered {
                let arena = QuizArena::for_field(state.field);
                state.ball.pos = arena.o_center + Vec2::new(0.0, arena.zone_radius + 30.0);
                state.ball.vel = Vec2::new(0.0, -state.config.serve_speed);
                answered = true;
            }
            tick(&mut state, &idle, DT);
            if state.phase == GamePhase::ServeAuto {
                break;
            }
        }
        assert_eq!(state.phase, GamePhase::ServeAuto);
        assert_eq!(serde_json::to_string(&state.targets).unwrap(), frozen_targets);
        assert_eq!(
            serde_json::to_string(&state.obstacles).unwrap(),
            frozen_obstacles
        );
    }

    #[test]
    fn test_restarting_countdown_serves_exactly_once() {
        let mut state = GameState::with_difficulty(Difficulty::Normal, 12);
        state.begin_countdown(CountdownTarget::ServeMain);
        // Immediately restart it, as a double-tapped start button would
        state.begin_countdown(CountdownTarget::ServeMain);

        let idle = TickInput::default();
        let mut served = 0;
        for _ in 0..600 {
            tick(&mut state, &idle, DT);
            served += state
                .events
                .iter()
                .filter(|e| **e == GameEvent::Served)
                .count();
            if state.phase == GamePhase::Playing {
                break;
            }
        }
        assert_eq!(served, 1);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_stale_countdown_is_dropped_without_firing() {
        let mut state = GameState::with_difficulty(Difficulty::Normal, 13);
        state.begin_countdown(CountdownTarget::ServeMain);
        // Plant a task from a dead generation
        state.countdown = Some(Countdown::new(state.generation() - 1, CountdownTarget::ServeMain));

        tick(&mut state, &TickInput::default(), 4.0);
        assert!(state.countdown.is_none());
        assert_eq!(state.phase, GamePhase::Countdown);
        assert!(!state.events.contains(&GameEvent::Served));
    }

    #[test]
    fn test_control_lock_pins_paddle_to_center() {
        let mut state = GameState::with_difficulty(Difficulty::Normal, 14);
        let shove = TickInput {
            pointer_x: Some(30.0),
            axis: -1,
            start: true,
            ..Default::default()
        };
        tick(&mut state, &shove, DT);

        let center = state.field.x / 2.0;
        for _ in 0..400 {
            tick(&mut state, &shove, DT);
            if state.phase.control_locked() {
                assert_eq!(state.paddle.x, center);
                assert_eq!(state.ball.pos.x, center);
            }
            if state.phase == GamePhase::Playing {
                break;
            }
        }
        assert_eq!(state.phase, GamePhase::Playing);

        // Input works again once play starts; 30 px clamps to the half-width
        tick(
            &mut state,
            &TickInput {
                pointer_x: Some(30.0),
                ..Default::default()
            },
            DT,
        );
        assert_eq!(state.paddle.x, state.paddle.half_w);
    }

    #[test]
    fn test_restart_resets_the_session() {
        let mut state = playing_state(15);
        state.score = 4321;
        state.multiplier = 3.0;
        state.ball.pos = Vec2::new(240.0, state.field.y + FALL_MARGIN + 1.0);
        state.ball.vel = Vec2::new(0.0, state.config.ball_min_speed);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, GamePhase::GameOver);

        tick(
            &mut state,
            &TickInput {
                restart: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(state.phase, GamePhase::Countdown);
        assert_eq!(state.score, 0);
        assert_eq!(state.multiplier, MULTIPLIER_MIN);
        assert_eq!(state.time_left, state.config.session_secs);
        assert_eq!(state.targets.len(), state.config.target_count());
        assert!(state.targets.iter().all(|t| t.alive()));
        assert!(!state.ball.released);
    }

    #[test]
    fn test_to_title_clears_the_table() {
        let mut state = playing_state(16);
        state.ball.pos = Vec2::new(240.0, state.field.y + FALL_MARGIN + 1.0);
        state.ball.vel = Vec2::new(0.0, state.config.ball_min_speed);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, GamePhase::GameOver);

        tick(
            &mut state,
            &TickInput {
                to_title: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(state.phase, GamePhase::Idle);
        assert!(state.targets.is_empty());
        assert!(state.obstacles.is_empty());
        assert!(state.countdown.is_none());
    }

    #[test]
    fn test_dt_clamp_limits_travel() {
        let mut state = playing_state(17);
        state.targets.clear();
        state.obstacles.clear();
        state.ball.pos = Vec2::new(240.0, 300.0);
        state.ball.vel = Vec2::new(0.0, -state.config.ball_max_speed);
        let before = state.ball.pos;

        // A huge frame gap steps the world by at most MAX_DT
        tick(&mut state, &TickInput::default(), 2.0);
        let travelled = state.ball.pos.distance(before);
        assert!(travelled <= state.config.ball_max_speed * MAX_DT + 1.0);
    }

    #[test]
    fn test_determinism() {
        let mut a = GameState::with_difficulty(Difficulty::Normal, 99999);
        let mut b = GameState::with_difficulty(Difficulty::Normal, 99999);

        for frame in 0..900 {
            let input = TickInput {
                start: frame == 0,
                pointer_x: Some(120.0 + (frame % 120) as f32 * 2.0),
                confirm: frame % 30 == 0,
                ..Default::default()
            };
            tick(&mut a, &input, DT);
            tick(&mut b, &input, DT);
        }

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_invariants_hold_over_a_long_session() {
        let mut state = GameState::with_difficulty(Difficulty::Normal, 2024);
        let mut input = TickInput {
            start: true,
            ..Default::default()
        };

        for _ in 0..4000 {
            tick(&mut state, &input, DT);

            // Paddle never leaves the field
            assert!(state.paddle.x >= state.paddle.half_w);
            assert!(state.paddle.x <= state.field.x - state.paddle.half_w);
            // Multiplier stays in its band
            assert!(state.multiplier >= MULTIPLIER_MIN && state.multiplier <= MULTIPLIER_MAX);
            // A live ball keeps a legal speed
            if state.ball.released && state.phase.ball_live() {
                let speed = state.ball.vel.length();
                assert!(
                    speed >= state.config.ball_min_speed * 0.999
                        && speed <= state.config.ball_max_speed * 1.001,
                    "speed {speed} out of range in {:?}",
                    state.phase
                );
            }
            if state.phase.control_locked() {
                assert_eq!(state.paddle.x, state.field.x / 2.0);
            }

            // Simple autopilot: chase the ball, answer prompts, restart ends
            input = TickInput {
                pointer_x: Some(state.ball.pos.x),
                confirm: state.phase == GamePhase::QuizPrompt,
                restart: matches!(state.phase, GamePhase::GameOver | GamePhase::TimeUp),
                ..Default::default()
            };
        }
    }
}

//! Quiz Breaker entry point
//!
//! Headless demo: a scripted autopilot plays one full session and dumps the
//! final snapshot as JSON. Optional args: `quiz-breaker [seed] [difficulty]`.

use quiz_breaker::services::{CouponGrant, Session, SessionSink};
use quiz_breaker::sim::{GamePhase, GameState, TickInput};
use quiz_breaker::tuning::Difficulty;

const DT: f32 = 1.0 / 120.0;
/// Hard stop so a pathological session cannot spin forever
const MAX_FRAMES: u32 = 120 * 600;

/// Sink that reports to the log and grants a coupon above a score floor.
/// A real embedding would put its backend client behind this trait.
struct ConsoleSink;

impl SessionSink for ConsoleSink {
    fn submit_score(&mut self, score: u32, difficulty: Difficulty) {
        log::info!("score submitted: {score} ({})", difficulty.as_str());
    }

    fn issue_reward(&mut self, score: u32, difficulty: Difficulty) -> Option<CouponGrant> {
        (score >= reward_floor(difficulty)).then(|| CouponGrant {
            code: format!("QB-{}-{score:06}", difficulty.as_str().to_uppercase()),
            label: format!("{} session reward", difficulty.as_str()),
        })
    }
}

fn reward_floor(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 1500,
        Difficulty::Normal => 2000,
        Difficulty::Hard => 2500,
    }
}

/// Chase the ball with a little lead; confirm quiz prompts as they appear
fn autopilot(state: &GameState) -> TickInput {
    TickInput {
        pointer_x: Some(state.ball.pos.x + state.ball.vel.x * 0.08),
        confirm: state.phase == GamePhase::QuizPrompt,
        ..Default::default()
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(now_millis);
    let difficulty = args
        .next()
        .and_then(|s| Difficulty::from_str(&s))
        .unwrap_or_default();

    log::info!(
        "quiz-breaker demo: seed={seed} difficulty={}",
        difficulty.as_str()
    );

    let state = GameState::with_difficulty(difficulty, seed);
    let mut session = Session::new(state, ConsoleSink);

    let mut input = TickInput {
        start: true,
        ..Default::default()
    };
    let mut last_phase = session.state.phase;

    for frame in 0..MAX_FRAMES {
        session.advance(&input, DT);

        let phase = session.state.phase;
        if phase != last_phase {
            log::info!("[{:>7.2}s] {last_phase:?} -> {phase:?}", frame as f32 * DT);
            last_phase = phase;
        }
        if matches!(phase, GamePhase::GameOver | GamePhase::TimeUp) {
            break;
        }
        input = autopilot(&session.state);
    }

    let snap = session.state.snapshot();
    log::info!(
        "final: score={} multiplier=x{:.1} waves={} phase={:?}",
        snap.score,
        snap.multiplier,
        snap.wave,
        snap.phase
    );
    match session.last_grant() {
        Some(grant) => log::info!("coupon earned: {} ({})", grant.code, grant.label),
        None => log::info!("no coupon this time"),
    }

    match serde_json::to_string_pretty(&snap) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("snapshot serialization failed: {e}"),
    }
}

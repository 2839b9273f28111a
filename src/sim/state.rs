//! Game state and core simulation types
//!
//! Everything a session needs to resume deterministically lives here, in one
//! struct owned by one controller. Transient per-frame output (events) is
//! excluded from serialization.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::countdown::{Countdown, CountdownTarget};
use crate::consts::*;
use crate::quiz::{self, QuizAnswer};
use crate::tuning::{Difficulty, GameConfig, MotionProfile};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen; nothing simulated
    Idle,
    /// 3-count before the main serve
    Countdown,
    /// One-frame transient: the ball is served automatically
    ServeAuto,
    /// Active main wave
    Playing,
    /// Quiz statement shown; the wave is frozen awaiting confirm
    QuizPrompt,
    /// 3-count before the quiz serve
    QuizCountdown,
    /// Quiz arena live; answer by steering the ball into a zone
    QuizPlay,
    /// Quiz outcome displayed for a fixed dwell
    QuizResult,
    /// Ball fell out during the main wave
    GameOver,
    /// Session clock ran out
    TimeUp,
}

impl GamePhase {
    /// Phases that force the paddle to center and discard movement input
    pub fn control_locked(self) -> bool {
        matches!(
            self,
            GamePhase::Countdown | GamePhase::ServeAuto | GamePhase::QuizCountdown
        )
    }

    /// Phases in which a released ball integrates
    pub fn ball_live(self) -> bool {
        matches!(self, GamePhase::Playing | GamePhase::QuizPlay)
    }

    /// Phases belonging to the quiz interjection
    pub fn in_quiz_flow(self) -> bool {
        matches!(
            self,
            GamePhase::QuizPrompt
                | GamePhase::QuizCountdown
                | GamePhase::QuizPlay
                | GamePhase::QuizResult
        )
    }
}

/// External inputs that can move the phase machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Begin a round from the title screen
    Start,
    /// Acknowledge the quiz prompt
    ConfirmQuiz,
    /// Start over after game over / time up
    Restart,
    /// Back to the title screen
    ToTitle,
}

/// The legal action-driven transitions. Anything not listed is ignored;
/// physics-driven transitions (serves, hits, falls) live in the tick.
pub fn action_transition(phase: GamePhase, action: GameAction) -> Option<GamePhase> {
    use GamePhase::*;
    match (phase, action) {
        (Idle, GameAction::Start) => Some(Countdown),
        (QuizPrompt, GameAction::ConfirmQuiz) => Some(QuizCountdown),
        (GameOver | TimeUp, GameAction::Restart) => Some(Countdown),
        (GameOver | TimeUp, GameAction::ToTitle) => Some(Idle),
        _ => None,
    }
}

/// A destructible target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub pos: Vec2,
    pub radius: f32,
    /// Palette tag for the renderer
    pub hue: u8,
    pub hp: u8,
    /// Destroying a quiz-tagged target interrupts play with its quiz
    pub is_quiz: bool,
    pub quiz_id: u32,
    pub profile: MotionProfile,
    /// Oscillation accumulator (Sway)
    pub phase: f32,
    pub vel: Vec2,
    /// Seconds until a drifting target re-picks its heading
    pub steer_timer: f32,
}

impl Target {
    /// Destroyed targets stay in the list with hp 0 until the wave turns over
    pub fn alive(&self) -> bool {
        self.hp > 0
    }
}

/// A patrolling rectangular obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub pos: Vec2,
    pub half: Vec2,
    pub vx: f32,
}

impl Obstacle {
    pub fn bounds(&self) -> (Vec2, Vec2) {
        (self.pos - self.half, self.pos + self.half)
    }
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    /// Center x; the only coordinate the player controls
    pub x: f32,
    pub y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Paddle {
    pub fn new(config: &GameConfig, field: Vec2) -> Self {
        Self {
            x: field.x / 2.0,
            y: field.y - PADDLE_RAISE,
            half_w: config.paddle_width / 2.0,
            half_h: PADDLE_HALF_HEIGHT,
        }
    }

    pub fn bounds(&self) -> (Vec2, Vec2) {
        (
            Vec2::new(self.x - self.half_w, self.y - self.half_h),
            Vec2::new(self.x + self.half_w, self.y + self.half_h),
        )
    }

    /// Keep the paddle fully inside the field
    pub fn clamp_to_field(&mut self, field_w: f32) {
        self.x = self.x.clamp(self.half_w, field_w - self.half_w);
    }
}

/// The ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// While false the ball rides the paddle and has no physics
    pub released: bool,
}

impl Ball {
    pub fn new() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: BALL_RADIUS,
            released: false,
        }
    }
}

impl Default for Ball {
    fn default() -> Self {
        Self::new()
    }
}

/// Axis-aligned rectangle as a min/max corner pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectShape {
    pub min: Vec2,
    pub max: Vec2,
}

impl RectShape {
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }
}

/// The simplified arena simulated during QuizPlay: two circular answer
/// zones up top, a center chute dividing them, and a deflector shelf that
/// funnels the serve toward one side.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuizArena {
    pub o_center: Vec2,
    pub x_center: Vec2,
    pub zone_radius: f32,
    pub chute: RectShape,
    pub shelf: RectShape,
}

impl QuizArena {
    /// Arena geometry scales with the field; nothing about it is random
    pub fn for_field(field: Vec2) -> Self {
        let zone_y = field.y * QUIZ_ZONE_Y;
        let half_w = field.x * QUIZ_CHUTE_HALF_W;
        Self {
            o_center: Vec2::new(field.x * QUIZ_ZONE_X, zone_y),
            x_center: Vec2::new(field.x * (1.0 - QUIZ_ZONE_X), zone_y),
            zone_radius: field.x * QUIZ_ZONE_RADIUS,
            chute: RectShape {
                min: Vec2::new(field.x / 2.0 - half_w, field.y * QUIZ_CHUTE_TOP),
                max: Vec2::new(field.x / 2.0 + half_w, field.y * QUIZ_CHUTE_BOTTOM),
            },
            shelf: RectShape::from_center(
                Vec2::new(field.x / 2.0, field.y * QUIZ_SHELF_Y),
                Vec2::new(field.x * QUIZ_SHELF_HALF_W, QUIZ_SHELF_HALF_H),
            ),
        }
    }
}

/// How an answered quiz went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub quiz_id: u32,
    pub answered: QuizAnswer,
    pub correct: bool,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    BallOut,
    TimeUp,
}

/// One-frame notifications for the embedding layer. Cleared at the start of
/// every tick; consumers must read them the same frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Served,
    TargetDestroyed { quiz: bool },
    WaveCleared,
    QuizOpened { quiz_id: u32 },
    QuizResolved { correct: bool },
    BallLost,
    SessionEnded { score: u32, difficulty: Difficulty, reason: EndReason },
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Session seed for reproducibility
    pub seed: u64,
    /// RNG serialized in-place, so a restored state continues the exact
    /// random sequence instead of replaying it from the seed
    pub rng: Pcg32,
    pub config: GameConfig,
    /// Play-field size in pixels
    pub field: Vec2,
    pub phase: GamePhase,
    pub countdown: Option<Countdown>,
    countdown_generation: u64,
    /// Session clock; only spends while the main wave is live
    pub time_left: f32,
    pub score: u32,
    pub multiplier: f32,
    pub targets: Vec<Target>,
    pub obstacles: Vec<Obstacle>,
    pub paddle: Paddle,
    pub ball: Ball,
    /// Quiz picked when a quiz target broke; fixed until play resumes
    pub active_quiz: Option<u32>,
    pub last_outcome: Option<QuizOutcome>,
    /// QuizResult dwell remaining
    pub result_timer: f32,
    /// Waves cleared this session
    pub wave: u32,
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a fresh state sitting at the title screen
    pub fn new(config: GameConfig, field: Vec2, seed: u64) -> Self {
        let paddle = Paddle::new(&config, field);
        let time_left = config.session_secs;
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            config,
            field,
            phase: GamePhase::Idle,
            countdown: None,
            countdown_generation: 0,
            time_left,
            score: 0,
            multiplier: MULTIPLIER_MIN,
            targets: Vec::new(),
            obstacles: Vec::new(),
            paddle,
            ball: Ball::new(),
            active_quiz: None,
            last_outcome: None,
            result_timer: 0.0,
            wave: 0,
            events: Vec::new(),
        };
        state.tether_ball();
        state
    }

    /// Fresh state on the reference field for the given difficulty
    pub fn with_difficulty(difficulty: Difficulty, seed: u64) -> Self {
        Self::new(
            GameConfig::for_difficulty(difficulty),
            Vec2::new(FIELD_WIDTH, FIELD_HEIGHT),
            seed,
        )
    }

    /// Start (or restart) a countdown toward `target`, replacing any task
    /// already in flight. The bumped generation is what kills the old one.
    pub fn begin_countdown(&mut self, target: CountdownTarget) {
        self.countdown_generation += 1;
        self.countdown = Some(Countdown::new(self.countdown_generation, target));
        self.phase = match target {
            CountdownTarget::ServeMain => GamePhase::Countdown,
            CountdownTarget::ServeQuiz => GamePhase::QuizCountdown,
        };
        log::debug!(
            "countdown g{} started toward {:?}",
            self.countdown_generation,
            target
        );
    }

    /// Drop any in-flight countdown and invalidate its generation
    pub fn cancel_countdown(&mut self) {
        self.countdown_generation += 1;
        self.countdown = None;
    }

    /// Current countdown generation token
    pub fn generation(&self) -> u64 {
        self.countdown_generation
    }

    pub fn center_paddle(&mut self) {
        self.paddle.x = self.field.x / 2.0;
    }

    /// Park an unreleased ball on the paddle. No-op while released.
    pub fn tether_ball(&mut self) {
        if self.ball.released {
            return;
        }
        self.ball.pos = Vec2::new(
            self.paddle.x,
            self.paddle.y - self.paddle.half_h - self.ball.radius - TETHER_GAP,
        );
        self.ball.vel = Vec2::ZERO;
    }

    /// Take the ball back onto the paddle
    pub fn capture_ball(&mut self) {
        self.ball.released = false;
        self.tether_ball();
    }

    /// Release the ball upward with a jittered serve angle
    pub fn serve_ball(&mut self, jitter: f32) {
        let speed = self.config.serve_speed;
        let theta = self.rng.random_range(-jitter..=jitter);
        self.ball.vel = Vec2::new(theta.sin(), -theta.cos()) * speed;
        self.ball.released = true;
    }

    /// Presentation view of the current frame
    pub fn snapshot(&self) -> Snapshot {
        let in_quiz = self.phase.in_quiz_flow();
        Snapshot {
            phase: self.phase,
            countdown: self.countdown.as_ref().map(|c| c.remaining),
            score: self.score,
            multiplier: self.multiplier,
            time_left: self.time_left,
            wave: self.wave,
            paddle: {
                let (min, max) = self.paddle.bounds();
                RectShape { min, max }
            },
            ball: BallView {
                pos: self.ball.pos,
                radius: self.ball.radius,
                released: self.ball.released,
            },
            targets: self
                .targets
                .iter()
                .filter(|t| t.alive())
                .map(|t| TargetView {
                    pos: t.pos,
                    radius: t.radius,
                    hue: t.hue,
                    is_quiz: t.is_quiz,
                })
                .collect(),
            obstacles: self
                .obstacles
                .iter()
                .map(|o| {
                    let (min, max) = o.bounds();
                    RectShape { min, max }
                })
                .collect(),
            quiz_arena: in_quiz.then(|| QuizArena::for_field(self.field)),
            quiz_statement: if in_quiz {
                self.active_quiz
                    .map(|id| quiz::by_id(id).statement.to_string())
            } else {
                None
            },
            last_outcome: self.last_outcome,
        }
    }
}

/// Target as the renderer needs it
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TargetView {
    pub pos: Vec2,
    pub radius: f32,
    pub hue: u8,
    pub is_quiz: bool,
}

/// Ball as the renderer needs it
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BallView {
    pub pos: Vec2,
    pub radius: f32,
    pub released: bool,
}

/// Read-only per-frame view handed to the embedding layer. Everything a
/// renderer draws comes from here; it never touches `GameState` directly.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    /// Displayed countdown value when one is running
    pub countdown: Option<u32>,
    pub score: u32,
    pub multiplier: f32,
    pub time_left: f32,
    pub wave: u32,
    pub paddle: RectShape,
    pub ball: BallView,
    /// Live targets only
    pub targets: Vec<TargetView>,
    pub obstacles: Vec<RectShape>,
    /// Present during the quiz flow
    pub quiz_arena: Option<QuizArena>,
    pub quiz_statement: Option<String>,
    pub last_outcome: Option<QuizOutcome>,
}

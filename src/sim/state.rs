//! Run state and core simulation types
//!
//! A [`Run`] is one attempt at a level. It owns every entity it simulates and
//! is discarded once it reaches a terminal lifecycle state.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::scale::{ScaledConfig, Viewport};
use super::timer::FadeTimer;
use super::voice::VoiceInput;
use crate::tuning::RunTuning;

/// Coarse phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Active gameplay
    Running,
    /// Portal touched; gameplay frozen while the fade plays
    Teleporting,
    /// Fade finished, level-complete reported
    Complete,
    /// Hazard hit or hit-points exhausted
    GameOver,
}

impl Lifecycle {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Lifecycle::Complete | Lifecycle::GameOver)
    }
}

/// How jumps are triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunMode {
    /// Pointer/touch jumps
    #[default]
    Classic,
    /// Microphone loudness jumps
    Voice,
}

/// The player-controlled entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Vertical velocity (pixels/frame, positive is down)
    pub vel_y: f32,
    /// Visual rotation (radians)
    pub rotation: f32,
    pub grounded: bool,
    /// Ground line the runner was clamped to; the authoritative bottom edge
    /// while grounded, since `pos.y + size.y` need not round back to it
    #[serde(default)]
    pub footing: Option<f32>,
    /// Cosmetic skin color (linear RGBA)
    pub color: [f32; 4],
    /// Only tracked in boss mode
    pub hp: Option<i32>,
}

impl Runner {
    pub fn new(pos: Vec2, size: f32, color: [f32; 4]) -> Self {
        Self {
            pos,
            size: Vec2::splat(size),
            vel_y: 0.0,
            rotation: 0.0,
            grounded: false,
            footing: None,
            color,
            hp: None,
        }
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        match self.footing {
            Some(ground_y) if self.grounded => ground_y,
            _ => self.pos.y + self.size.y,
        }
    }

    /// Stand on `ground_y`: stop falling and latch the ground line
    pub fn settle_on(&mut self, ground_y: f32) {
        self.pos.y = ground_y - self.size.y;
        self.vel_y = 0.0;
        self.grounded = true;
        self.footing = Some(ground_y);
    }

    /// Leave the ground
    pub fn lift_off(&mut self) {
        self.grounded = false;
        self.footing = None;
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }
}

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Ends the run on contact
    Hazard,
    /// Currency, collected once
    Pickup,
    /// Ends the level on contact
    Portal,
    /// Fired by the runner at the boss
    PlayerProjectile,
    /// Fired by the boss at the runner
    BossProjectile,
}

/// An obstacle or projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Per-frame velocity (projectiles only; terrain drifts with the scroll)
    pub vel: Vec2,
    /// Set once the obstacle has produced its collision effect
    pub collected: bool,
}

impl Obstacle {
    pub fn new(id: u32, kind: ObstacleKind, pos: Vec2, size: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            size,
            vel: Vec2::ZERO,
            collected: false,
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }
}

/// Progress bookkeeping for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Total scrolled distance (never decreases while running)
    pub distance: f32,
    /// `floor(distance / score_divisor)`
    pub score: u64,
    /// Currency from pickups, multiplier applied
    pub coins: u64,
    /// Distance at which the portal spawns
    pub target_distance: f32,
    /// Latched once the portal has been placed
    pub portal_spawned: bool,
    /// Generator cursor: x of the most recently placed obstacle
    pub last_obstacle_x: f32,
}

/// Parameters chosen by the host when starting a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSetup {
    pub mode: RunMode,
    /// 1-based level
    pub level: u32,
    /// Currency multiplier for pickups
    pub multiplier: u64,
    pub seed: u64,
    pub skin: [f32; 4],
}

impl Default for RunSetup {
    fn default() -> Self {
        Self {
            mode: RunMode::Classic,
            level: 1,
            multiplier: 1,
            seed: 0,
            skin: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// One simulation instance
#[derive(Debug)]
pub struct Run {
    pub mode: RunMode,
    pub level: u32,
    pub multiplier: u64,
    pub seed: u64,
    pub tuning: RunTuning,
    /// Scaled values for the current viewport
    pub config: ScaledConfig,
    pub runner: Runner,
    /// Insertion ordered
    pub obstacles: Vec<Obstacle>,
    pub state: RunState,
    pub lifecycle: Lifecycle,
    /// Teleport fade, active only while teleporting
    pub fade: FadeTimer,
    pub voice: VoiceInput,
    /// Frames simulated while running
    pub frames: u64,
    pub(crate) rng: Pcg32,
    next_id: u32,
    disposed: bool,
}

impl Run {
    pub fn new(tuning: RunTuning, setup: &RunSetup, viewport: Viewport) -> Self {
        let level = setup.level.max(1);
        let config = ScaledConfig::new(&tuning, level, viewport);
        let s = config.scale;

        let runner = Runner::new(
            Vec2::new(tuning.runner_x * s, 0.0),
            tuning.runner_size * s,
            setup.skin,
        );

        let state = RunState {
            distance: 0.0,
            score: 0,
            coins: 0,
            target_distance: config.target_distance(&tuning, level),
            portal_spawned: false,
            last_obstacle_x: tuning.start_cursor * s,
        };

        log::info!(
            "Run started: mode={:?} level={} scale={:.3} target={:.0} seed={}",
            setup.mode,
            level,
            s,
            state.target_distance,
            setup.seed
        );

        Self {
            mode: setup.mode,
            level,
            multiplier: setup.multiplier.max(1),
            seed: setup.seed,
            tuning,
            config,
            runner,
            obstacles: Vec::new(),
            state,
            lifecycle: Lifecycle::Running,
            fade: FadeTimer::default(),
            voice: VoiceInput::disabled(),
            frames: 0,
            rng: Pcg32::seed_from_u64(setup.seed),
            next_id: 1,
            disposed: false,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Rebuild scaled values after a viewport change.
    ///
    /// Existing entities keep their positions; a grounded runner is moved onto
    /// the new ground line so the clamp invariant holds on the next frame.
    pub fn resize(&mut self, viewport: Viewport) {
        if self.disposed {
            return;
        }
        self.config = ScaledConfig::new(&self.tuning, self.level, viewport);
        if self.runner.grounded {
            self.runner.settle_on(self.config.ground_y);
        }
        log::debug!("Run resized to {}x{} (scale {:.3})", viewport.width, viewport.height, self.config.scale);
    }

    /// Hand the run a voice normalizer (voice mode only)
    pub fn attach_voice(&mut self, voice: VoiceInput) {
        if self.disposed || self.mode != RunMode::Voice {
            return;
        }
        self.voice = voice;
    }

    /// Release everything the instance holds. Later ticks do nothing.
    pub fn teardown(&mut self) {
        if self.disposed {
            return;
        }
        self.fade.cancel();
        self.voice.release();
        self.disposed = true;
        log::debug!("Run torn down at {:?}", self.lifecycle);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Number of portals currently in the obstacle list
    pub fn portal_count(&self) -> usize {
        self.obstacles
            .iter()
            .filter(|o| o.kind == super::ObstacleKind::Portal)
            .count()
    }

    /// Currency reported on completion
    pub fn completion_coins(&self) -> u64 {
        self.state.coins + self.tuning.completion_bonus
    }
}

//! Boss encounter
//!
//! Replaces the runner level with a duel: the runner steers vertically and
//! fires right, the boss patrols on the right edge and fires back. Phases only
//! move forward:
//!
//! ```text
//! Combat -> Surrender -> Choice -> Resolving(outcome) -> Done(outcome)
//! ```
//!
//! Every scripted delay lives in one [`Scheduled`] slot owned by the
//! encounter, so leaving a phase or tearing down cancels it.

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collision::{Aabb, projectile_hits, prune_projectiles};
use super::scale::{BossScale, Viewport};
use super::state::{Lifecycle, Obstacle, ObstacleKind, Runner};
use super::timer::{FadeTimer, Scheduled};
use crate::consts::FRAME_MS;
use crate::events::RunObserver;
use crate::tuning::{BossScript, BossTuning, Reward};

/// Frames between autopilot shots
const AUTOPILOT_FIRE_EVERY: u64 = 6;

/// How the cornered boss is dealt with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Lethal,
    Merciful,
}

/// Encounter phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Trading shots
    Combat,
    /// Boss hp reached zero; waiting out the surrender line
    Surrender,
    /// Paused until the player decides
    Choice,
    /// Scripted ending playing out
    Resolving(Outcome),
    /// Teleport fade, then victory
    Done(Outcome),
}

impl Phase {
    fn rank(&self) -> u8 {
        match self {
            Phase::Combat => 0,
            Phase::Surrender => 1,
            Phase::Choice => 2,
            Phase::Resolving(_) => 3,
            Phase::Done(_) => 4,
        }
    }
}

/// Scripted transitions waiting in the slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Beat {
    EnterChoice,
    Insult,
    Teleport,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncounterError {
    #[error("no decision pending (phase {phase:?})")]
    NotAwaitingChoice { phase: Phase },
    #[error("encounter already torn down")]
    Disposed,
}

/// The boss itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub hp: u32,
    pub max_hp: u32,
    /// Speech bubble text
    pub phrase: String,
    /// Vertical patrol direction (+1 down, -1 up)
    pub direction: f32,
}

impl Boss {
    pub fn health_fraction(&self) -> f32 {
        if self.max_hp == 0 {
            0.0
        } else {
            self.hp as f32 / self.max_hp as f32
        }
    }
}

/// Input for a single encounter frame
#[derive(Debug, Clone, Default)]
pub struct BossInput {
    /// Pointer/touch press
    pub fire: bool,
    /// Pointer y in viewport pixels
    pub steer_y: Option<f32>,
    /// Demo mode - track the boss and fire on a cadence
    pub autopilot: bool,
}

/// One boss encounter instance
#[derive(Debug)]
pub struct BossEncounter {
    pub tuning: BossTuning,
    pub script: BossScript,
    pub scale: BossScale,
    pub runner: Runner,
    pub boss: Boss,
    pub player_shots: Vec<Obstacle>,
    pub boss_shots: Vec<Obstacle>,
    /// X of the finishing shot while it is in flight (lethal ending)
    pub final_shot: Option<f32>,
    /// Set once the finishing shot has reached the boss
    pub detonated: bool,
    pub phase: Phase,
    pub lifecycle: Lifecycle,
    pub fade: FadeTimer,
    pub frames: u64,
    scheduled: Scheduled<Beat>,
    since_taunt_ms: f32,
    since_fire_ms: f32,
    rng: Pcg32,
    next_id: u32,
    disposed: bool,
}

impl BossEncounter {
    pub fn new(
        tuning: BossTuning,
        script: BossScript,
        viewport: Viewport,
        seed: u64,
        skin: [f32; 4],
    ) -> Self {
        let scale = BossScale::new(&tuning, viewport);

        let mut runner = Runner::new(
            Vec2::new(scale.px(tuning.runner_x), viewport.height / 2.0),
            scale.px(tuning.runner_size),
            skin,
        );
        runner.hp = Some(tuning.runner_hp);

        let boss_size = scale.px(tuning.boss_size);
        let boss = Boss {
            pos: Vec2::new(
                viewport.width - scale.px(tuning.boss_start_inset),
                tuning.boss_start_y,
            ),
            size: Vec2::splat(boss_size),
            hp: tuning.boss_hp,
            max_hp: tuning.boss_hp,
            phrase: script.taunts.first().cloned().unwrap_or_default(),
            direction: 1.0,
        };

        log::info!(
            "Boss encounter started: scale={:.3} boss_hp={} seed={}",
            scale.scale,
            boss.hp,
            seed
        );

        Self {
            // Both cadences fire on the first frame
            since_taunt_ms: tuning.taunt_interval_ms,
            since_fire_ms: tuning.fire_interval_ms,
            tuning,
            script,
            scale,
            runner,
            boss,
            player_shots: Vec::new(),
            boss_shots: Vec::new(),
            final_shot: None,
            detonated: false,
            phase: Phase::Combat,
            lifecycle: Lifecycle::Running,
            fade: FadeTimer::default(),
            frames: 0,
            scheduled: Scheduled::default(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            disposed: false,
        }
    }

    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn viewport(&self) -> Viewport {
        self.scale.viewport
    }

    /// Whether a scripted transition is waiting
    pub fn has_pending_transition(&self) -> bool {
        self.scheduled.is_pending()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Recompute the scale after a viewport change
    pub fn resize(&mut self, viewport: Viewport) {
        if self.disposed {
            return;
        }
        self.scale = BossScale::new(&self.tuning, viewport);
        let size = self.scale.px(self.tuning.runner_size);
        self.runner.size = Vec2::splat(size);
        self.runner.pos.x = self.scale.px(self.tuning.runner_x);
        self.boss.size = Vec2::splat(self.scale.px(self.tuning.boss_size));
        let y = self.runner.center().y;
        self.steer(y);
    }

    /// Cancel timers and stop simulating. Idempotent.
    pub fn teardown(&mut self) {
        if self.disposed {
            return;
        }
        self.scheduled.cancel();
        self.fade.cancel();
        self.disposed = true;
        log::debug!("Boss encounter torn down in {:?}", self.phase);
    }

    /// Deliver the player's decision. Only valid in the choice phase.
    pub fn choose(&mut self, outcome: Outcome) -> Result<(), EncounterError> {
        if self.disposed {
            return Err(EncounterError::Disposed);
        }
        if self.phase != Phase::Choice {
            return Err(EncounterError::NotAwaitingChoice { phase: self.phase });
        }

        self.enter(Phase::Resolving(outcome));
        match outcome {
            Outcome::Lethal => {
                self.boss.phrase = self.script.lethal_plea.clone();
                self.final_shot = Some(self.runner.right());
                self.scheduled
                    .schedule(self.tuning.lethal_insult_delay_ms, Beat::Insult);
            }
            Outcome::Merciful => {
                self.boss.phrase = self.script.merciful_thanks.clone();
                self.scheduled
                    .schedule(self.tuning.merciful_teleport_delay_ms, Beat::Teleport);
            }
        }
        log::info!("Boss fate chosen: {outcome:?}");
        Ok(())
    }

    /// Move the runner so its center follows the pointer, inside the margins
    pub fn steer(&mut self, pointer_y: f32) {
        let margin = self.tuning.steer_margin;
        let h = self.runner.size.y;
        let max_y = self.scale.viewport.height - (h + margin);
        self.runner.pos.y = (pointer_y - h / 2.0).min(max_y).max(margin);
    }

    /// Fire a shot from the runner's nose (combat only)
    pub fn fire(&mut self) -> bool {
        if self.phase != Phase::Combat || self.lifecycle != Lifecycle::Running {
            return false;
        }
        let t = &self.tuning;
        let s = &self.scale;
        let pos = Vec2::new(self.runner.right(), self.runner.pos.y + self.runner.size.y / 2.0);
        let size = Vec2::new(s.px(t.shot_width), s.px(t.shot_height));
        let vel = Vec2::new(s.px(t.shot_speed), 0.0);
        let id = self.next_entity_id();
        self.player_shots.push(
            Obstacle::new(id, ObstacleKind::PlayerProjectile, pos, size).with_velocity(vel),
        );
        true
    }

    /// Advance the encounter by one frame
    pub fn tick(&mut self, input: &BossInput, observer: &mut dyn RunObserver) {
        if self.disposed || self.lifecycle.is_terminal() {
            return;
        }

        if let Phase::Done(outcome) = self.phase {
            if self.fade.advance(FRAME_MS) {
                self.lifecycle = Lifecycle::Complete;
                let reward = self.reward_for(outcome);
                log::info!(
                    "Boss defeated ({outcome:?}): score={} coins={}",
                    reward.score,
                    reward.coins
                );
                observer.on_victory(reward.score, reward.coins);
            }
            return;
        }

        // Choice waits on the player; nothing moves
        if self.phase == Phase::Choice {
            return;
        }

        if let Some(beat) = self.scheduled.advance(FRAME_MS) {
            self.on_beat(beat);
        }

        match self.phase {
            Phase::Combat => {
                self.apply_input(input);
                self.patrol();
                self.taunt_and_fire();
            }
            Phase::Surrender => self.jitter(),
            Phase::Resolving(Outcome::Lethal) => self.advance_final_shot(),
            Phase::Resolving(Outcome::Merciful) => {}
            // Just entered through the beat; picked up next frame
            Phase::Choice | Phase::Done(_) => return,
        }

        self.move_player_shots();
        if self.move_boss_shots(observer) {
            return;
        }

        let width = self.scale.viewport.width;
        prune_projectiles(&mut self.player_shots, width);
        prune_projectiles(&mut self.boss_shots, width);

        self.frames += 1;
    }

    fn reward_for(&self, outcome: Outcome) -> Reward {
        match outcome {
            Outcome::Lethal => self.tuning.lethal_reward,
            Outcome::Merciful => self.tuning.merciful_reward,
        }
    }

    /// Forward-only phase change; exiting a phase cancels its pending beat
    fn enter(&mut self, next: Phase) {
        debug_assert!(
            next.rank() > self.phase.rank(),
            "boss phase moved backwards: {:?} -> {:?}",
            self.phase,
            next
        );
        self.scheduled.cancel();
        log::debug!("Boss phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    fn on_beat(&mut self, beat: Beat) {
        match beat {
            Beat::EnterChoice => self.enter(Phase::Choice),
            Beat::Insult => {
                self.boss.phrase = self.script.lethal_insult.clone();
                self.scheduled
                    .schedule(self.tuning.lethal_teleport_delay_ms, Beat::Teleport);
            }
            Beat::Teleport => {
                if let Phase::Resolving(outcome) = self.phase {
                    self.enter(Phase::Done(outcome));
                    self.lifecycle = Lifecycle::Teleporting;
                    self.fade.start();
                }
            }
        }
    }

    fn apply_input(&mut self, input: &BossInput) {
        let mut fire = input.fire;
        if let Some(y) = input.steer_y {
            self.steer(y);
        }
        if input.autopilot {
            let target = self.boss.pos.y + self.boss.size.y / 2.0;
            self.steer(target);
            fire |= self.frames % AUTOPILOT_FIRE_EVERY == 0;
        }
        if fire {
            self.fire();
        }
    }

    fn combat_x(&self) -> f32 {
        self.scale.viewport.width - self.boss.size.x - self.scale.px(self.tuning.boss_right_margin)
    }

    fn patrol(&mut self) {
        self.boss.pos.x = self.combat_x();
        self.boss.pos.y += self.boss.direction * self.scale.px(self.tuning.patrol_speed);

        let margin = self.scale.px(self.tuning.patrol_margin);
        let bottom = self.scale.viewport.height - (self.boss.size.y + margin);
        if self.boss.pos.y < margin || self.boss.pos.y > bottom {
            self.boss.direction = -self.boss.direction;
        }
    }

    fn taunt_and_fire(&mut self) {
        self.since_taunt_ms += FRAME_MS;
        if self.since_taunt_ms >= self.tuning.taunt_interval_ms {
            self.since_taunt_ms = 0.0;
            if !self.script.taunts.is_empty() {
                let i = self.rng.random_range(0..self.script.taunts.len());
                self.boss.phrase = self.script.taunts[i].clone();
            }
        }

        self.since_fire_ms += FRAME_MS;
        if self.since_fire_ms >= self.tuning.fire_interval_ms {
            self.since_fire_ms = 0.0;
            let t = &self.tuning;
            let s = &self.scale;
            let pos = Vec2::new(self.boss.pos.x, self.boss.pos.y + self.boss.size.y / 2.0);
            let vy = (self.rng.random::<f32>() - 0.5) * s.px(t.boss_shot_spread);
            let vel = Vec2::new(-s.px(t.boss_shot_speed), vy);
            let size = Vec2::splat(s.px(t.boss_shot_size));
            let id = self.next_entity_id();
            self.boss_shots.push(
                Obstacle::new(id, ObstacleKind::BossProjectile, pos, size).with_velocity(vel),
            );
        }
    }

    fn jitter(&mut self) {
        let shake = (self.rng.random::<f32>() - 0.5) * self.tuning.jitter;
        self.boss.pos.x = self.combat_x() + shake;
    }

    fn advance_final_shot(&mut self) {
        let Some(x) = self.final_shot else {
            return;
        };
        let next = x + self.scale.px(self.tuning.final_shot_speed);
        if next >= self.boss.pos.x + self.boss.size.x / 3.0 {
            self.final_shot = None;
            self.detonated = true;
            log::debug!("Final shot detonated");
        } else {
            self.final_shot = Some(next);
        }
    }

    fn move_player_shots(&mut self) {
        let combat = self.phase == Phase::Combat;
        let boss_box = Aabb::from_rect(self.boss.pos, self.boss.size);
        let buffer = self.scale.px(self.tuning.boss_hit_buffer);
        let damage = self.tuning.shot_damage;
        let mut hits = 0u32;

        self.player_shots.retain_mut(|shot| {
            shot.pos += shot.vel;
            if combat && projectile_hits(shot, boss_box, buffer) {
                hits += 1;
                return false;
            }
            true
        });

        if hits == 0 || !combat {
            return;
        }
        let before = self.boss.hp;
        self.boss.hp = self.boss.hp.saturating_sub(damage.saturating_mul(hits));
        debug_assert!(self.boss.hp <= before);

        if self.boss.hp == 0 {
            self.enter(Phase::Surrender);
            self.boss.phrase = self.script.surrender.clone();
            self.scheduled
                .schedule(self.tuning.surrender_delay_ms, Beat::EnterChoice);
            log::info!("Boss surrenders");
        }
    }

    /// Returns true when the runner was defeated this frame
    fn move_boss_shots(&mut self, observer: &mut dyn RunObserver) -> bool {
        let combat = self.phase == Phase::Combat;
        let runner_box = Aabb::from(&self.runner);
        let buffer = self.scale.px(self.tuning.hit_buffer);
        let mut hits = 0i32;

        self.boss_shots.retain_mut(|shot| {
            shot.pos += shot.vel;
            if combat && projectile_hits(shot, runner_box, buffer) {
                hits += 1;
                return false;
            }
            true
        });

        if hits == 0 {
            return false;
        }
        let hp = self.runner.hp.unwrap_or(0) - self.tuning.boss_shot_damage * hits;
        self.runner.hp = Some(hp);

        if hp <= 0 {
            self.lifecycle = Lifecycle::GameOver;
            self.scheduled.cancel();
            let reward = self.tuning.defeat_reward;
            log::info!(
                "Runner defeated by the boss: score={} coins={}",
                reward.score,
                reward.coins
            );
            observer.on_game_over(reward.score, reward.coins);
            return true;
        }
        false
    }
}

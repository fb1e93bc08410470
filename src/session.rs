//! Level progression across attempts
//!
//! A [`Session`] outlives individual runs. Each attempt gets a brand new
//! simulation instance with a fresh seed; the previous instance is torn down
//! first so none of its timers or microphone handles survive.

use serde::{Deserialize, Serialize};

use crate::events::{RunEvent, RunObserver};
use crate::settings::Settings;
use crate::sim::{
    BossEncounter, BossInput, EncounterError, Lifecycle, Outcome, Run, RunMode, RunSetup,
    TickInput, Viewport, VoiceInput, tick,
};
use crate::tuning::Tuning;

/// Which kind of attempt to start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    #[default]
    Classic,
    Voice,
    Boss,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Voice => "voice",
            GameMode::Boss => "boss",
        }
    }
}

/// The simulation instance of the current attempt
#[derive(Debug)]
pub enum ActiveRun {
    Runner(Run),
    Boss(BossEncounter),
}

impl ActiveRun {
    pub fn lifecycle(&self) -> Lifecycle {
        match self {
            ActiveRun::Runner(run) => run.lifecycle,
            ActiveRun::Boss(enc) => enc.lifecycle,
        }
    }

    pub fn viewport(&self) -> Viewport {
        match self {
            ActiveRun::Runner(run) => run.config.viewport,
            ActiveRun::Boss(enc) => enc.viewport(),
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        match self {
            ActiveRun::Runner(run) => run.resize(viewport),
            ActiveRun::Boss(enc) => enc.resize(viewport),
        }
    }

    pub fn teardown(&mut self) {
        match self {
            ActiveRun::Runner(run) => run.teardown(),
            ActiveRun::Boss(enc) => enc.teardown(),
        }
    }
}

/// Host input for one frame, mode agnostic
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Pointer/touch press this frame (jump or fire)
    pub press: bool,
    /// Pointer y in viewport pixels (boss steering)
    pub pointer_y: Option<f32>,
    pub autopilot: bool,
}

/// Forwards to the host observer and remembers the terminal event
struct Tee<'a> {
    inner: &'a mut dyn RunObserver,
    outcome: Option<RunEvent>,
}

impl RunObserver for Tee<'_> {
    fn on_score_update(&mut self, score: u64, coins: u64) {
        self.inner.on_score_update(score, coins);
    }

    fn on_game_over(&mut self, score: u64, coins: u64) {
        self.outcome = Some(RunEvent::GameOver { score, coins });
        self.inner.on_game_over(score, coins);
    }

    fn on_level_complete(&mut self, score: u64, coins: u64) {
        self.outcome = Some(RunEvent::LevelComplete { score, coins });
        self.inner.on_level_complete(score, coins);
    }

    fn on_victory(&mut self, score: u64, coins: u64) {
        self.outcome = Some(RunEvent::Victory { score, coins });
        self.inner.on_victory(score, coins);
    }
}

/// Progression state across attempts
#[derive(Debug)]
pub struct Session {
    /// 1-based level of the next runner attempt
    pub level: u32,
    /// Currency multiplier handed to each run
    pub multiplier: u64,
    pub skin: [f32; 4],
    pub tuning: Tuning,
    /// Best score reported by any finished attempt
    pub best_score: u64,
    /// Currency reported by finished attempts this session
    pub coins_earned: u64,
    mode: GameMode,
    active: Option<ActiveRun>,
    next_seed: u64,
}

impl Session {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self {
            level: 1,
            multiplier: 1,
            skin: [1.0; 4],
            tuning,
            best_score: 0,
            coins_earned: 0,
            mode: GameMode::Classic,
            active: None,
            next_seed: seed,
        }
    }

    /// Apply player preferences that affect new attempts
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.skin = settings.skin_color();
        self.tuning.voice.voice_threshold = settings.voice_threshold;
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn active(&self) -> Option<&ActiveRun> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut ActiveRun> {
        self.active.as_mut()
    }

    /// SplitMix64 step so consecutive attempts never share a seed
    fn take_seed(&mut self) -> u64 {
        self.next_seed = self.next_seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.next_seed;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Tear down the current attempt and start a new one
    pub fn start(&mut self, mode: GameMode, viewport: Viewport) -> &mut ActiveRun {
        self.end();
        self.mode = mode;
        let seed = self.take_seed();

        let active = match mode {
            GameMode::Classic | GameMode::Voice => {
                let (run_mode, tuning) = if mode == GameMode::Voice {
                    (RunMode::Voice, self.tuning.voice.clone())
                } else {
                    (RunMode::Classic, self.tuning.classic.clone())
                };
                let setup = RunSetup {
                    mode: run_mode,
                    level: self.level,
                    multiplier: self.multiplier,
                    seed,
                    skin: self.skin,
                };
                ActiveRun::Runner(Run::new(tuning, &setup, viewport))
            }
            GameMode::Boss => ActiveRun::Boss(BossEncounter::new(
                self.tuning.boss.clone(),
                self.tuning.script.clone(),
                viewport,
                seed,
                self.skin,
            )),
        };

        self.active.insert(active)
    }

    /// Tear down the current attempt, if any
    pub fn end(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.teardown();
        }
    }

    /// Hand a microphone to the current voice run
    pub fn attach_voice(&mut self, voice: VoiceInput) {
        match self.active.as_mut() {
            Some(ActiveRun::Runner(run)) if run.mode == RunMode::Voice => run.attach_voice(voice),
            _ => log::debug!("No voice run to attach the microphone to"),
        }
    }

    /// Forward the boss decision
    pub fn choose(&mut self, outcome: Outcome) -> Result<(), EncounterError> {
        match self.active.as_mut() {
            Some(ActiveRun::Boss(enc)) => enc.choose(outcome),
            _ => Err(EncounterError::Disposed),
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if let Some(active) = self.active.as_mut() {
            active.resize(viewport);
        }
    }

    /// Advance the current attempt one frame.
    ///
    /// Returns the terminal event if the attempt finished this frame.
    pub fn tick(&mut self, input: &FrameInput, observer: &mut dyn RunObserver) -> Option<RunEvent> {
        let active = self.active.as_mut()?;
        let mut tee = Tee {
            inner: observer,
            outcome: None,
        };

        match active {
            ActiveRun::Runner(run) => {
                let input = TickInput {
                    jump: input.press,
                    autopilot: input.autopilot,
                };
                tick(run, &input, &mut tee);
            }
            ActiveRun::Boss(enc) => {
                let input = BossInput {
                    fire: input.press,
                    steer_y: input.pointer_y,
                    autopilot: input.autopilot,
                };
                enc.tick(&input, &mut tee);
            }
        }

        let outcome = tee.outcome?;
        self.record(outcome);
        Some(outcome)
    }

    fn record(&mut self, event: RunEvent) {
        match event {
            RunEvent::LevelComplete { score, coins } => {
                self.best_score = self.best_score.max(score);
                self.coins_earned += coins;
                self.level += 1;
                log::info!("Advancing to level {}", self.level);
            }
            RunEvent::GameOver { score, coins } | RunEvent::Victory { score, coins } => {
                self.best_score = self.best_score.max(score);
                self.coins_earned += coins;
            }
            RunEvent::ScoreUpdate { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;

    const VIEWPORT: Viewport = Viewport::new(1000.0, 800.0);

    fn play_out(session: &mut Session, input: &FrameInput, log: &mut EventLog) -> Option<RunEvent> {
        for _ in 0..10_000 {
            if let Some(event) = session.tick(input, log) {
                return Some(event);
            }
        }
        None
    }

    #[test]
    fn test_each_attempt_gets_fresh_seed() {
        let mut session = Session::new(Tuning::default(), 1);
        let first = match session.start(GameMode::Classic, VIEWPORT) {
            ActiveRun::Runner(run) => run.seed,
            ActiveRun::Boss(_) => unreachable!(),
        };
        let second = match session.start(GameMode::Classic, VIEWPORT) {
            ActiveRun::Runner(run) => run.seed,
            ActiveRun::Boss(_) => unreachable!(),
        };
        assert_ne!(first, second);
    }

    #[test]
    fn test_level_advances_on_completion_only() {
        let mut session = Session::new(Tuning::default(), 9);
        let mut log = EventLog::new();

        session.start(GameMode::Classic, VIEWPORT);
        let idle = FrameInput::default();
        let outcome = play_out(&mut session, &idle, &mut log);
        assert!(matches!(outcome, Some(RunEvent::GameOver { .. })));
        assert_eq!(session.level, 1);

        session.start(GameMode::Classic, VIEWPORT);
        let auto = FrameInput {
            autopilot: true,
            ..Default::default()
        };
        let outcome = play_out(&mut session, &auto, &mut log);
        assert!(matches!(outcome, Some(RunEvent::LevelComplete { .. })));
        assert_eq!(session.level, 2);
        assert!(session.best_score > 0);

        // The next run is built for the new level
        match session.start(GameMode::Classic, VIEWPORT) {
            ActiveRun::Runner(run) => assert_eq!(run.level, 2),
            ActiveRun::Boss(_) => unreachable!(),
        }
    }

    #[test]
    fn test_boss_mode_and_choice_forwarding() {
        let mut session = Session::new(Tuning::default(), 3);
        assert_eq!(session.choose(Outcome::Lethal), Err(EncounterError::Disposed));
        session.start(GameMode::Boss, Viewport::new(1100.0, 800.0));
        assert_eq!(session.mode(), GameMode::Boss);
        assert!(matches!(
            session.choose(Outcome::Lethal),
            Err(EncounterError::NotAwaitingChoice { .. })
        ));
    }

    #[test]
    fn test_settings_flow_into_runs() {
        let mut session = Session::new(Tuning::default(), 3);
        let settings = Settings {
            skin: crate::settings::Skin::Lava,
            ..Default::default()
        };
        session.apply_settings(&settings);
        match session.start(GameMode::Voice, VIEWPORT) {
            ActiveRun::Runner(run) => {
                assert_eq!(run.runner.color, crate::settings::Skin::Lava.color());
                assert_eq!(run.mode, RunMode::Voice);
            }
            ActiveRun::Boss(_) => unreachable!(),
        }
    }

    #[test]
    fn test_end_tears_down() {
        let mut session = Session::new(Tuning::default(), 3);
        session.start(GameMode::Classic, VIEWPORT);
        session.end();
        assert!(session.active().is_none());
        assert_eq!(session.tick(&FrameInput::default(), &mut ()), None);
    }
}

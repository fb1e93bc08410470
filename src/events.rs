//! Lifecycle callbacks
//!
//! The simulation never calls into the host directly. It reports through a
//! [`RunObserver`] at state-machine boundaries (plus one score update per
//! running frame) and the host decides what to do with it.

use serde::{Deserialize, Serialize};

/// Outcome notifications from a simulation instance
pub trait RunObserver {
    /// Every running frame
    fn on_score_update(&mut self, _score: u64, _coins: u64) {}
    /// Once, when the run or encounter is lost
    fn on_game_over(&mut self, _score: u64, _coins: u64) {}
    /// Once, after the portal fade finishes
    fn on_level_complete(&mut self, _score: u64, _coins: u64) {}
    /// Once, after the boss encounter resolves
    fn on_victory(&mut self, _score: u64, _coins: u64) {}
}

/// Discards everything
impl RunObserver for () {}

/// A recorded observer call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEvent {
    ScoreUpdate { score: u64, coins: u64 },
    GameOver { score: u64, coins: u64 },
    LevelComplete { score: u64, coins: u64 },
    Victory { score: u64, coins: u64 },
}

impl RunEvent {
    /// Terminal events end an instance
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunEvent::ScoreUpdate { .. })
    }
}

/// Observer that records every call, for tests and the headless demo
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<RunEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-score events in order
    pub fn terminal(&self) -> impl Iterator<Item = &RunEvent> {
        self.events.iter().filter(|e| e.is_terminal())
    }

    /// The first terminal event, if any
    pub fn outcome(&self) -> Option<RunEvent> {
        self.terminal().next().copied()
    }

    pub fn score_updates(&self) -> usize {
        self.events.len() - self.terminal().count()
    }
}

impl RunObserver for EventLog {
    fn on_score_update(&mut self, score: u64, coins: u64) {
        self.events.push(RunEvent::ScoreUpdate { score, coins });
    }

    fn on_game_over(&mut self, score: u64, coins: u64) {
        self.events.push(RunEvent::GameOver { score, coins });
    }

    fn on_level_complete(&mut self, score: u64, coins: u64) {
        self.events.push(RunEvent::LevelComplete { score, coins });
    }

    fn on_victory(&mut self, score: u64, coins: u64) {
        self.events.push(RunEvent::Victory { score, coins });
    }
}

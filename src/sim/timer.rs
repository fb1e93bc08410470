//! Simulated-time timers
//!
//! Timers are owned by the simulation instance and advanced by the frame
//! driver, so dropping or tearing down the instance cancels them.

use crate::consts::{FADE_PERIOD_MS, FADE_STEP, FADE_THRESHOLD};

/// A single slot holding at most one pending delayed action
#[derive(Debug, Clone)]
pub struct Scheduled<T> {
    pending: Option<(f32, T)>,
}

impl<T> Default for Scheduled<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> Scheduled<T> {
    /// Schedule `action` after `delay_ms`, replacing (and returning) any pending one
    pub fn schedule(&mut self, delay_ms: f32, action: T) -> Option<T> {
        self.pending
            .replace((delay_ms.max(0.0), action))
            .map(|(_, displaced)| displaced)
    }

    /// Drop the pending action, if any
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, action)| action)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Advance the clock; returns the action once its delay has elapsed
    pub fn advance(&mut self, dt_ms: f32) -> Option<T> {
        let (remaining, _) = self.pending.as_mut()?;
        *remaining -= dt_ms;
        if *remaining <= 0.0 {
            self.pending.take().map(|(_, action)| action)
        } else {
            None
        }
    }
}

/// Teleport fade: adds a fixed step every fixed period until the threshold
#[derive(Debug, Clone, Default)]
pub struct FadeTimer {
    steps: u32,
    elapsed_ms: f32,
    active: bool,
    finished: bool,
}

impl FadeTimer {
    /// Start from zero. Has no effect once the fade has finished.
    pub fn start(&mut self) {
        if self.finished {
            return;
        }
        self.steps = 0;
        self.elapsed_ms = 0.0;
        self.active = true;
    }

    pub fn cancel(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Current overlay opacity (may exceed 1.0 near the end)
    pub fn progress(&self) -> f32 {
        self.steps as f32 * FADE_STEP
    }

    /// Advance the fade; returns true on the single call that reaches the threshold
    pub fn advance(&mut self, dt_ms: f32) -> bool {
        if !self.active {
            return false;
        }
        self.elapsed_ms += dt_ms;
        while self.elapsed_ms >= FADE_PERIOD_MS {
            self.elapsed_ms -= FADE_PERIOD_MS;
            self.steps += 1;
            if self.progress() >= FADE_THRESHOLD - 1e-4 {
                self.active = false;
                self.finished = true;
                return true;
            }
        }
        false
    }
}

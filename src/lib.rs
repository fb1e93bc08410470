//! Gallina Dash - A side-scrolling arcade runner
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (physics, generation, collisions, state machines)
//! - `events`: Callbacks fired at lifecycle boundaries
//! - `tuning`: Data-driven game balance
//! - `session`: Level progression across runs
//! - `flavor`: Narrative flavor text with fallback defaults
//! - `renderer`: WebGPU rendering pipeline

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod events;
pub mod flavor;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use events::{EventLog, RunEvent, RunObserver};
pub use session::{ActiveRun, GameMode, Session};
pub use settings::Settings;
pub use tuning::{BossScript, BossTuning, RunTuning, Tuning};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation step (one display frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Milliseconds of simulated time per step, used to advance timers
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Ground line as a fraction of viewport height
    pub const GROUND_RATIO: f32 = 0.75;
    /// Distance past a screen edge before an entity is pruned (pixels, unscaled)
    pub const PRUNE_MARGIN: f32 = 100.0;
    /// Float slack between a grounded runner's box and the ground line (pixels)
    pub const GROUND_TOLERANCE: f32 = 1e-3;
    /// Rotation added each airborne frame (radians)
    pub const TUMBLE_PER_FRAME: f32 = 0.18;

    /// Teleport fade: step added every period until the threshold is reached
    pub const FADE_PERIOD_MS: f32 = 50.0;
    pub const FADE_STEP: f32 = 0.05;
    pub const FADE_THRESHOLD: f32 = 1.2;
}

/// Round an angle to the nearest quarter turn
#[inline]
pub fn snap_quarter_turn(angle: f32) -> f32 {
    use std::f32::consts::FRAC_PI_2;
    (angle / FRAC_PI_2).round() * FRAC_PI_2
}

/// True when `angle` sits on a quarter turn (within `eps` radians)
#[inline]
pub fn is_quarter_turn(angle: f32, eps: f32) -> bool {
    (angle - snap_quarter_turn(angle)).abs() <= eps
}

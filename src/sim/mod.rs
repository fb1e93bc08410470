//! Frame-driven simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform dependencies:
//! - One call to `tick` is one display frame
//! - Randomness comes from the instance's seeded RNG
//! - Timers are simulated-time countdowns owned by the instance
//! - Obstacles are processed in insertion order

pub mod boss;
pub mod collision;
pub mod generator;
pub mod physics;
pub mod scale;
pub mod state;
pub mod tick;
pub mod timer;
pub mod voice;

pub use boss::{Boss, BossEncounter, BossInput, EncounterError, Outcome, Phase};
pub use collision::{Aabb, CollisionEffect, resolve_runner_contacts};
pub use scale::{BossScale, ScaledConfig, Viewport, resolve_scale};
pub use state::{Lifecycle, Obstacle, ObstacleKind, Run, RunMode, RunSetup, RunState, Runner};
pub use tick::{TickInput, tick};
pub use timer::{FadeTimer, Scheduled};
pub use voice::{AmplitudeSource, MicError, VoiceInput, VoiceStatus};

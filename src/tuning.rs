//! Data-driven game balance
//!
//! Every spatial or velocity value is authored against the reference
//! resolution and multiplied by the resolved scale factor at runtime.
//! The presets reproduce the shipped feel; a JSON document can override them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a tuning document
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Score and currency handed to a terminal callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub score: u64,
    pub coins: u64,
}

impl Reward {
    pub const fn new(score: u64, coins: u64) -> Self {
        Self { score, coins }
    }
}

/// Balance for the side-scrolling runner modes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTuning {
    /// Reference resolution the values below are authored against
    pub ref_width: f32,
    pub ref_height: f32,
    /// Lower bound on the scale factor (tiny viewports)
    pub min_scale: f32,

    // === Runner physics (per frame) ===
    pub gravity: f32,
    /// Upward impulse, negative
    pub jump_impulse: f32,
    pub runner_x: f32,
    pub runner_size: f32,

    // === Scrolling ===
    pub base_speed: f32,
    pub speed_per_level: f32,
    /// Distance units per score point
    pub score_divisor: f32,

    // === Generation ===
    /// Initial generator cursor
    pub start_cursor: f32,
    pub base_gap: f32,
    pub variable_gap: f32,
    /// Spacing tightens by `1 + level * density_per_level`
    pub density_per_level: f32,
    /// Generate while fewer obstacles than this are live
    pub low_water: usize,
    /// Probability that a generated obstacle is a hazard
    pub hazard_chance: f32,
    pub hazard_size: f32,
    pub pickup_size: f32,
    /// Minimum height of a pickup above the ground
    pub pickup_lift: f32,
    /// Random extra height added on top of `pickup_lift`
    pub pickup_lift_band: f32,

    // === Portal ===
    pub portal_width: f32,
    pub portal_height: f32,
    /// Gap between the generator cursor and the portal
    pub portal_offset: f32,
    pub target_base: f32,
    pub target_per_level: f32,

    // === Collision & rewards ===
    /// Inward shrink applied to both boxes before overlap tests
    pub collision_buffer: f32,
    pub pickup_value: u64,
    /// Currency added on level completion
    pub completion_bonus: u64,

    /// Average spectral magnitude that counts as a voice jump
    pub voice_threshold: f32,
}

impl RunTuning {
    /// Pointer-driven runner
    pub fn classic() -> Self {
        Self {
            ref_width: 1000.0,
            ref_height: 800.0,
            min_scale: 0.4,
            gravity: 0.85,
            jump_impulse: -16.0,
            runner_x: 100.0,
            runner_size: 45.0,
            base_speed: 7.5,
            speed_per_level: 1.2,
            score_divisor: 12.0,
            start_cursor: 1200.0,
            base_gap: 400.0,
            variable_gap: 450.0,
            density_per_level: 0.15,
            low_water: 10,
            hazard_chance: 0.75,
            hazard_size: 40.0,
            pickup_size: 30.0,
            pickup_lift: 140.0,
            pickup_lift_band: 80.0,
            portal_width: 120.0,
            portal_height: 220.0,
            portal_offset: 600.0,
            target_base: 5000.0,
            target_per_level: 2500.0,
            collision_buffer: 4.0,
            pickup_value: 10,
            completion_bonus: 100,
            voice_threshold: 45.0,
        }
    }

    /// Microphone-driven runner: slower, wider spacing, flat pickups
    pub fn voice() -> Self {
        Self {
            min_scale: 0.45,
            gravity: 0.8,
            jump_impulse: -15.0,
            runner_x: 120.0,
            base_speed: 7.0,
            speed_per_level: 0.5,
            base_gap: 500.0,
            variable_gap: 400.0,
            density_per_level: 0.0,
            low_water: 8,
            hazard_chance: 0.7,
            pickup_lift_band: 0.0,
            portal_offset: 700.0,
            target_base: 6000.0,
            target_per_level: 2000.0,
            collision_buffer: 5.0,
            completion_bonus: 150,
            ..Self::classic()
        }
    }

    fn validate(&self) -> Result<(), TuningError> {
        positive("ref_width", self.ref_width)?;
        positive("ref_height", self.ref_height)?;
        positive("min_scale", self.min_scale)?;
        positive("score_divisor", self.score_divisor)?;
        if !(0.0..=1.0).contains(&self.hazard_chance) {
            return Err(TuningError::Invalid {
                field: "hazard_chance",
                reason: format!("{} is not a probability", self.hazard_chance),
            });
        }
        if self.low_water == 0 {
            return Err(TuningError::Invalid {
                field: "low_water",
                reason: "must allow at least one live obstacle".into(),
            });
        }
        if self.jump_impulse >= 0.0 {
            return Err(TuningError::Invalid {
                field: "jump_impulse",
                reason: "must point upward (negative)".into(),
            });
        }
        if self.density_per_level < 0.0 {
            return Err(TuningError::Invalid {
                field: "density_per_level",
                reason: "spacing may not widen with level".into(),
            });
        }
        Ok(())
    }
}

impl Default for RunTuning {
    fn default() -> Self {
        Self::classic()
    }
}

/// Balance for the boss encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossTuning {
    pub ref_width: f32,
    pub ref_height: f32,
    pub min_scale: f32,

    // === Player ===
    pub runner_x: f32,
    pub runner_size: f32,
    pub runner_hp: i32,
    /// Pointer steering keeps the runner this far from the top/bottom (pixels)
    pub steer_margin: f32,
    pub shot_width: f32,
    pub shot_height: f32,
    pub shot_speed: f32,
    pub shot_damage: u32,

    // === Boss ===
    pub boss_size: f32,
    pub boss_hp: u32,
    pub boss_start_inset: f32,
    pub boss_start_y: f32,
    pub boss_right_margin: f32,
    pub patrol_speed: f32,
    pub patrol_margin: f32,
    /// Horizontal shake while cornered (pixels)
    pub jitter: f32,
    pub taunt_interval_ms: f32,
    pub fire_interval_ms: f32,
    pub boss_shot_size: f32,
    pub boss_shot_speed: f32,
    /// Full range of the random vertical component of boss shots
    pub boss_shot_spread: f32,
    pub boss_shot_damage: i32,
    /// Inward shrink when testing boss shots against the runner
    pub hit_buffer: f32,
    /// Inward shrink of the boss box when testing player shots
    #[serde(default)]
    pub boss_hit_buffer: f32,

    // === Scripted resolution ===
    pub surrender_delay_ms: f32,
    pub lethal_insult_delay_ms: f32,
    pub lethal_teleport_delay_ms: f32,
    pub merciful_teleport_delay_ms: f32,
    pub final_shot_speed: f32,
    pub lethal_reward: Reward,
    pub merciful_reward: Reward,
    pub defeat_reward: Reward,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            ref_width: 1100.0,
            ref_height: 800.0,
            min_scale: 0.45,
            runner_x: 80.0,
            runner_size: 50.0,
            runner_hp: 100,
            steer_margin: 30.0,
            shot_width: 30.0,
            shot_height: 12.0,
            shot_speed: 18.0,
            shot_damage: 10,
            boss_size: 150.0,
            boss_hp: 200,
            boss_start_inset: 280.0,
            boss_start_y: 100.0,
            boss_right_margin: 40.0,
            patrol_speed: 4.0,
            patrol_margin: 40.0,
            jitter: 6.0,
            taunt_interval_ms: 3000.0,
            fire_interval_ms: 1500.0,
            boss_shot_size: 35.0,
            boss_shot_speed: 10.0,
            boss_shot_spread: 7.0,
            boss_shot_damage: 15,
            hit_buffer: 6.0,
            boss_hit_buffer: 0.0,
            surrender_delay_ms: 2500.0,
            lethal_insult_delay_ms: 1500.0,
            lethal_teleport_delay_ms: 1500.0,
            merciful_teleport_delay_ms: 2500.0,
            final_shot_speed: 30.0,
            lethal_reward: Reward::new(2000, 300),
            merciful_reward: Reward::new(4000, 1500),
            defeat_reward: Reward::new(500, 50),
        }
    }
}

impl BossTuning {
    fn validate(&self) -> Result<(), TuningError> {
        positive("boss.ref_width", self.ref_width)?;
        positive("boss.ref_height", self.ref_height)?;
        positive("boss.min_scale", self.min_scale)?;
        if self.boss_hp == 0 {
            return Err(TuningError::Invalid {
                field: "boss.boss_hp",
                reason: "boss must start alive".into(),
            });
        }
        if self.runner_hp <= 0 {
            return Err(TuningError::Invalid {
                field: "boss.runner_hp",
                reason: "runner must start alive".into(),
            });
        }
        Ok(())
    }
}

/// Lines spoken by the boss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossScript {
    pub taunts: Vec<String>,
    pub surrender: String,
    pub lethal_plea: String,
    pub lethal_insult: String,
    pub merciful_thanks: String,
}

impl Default for BossScript {
    fn default() -> Self {
        Self {
            taunts: [
                "POTA!",
                "GNARI!",
                "OCIO!",
                "INCÙ L'È TARDE!",
                "FIGA!",
                "MA VA A CA'!",
                "TA PISE!",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            surrender: "ORCA CAN! FERMET GNARO... ME ARRENDO!".into(),
            lethal_plea: "NOOO! FERMET!".into(),
            lethal_insult: "ALURA TE SE' 'N BALOSS! P...!".into(),
            merciful_thanks: "BRAO GNARO! SOM AMIS, ANDOMA A BE' 'NA BIRRA!".into(),
        }
    }
}

/// Complete balance document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    #[serde(default = "RunTuning::classic")]
    pub classic: RunTuning,
    #[serde(default = "RunTuning::voice")]
    pub voice: RunTuning,
    #[serde(default)]
    pub boss: BossTuning,
    #[serde(default)]
    pub script: BossScript,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            classic: RunTuning::classic(),
            voice: RunTuning::voice(),
            boss: BossTuning::default(),
            script: BossScript::default(),
        }
    }
}

impl Tuning {
    /// Parse and validate a tuning document. Missing tables fall back to presets.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded tuning overrides");
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        self.classic.validate()?;
        self.voice.validate()?;
        self.boss.validate()?;
        if self.script.taunts.is_empty() {
            return Err(TuningError::Invalid {
                field: "script.taunts",
                reason: "the boss needs at least one taunt".into(),
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: format!("{value} must be positive"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_voice_preset_differs_where_tuned() {
        let classic = RunTuning::classic();
        let voice = RunTuning::voice();
        assert_eq!(voice.low_water, 8);
        assert_eq!(voice.completion_bonus, 150);
        assert_eq!(voice.density_per_level, 0.0);
        // Shared values come from the classic preset
        assert_eq!(voice.portal_height, classic.portal_height);
        assert_eq!(voice.score_divisor, classic.score_divisor);
    }

    #[test]
    fn test_missing_tables_use_presets() {
        let tuning = Tuning::from_json("{}").unwrap();
        assert_eq!(tuning, Tuning::default());
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut tuning = Tuning::default();
        tuning.classic.hazard_chance = 0.5;
        let json = serde_json::to_string(&tuning).unwrap();
        let parsed = Tuning::from_json(&json).unwrap();
        assert_eq!(parsed.classic.hazard_chance, 0.5);
    }

    #[test]
    fn test_rejects_bad_probability() {
        let mut tuning = Tuning::default();
        tuning.voice.hazard_chance = 1.5;
        let json = serde_json::to_string(&tuning).unwrap();
        let err = Tuning::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid {
                field: "hazard_chance",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_empty_taunts() {
        let mut tuning = Tuning::default();
        tuning.script.taunts.clear();
        assert!(tuning.validate().is_err());
    }
}

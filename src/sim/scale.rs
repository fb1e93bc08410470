//! Resolution-independent scaling
//!
//! Gameplay values are authored against a reference resolution. One scale
//! factor derived from the viewport multiplies all of them, and the results
//! are cached in a [`ScaledConfig`] that is rebuilt whenever the viewport
//! changes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::GROUND_RATIO;
use crate::tuning::{BossTuning, RunTuning};

/// Drawable area in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Y coordinate of the ground line
    #[inline]
    pub fn ground_y(&self) -> f32 {
        self.height * GROUND_RATIO
    }
}

/// `max(min(width / ref_width, height / ref_height), min_scale)`
pub fn resolve_scale(viewport: Viewport, ref_width: f32, ref_height: f32, min_scale: f32) -> f32 {
    let fit = (viewport.width / ref_width).min(viewport.height / ref_height);
    // NaN from a zero-sized viewport falls through to the floor
    if fit.is_nan() { min_scale } else { fit.max(min_scale) }
}

/// Runner-mode values multiplied out for the current viewport and level
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledConfig {
    pub viewport: Viewport,
    pub scale: f32,
    pub ground_y: f32,
    pub gravity: f32,
    pub jump_impulse: f32,
    /// Horizontal drift per frame, also the distance gained per frame
    pub speed: f32,
    pub score_divisor: f32,
    pub base_gap: f32,
    /// Upper bound of the random spacing, already divided by the level density
    pub variable_gap: f32,
    pub hazard_size: f32,
    pub pickup_size: f32,
    pub pickup_lift: f32,
    pub pickup_lift_band: f32,
    pub portal_size: Vec2,
    pub portal_offset: f32,
    pub collision_buffer: f32,
}

impl ScaledConfig {
    pub fn new(tuning: &RunTuning, level: u32, viewport: Viewport) -> Self {
        let s = resolve_scale(viewport, tuning.ref_width, tuning.ref_height, tuning.min_scale);
        let level_f = level as f32;
        let density = 1.0 + level_f * tuning.density_per_level;

        Self {
            viewport,
            scale: s,
            ground_y: viewport.ground_y(),
            gravity: tuning.gravity * s,
            jump_impulse: tuning.jump_impulse * s,
            speed: (tuning.base_speed + level_f * tuning.speed_per_level) * s,
            score_divisor: tuning.score_divisor * s,
            base_gap: tuning.base_gap * s,
            variable_gap: tuning.variable_gap * s / density,
            hazard_size: tuning.hazard_size * s,
            pickup_size: tuning.pickup_size * s,
            pickup_lift: tuning.pickup_lift * s,
            pickup_lift_band: tuning.pickup_lift_band * s,
            portal_size: Vec2::new(tuning.portal_width, tuning.portal_height) * s,
            portal_offset: tuning.portal_offset * s,
            collision_buffer: tuning.collision_buffer * s,
        }
    }

    /// Distance at which the portal spawns for `level`
    pub fn target_distance(&self, tuning: &RunTuning, level: u32) -> f32 {
        (tuning.target_base + level as f32 * tuning.target_per_level) * self.scale
    }

    /// Score for an accumulated distance
    #[inline]
    pub fn score_for(&self, distance: f32) -> u64 {
        (distance / self.score_divisor).floor().max(0.0) as u64
    }
}

/// Boss-mode values multiplied out for the current viewport
#[derive(Debug, Clone, PartialEq)]
pub struct BossScale {
    pub viewport: Viewport,
    pub scale: f32,
}

impl BossScale {
    pub fn new(tuning: &BossTuning, viewport: Viewport) -> Self {
        Self {
            viewport,
            scale: resolve_scale(viewport, tuning.ref_width, tuning.ref_height, tuning.min_scale),
        }
    }

    /// Multiply a reference-resolution value by the scale factor
    #[inline]
    pub fn px(&self, value: f32) -> f32 {
        value * self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_reference_viewport_is_one() {
        let s = resolve_scale(Viewport::new(1000.0, 800.0), 1000.0, 800.0, 0.4);
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_scale_uses_tighter_axis() {
        // Wide but short: height limits
        let s = resolve_scale(Viewport::new(3000.0, 400.0), 1000.0, 800.0, 0.1);
        assert!((s - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_scale_floor() {
        let s = resolve_scale(Viewport::new(100.0, 100.0), 1000.0, 800.0, 0.4);
        assert_eq!(s, 0.4);
        let s = resolve_scale(Viewport::new(0.0, 0.0), 1000.0, 800.0, 0.45);
        assert_eq!(s, 0.45);
    }

    #[test]
    fn test_config_speed_grows_with_level() {
        let tuning = RunTuning::classic();
        let vp = Viewport::new(1000.0, 800.0);
        let l1 = ScaledConfig::new(&tuning, 1, vp);
        let l5 = ScaledConfig::new(&tuning, 5, vp);
        assert!((l1.speed - 8.7).abs() < 1e-4);
        assert!(l5.speed > l1.speed);
        // Density factor tightens spacing
        assert!(l5.variable_gap < l1.variable_gap);
        assert_eq!(l1.ground_y, 600.0);
    }

    #[test]
    fn test_config_scales_with_viewport() {
        let tuning = RunTuning::classic();
        let full = ScaledConfig::new(&tuning, 1, Viewport::new(1000.0, 800.0));
        let half = ScaledConfig::new(&tuning, 1, Viewport::new(500.0, 400.0));
        assert!((half.gravity - full.gravity * 0.5).abs() < 1e-6);
        assert!((half.portal_size.y - 110.0).abs() < 1e-4);
        // Score rate is scale independent: same number of frames, same score
        let frames = 100.0;
        assert_eq!(
            full.score_for(full.speed * frames),
            half.score_for(half.speed * frames)
        );
    }

    #[test]
    fn test_target_distance() {
        let tuning = RunTuning::classic();
        let cfg = ScaledConfig::new(&tuning, 2, Viewport::new(1000.0, 800.0));
        assert_eq!(cfg.target_distance(&tuning, 2), 10000.0);
    }
}

//! Runner physics: constant gravity, impulse jumps, airborne tumble

use super::state::Runner;
use crate::snap_quarter_turn;

/// Advance the runner by one frame.
///
/// Returns true on the frame the runner lands (grounded goes false -> true).
pub fn integrate(runner: &mut Runner, gravity: f32, ground_y: f32, tumble: f32) -> bool {
    let was_grounded = runner.grounded;

    runner.vel_y += gravity;
    runner.pos.y += runner.vel_y;

    if runner.pos.y + runner.size.y > ground_y {
        runner.settle_on(ground_y);
        runner.rotation = snap_quarter_turn(runner.rotation);
    } else {
        runner.lift_off();
        runner.rotation += tumble;
    }

    runner.grounded && !was_grounded
}

/// Start a jump. Only allowed from the ground; returns whether it happened.
pub fn jump(runner: &mut Runner, impulse: f32) -> bool {
    if !runner.grounded {
        return false;
    }
    runner.vel_y = impulse;
    runner.lift_off();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TUMBLE_PER_FRAME;
    use crate::is_quarter_turn;
    use glam::Vec2;

    const GROUND: f32 = 600.0;

    fn runner_on_ground() -> Runner {
        let mut r = Runner::new(Vec2::new(100.0, GROUND - 45.0), 45.0, [1.0; 4]);
        integrate(&mut r, 0.85, GROUND, TUMBLE_PER_FRAME);
        r
    }

    #[test]
    fn test_falls_and_lands_on_ground() {
        let mut r = Runner::new(Vec2::new(100.0, 0.0), 45.0, [1.0; 4]);
        let mut landed_frames = 0;
        for _ in 0..200 {
            if integrate(&mut r, 0.85, GROUND, TUMBLE_PER_FRAME) {
                landed_frames += 1;
            }
        }
        assert_eq!(landed_frames, 1);
        assert!(r.grounded);
        assert_eq!(r.pos.y + r.size.y, GROUND);
        assert_eq!(r.vel_y, 0.0);
    }

    #[test]
    fn test_lands_exactly_on_unrepresentable_ground() {
        // 0.75 * 741.4675 and a scaled hen size do not sum back exactly
        let ground = 741.4675 * 0.75;
        let mut r = Runner::new(Vec2::new(100.0, 0.0), 45.0 * 0.926_841_9, [1.0; 4]);
        for _ in 0..200 {
            integrate(&mut r, 0.85 * 0.926_841_9, ground, TUMBLE_PER_FRAME);
        }
        assert!(r.grounded);
        assert_eq!(r.bottom(), ground);
        assert!((r.pos.y + r.size.y - ground).abs() <= crate::consts::GROUND_TOLERANCE);
    }

    #[test]
    fn test_rotation_snaps_on_landing() {
        let mut r = Runner::new(Vec2::new(100.0, 0.0), 45.0, [1.0; 4]);
        loop {
            let landed = integrate(&mut r, 0.85, GROUND, TUMBLE_PER_FRAME);
            if landed {
                break;
            }
            // Mid-air rotation is generally off the quarter grid
        }
        assert!(is_quarter_turn(r.rotation, 1e-4));
    }

    #[test]
    fn test_jump_only_from_ground() {
        let mut r = runner_on_ground();
        assert!(jump(&mut r, -16.0));
        assert_eq!(r.vel_y, -16.0);
        assert!(!r.grounded);
        // Second request while airborne is ignored
        assert!(!jump(&mut r, -16.0));
        assert_eq!(r.vel_y, -16.0);
    }

    #[test]
    fn test_jump_arc_returns_to_ground() {
        let mut r = runner_on_ground();
        jump(&mut r, -16.0);
        let mut peak = f32::MAX;
        let mut frames = 0;
        while !integrate(&mut r, 0.85, GROUND, TUMBLE_PER_FRAME) {
            peak = peak.min(r.pos.y);
            frames += 1;
            assert!(frames < 100, "never landed");
        }
        // Roughly 150px of air at reference scale
        assert!(GROUND - 45.0 - peak > 120.0);
        assert!((35..=40).contains(&frames));
        assert_eq!(r.vel_y, 0.0);
    }
}

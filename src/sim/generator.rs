//! Procedural obstacle generation
//!
//! A cursor tracks the x of the most recently placed obstacle. New obstacles
//! are appended ahead of it with randomized spacing; once the distance target
//! is reached a single portal is placed and generation stops for the run.

use glam::Vec2;
use rand::Rng;

use super::scale::ScaledConfig;
use super::state::{Obstacle, ObstacleKind, Run};
use crate::consts::PRUNE_MARGIN;

/// Geometry of an obstacle before it gets an ID
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub kind: ObstacleKind,
    pub pos: Vec2,
    pub size: Vec2,
}

/// Roll the next hazard or pickup after `cursor`
pub fn roll_obstacle<R: Rng + ?Sized>(
    cursor: f32,
    cfg: &ScaledConfig,
    hazard_chance: f32,
    rng: &mut R,
) -> Placement {
    let x = cursor + cfg.base_gap + rng.random::<f32>() * cfg.variable_gap;

    if rng.random::<f32>() < hazard_chance {
        Placement {
            kind: ObstacleKind::Hazard,
            pos: Vec2::new(x, cfg.ground_y - cfg.hazard_size),
            size: Vec2::splat(cfg.hazard_size),
        }
    } else {
        // Raised so it takes a timed jump to reach
        let lift = cfg.pickup_lift + rng.random::<f32>() * cfg.pickup_lift_band;
        Placement {
            kind: ObstacleKind::Pickup,
            pos: Vec2::new(x, cfg.ground_y - lift),
            size: Vec2::splat(cfg.pickup_size),
        }
    }
}

/// Portal standing on the ground beyond `cursor`
pub fn portal_placement(cursor: f32, cfg: &ScaledConfig) -> Placement {
    Placement {
        kind: ObstacleKind::Portal,
        pos: Vec2::new(cursor + cfg.portal_offset, cfg.ground_y - cfg.portal_size.y),
        size: cfg.portal_size,
    }
}

/// Append one obstacle if below the low-water mark and the portal is not placed
pub fn top_up(run: &mut Run) -> Option<u32> {
    if run.state.portal_spawned || run.obstacles.len() >= run.tuning.low_water {
        return None;
    }

    let placement = roll_obstacle(
        run.state.last_obstacle_x,
        &run.config,
        run.tuning.hazard_chance,
        &mut run.rng,
    );
    let id = run.next_entity_id();
    run.obstacles
        .push(Obstacle::new(id, placement.kind, placement.pos, placement.size));
    run.state.last_obstacle_x = placement.pos.x;
    Some(id)
}

/// Place the portal once the distance target is reached. Latched per run.
pub fn spawn_portal_if_due(run: &mut Run) -> bool {
    if run.state.portal_spawned || run.state.distance < run.state.target_distance {
        return false;
    }

    let placement = portal_placement(run.state.last_obstacle_x, &run.config);
    let id = run.next_entity_id();
    run.obstacles
        .push(Obstacle::new(id, placement.kind, placement.pos, placement.size));
    run.state.portal_spawned = true;
    debug_assert_eq!(run.portal_count(), 1, "portal spawned twice");

    log::debug!(
        "Portal placed at x={:.0} after {:.0} distance",
        placement.pos.x,
        run.state.distance
    );
    true
}

/// Shift terrain and the cursor left by `speed`
pub fn scroll(obstacles: &mut [Obstacle], cursor: &mut f32, speed: f32) {
    for obs in obstacles.iter_mut() {
        obs.pos.x -= speed;
    }
    *cursor -= speed;
}

/// Drop obstacles that have fully left the screen on the left
pub fn prune_passed(obstacles: &mut Vec<Obstacle>) {
    obstacles.retain(|o| o.right() > -PRUNE_MARGIN);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::scale::Viewport;
    use crate::sim::state::RunSetup;
    use crate::tuning::RunTuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn cfg(tuning: &RunTuning, level: u32) -> ScaledConfig {
        ScaledConfig::new(tuning, level, Viewport::new(1000.0, 800.0))
    }

    fn run() -> Run {
        Run::new(RunTuning::classic(), &RunSetup::default(), Viewport::new(1000.0, 800.0))
    }

    #[test]
    fn test_spacing_bounds() {
        let tuning = RunTuning::classic();
        let cfg = cfg(&tuning, 1);
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..500 {
            let p = roll_obstacle(0.0, &cfg, tuning.hazard_chance, &mut rng);
            assert!(p.pos.x >= 400.0);
            assert!(p.pos.x <= 400.0 + 450.0 / 1.15 + 1e-3);
        }
    }

    #[test]
    fn test_kinds_and_heights() {
        let tuning = RunTuning::classic();
        let cfg = cfg(&tuning, 1);
        let mut rng = Pcg32::seed_from_u64(42);
        let mut hazards = 0;
        let n = 2000;
        for _ in 0..n {
            let p = roll_obstacle(0.0, &cfg, tuning.hazard_chance, &mut rng);
            match p.kind {
                ObstacleKind::Hazard => {
                    hazards += 1;
                    assert_eq!(p.pos.y + p.size.y, cfg.ground_y);
                }
                ObstacleKind::Pickup => {
                    let lift = cfg.ground_y - p.pos.y;
                    assert!((140.0..=220.0).contains(&lift));
                }
                other => panic!("unexpected kind {other:?}"),
            }
        }
        let ratio = hazards as f32 / n as f32;
        assert!((0.70..0.80).contains(&ratio), "hazard ratio {ratio}");
    }

    #[test]
    fn test_same_seed_same_field() {
        let tuning = RunTuning::classic();
        let cfg = cfg(&tuning, 3);
        let mut a = Pcg32::seed_from_u64(99);
        let mut b = Pcg32::seed_from_u64(99);
        for _ in 0..50 {
            assert_eq!(
                roll_obstacle(10.0, &cfg, 0.75, &mut a),
                roll_obstacle(10.0, &cfg, 0.75, &mut b)
            );
        }
    }

    #[test]
    fn test_top_up_respects_low_water() {
        let mut run = run();
        for _ in 0..50 {
            top_up(&mut run);
        }
        assert_eq!(run.obstacles.len(), 10);
        // Cursor follows the last placement, positions strictly increase
        let xs: Vec<f32> = run.obstacles.iter().map(|o| o.pos.x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(run.state.last_obstacle_x, *xs.last().unwrap());
    }

    #[test]
    fn test_portal_latches() {
        let mut run = run();
        top_up(&mut run);
        assert!(!spawn_portal_if_due(&mut run));
        run.state.distance = run.state.target_distance;
        assert!(spawn_portal_if_due(&mut run));
        assert!(!spawn_portal_if_due(&mut run));
        assert_eq!(run.portal_count(), 1);

        let portal = run.obstacles.last().unwrap();
        assert_eq!(portal.pos.x, run.state.last_obstacle_x + 600.0);
        // Generation is disabled after the portal
        let before = run.obstacles.len();
        assert_eq!(top_up(&mut run), None);
        assert_eq!(run.obstacles.len(), before);
    }

    #[test]
    fn test_scroll_and_prune() {
        let mut obstacles = vec![
            Obstacle::new(1, ObstacleKind::Hazard, Vec2::new(-130.0, 0.0), Vec2::splat(40.0)),
            Obstacle::new(2, ObstacleKind::Hazard, Vec2::new(500.0, 0.0), Vec2::splat(40.0)),
        ];
        let mut cursor = 500.0;
        scroll(&mut obstacles, &mut cursor, 20.0);
        assert_eq!(cursor, 480.0);
        prune_passed(&mut obstacles);
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].id, 2);
    }
}

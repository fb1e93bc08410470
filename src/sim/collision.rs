//! Axis-aligned collision tests and contact resolution
//!
//! Everything in the game is a box. Each contact shrinks the boxes by a
//! per-mode buffer before testing, which makes near misses forgiving.

use glam::Vec2;

use super::state::{Obstacle, ObstacleKind, Runner};
use crate::consts::PRUNE_MARGIN;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box from a top-left corner and size
    pub fn from_rect(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    /// Shrink every edge inward by `amount`
    pub fn inset(self, amount: f32) -> Self {
        Self {
            min: self.min + Vec2::splat(amount),
            max: self.max - Vec2::splat(amount),
        }
    }

    /// Strict overlap; touching edges do not count
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

impl From<&Runner> for Aabb {
    fn from(runner: &Runner) -> Self {
        Aabb::from_rect(runner.pos, runner.size)
    }
}

impl From<&Obstacle> for Aabb {
    fn from(obs: &Obstacle) -> Self {
        Aabb::from_rect(obs.pos, obs.size)
    }
}

/// What a runner contact did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEffect {
    /// Pickup collected (ID of the obstacle)
    Collected(u32),
    /// Hazard touched, run is over
    Hit(u32),
    /// Portal touched, level is ending
    Portal(u32),
}

impl CollisionEffect {
    /// Whether this effect ends active gameplay
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CollisionEffect::Collected(_))
    }
}

/// Runner vs terrain: both boxes are inset by `buffer`
#[inline]
pub fn runner_touches(runner: &Runner, obs: &Obstacle, buffer: f32) -> bool {
    Aabb::from(runner)
        .inset(buffer)
        .intersects(&Aabb::from(obs).inset(buffer))
}

/// Projectile vs a target box inset by `buffer`
#[inline]
pub fn projectile_hits(projectile: &Obstacle, target: Aabb, buffer: f32) -> bool {
    Aabb::from(projectile).intersects(&target.inset(buffer))
}

/// Test the runner against terrain in insertion order.
///
/// Every obstacle that produces an effect is marked collected so it can never
/// fire again. Resolution stops at the first terminal effect.
pub fn resolve_runner_contacts(
    runner: &Runner,
    obstacles: &mut [Obstacle],
    buffer: f32,
) -> Vec<CollisionEffect> {
    let mut effects = Vec::new();

    for obs in obstacles.iter_mut() {
        if obs.collected || !runner_touches(runner, obs, buffer) {
            continue;
        }

        let effect = match obs.kind {
            ObstacleKind::Pickup => CollisionEffect::Collected(obs.id),
            ObstacleKind::Hazard => CollisionEffect::Hit(obs.id),
            ObstacleKind::Portal => CollisionEffect::Portal(obs.id),
            // Projectiles are handled by the boss encounter
            ObstacleKind::PlayerProjectile | ObstacleKind::BossProjectile => continue,
        };
        obs.collected = true;
        effects.push(effect);

        if effect.is_terminal() {
            break;
        }
    }

    effects
}

/// Drop projectiles that have left the horizontal bounds
pub fn prune_projectiles(projectiles: &mut Vec<Obstacle>, width: f32) {
    projectiles.retain(|p| p.pos.x <= width + PRUNE_MARGIN && p.pos.x >= -PRUNE_MARGIN);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner_at(x: f32, y: f32) -> Runner {
        Runner::new(Vec2::new(x, y), 45.0, [1.0; 4])
    }

    fn obstacle(id: u32, kind: ObstacleKind, x: f32, y: f32, size: f32) -> Obstacle {
        Obstacle::new(id, kind, Vec2::new(x, y), Vec2::splat(size))
    }

    #[test]
    fn test_aabb_intersects_strict() {
        let a = Aabb::from_rect(Vec2::ZERO, Vec2::splat(10.0));
        let b = Aabb::from_rect(Vec2::new(10.0, 0.0), Vec2::splat(10.0));
        assert!(!a.intersects(&b));
        let c = Aabb::from_rect(Vec2::new(9.0, 9.0), Vec2::splat(10.0));
        assert!(a.intersects(&c));
        assert!(c.intersects(&a));
    }

    #[test]
    fn test_buffer_forgives_grazes() {
        let runner = runner_at(100.0, 100.0);
        // Overlaps by 6px horizontally: inside the 2x4px combined buffer
        let spike = obstacle(1, ObstacleKind::Hazard, 139.0, 100.0, 40.0);
        assert!(runner_touches(&runner, &spike, 0.0));
        assert!(!runner_touches(&runner, &spike, 4.0));
        // Overlaps by 20px: a real hit
        let spike = obstacle(2, ObstacleKind::Hazard, 125.0, 100.0, 40.0);
        assert!(runner_touches(&runner, &spike, 4.0));
    }

    #[test]
    fn test_pickup_collected_once() {
        let runner = runner_at(100.0, 100.0);
        let mut obstacles = vec![obstacle(7, ObstacleKind::Pickup, 110.0, 110.0, 30.0)];
        let first = resolve_runner_contacts(&runner, &mut obstacles, 4.0);
        assert_eq!(first, vec![CollisionEffect::Collected(7)]);
        assert!(obstacles[0].collected);
        let second = resolve_runner_contacts(&runner, &mut obstacles, 4.0);
        assert!(second.is_empty());
    }

    #[test]
    fn test_stops_at_terminal_effect() {
        let runner = runner_at(100.0, 100.0);
        let mut obstacles = vec![
            obstacle(1, ObstacleKind::Pickup, 110.0, 110.0, 30.0),
            obstacle(2, ObstacleKind::Hazard, 110.0, 110.0, 40.0),
            obstacle(3, ObstacleKind::Pickup, 110.0, 110.0, 30.0),
        ];
        let effects = resolve_runner_contacts(&runner, &mut obstacles, 4.0);
        assert_eq!(
            effects,
            vec![CollisionEffect::Collected(1), CollisionEffect::Hit(2)]
        );
        assert!(!obstacles[2].collected);
    }

    #[test]
    fn test_portal_contact() {
        let runner = runner_at(100.0, 455.0);
        let mut obstacles = vec![obstacle(9, ObstacleKind::Portal, 120.0, 380.0, 120.0)];
        let effects = resolve_runner_contacts(&runner, &mut obstacles, 4.0);
        assert_eq!(effects, vec![CollisionEffect::Portal(9)]);
        assert!(effects[0].is_terminal());
    }

    #[test]
    fn test_projectile_hits_with_target_inset() {
        let target = Aabb::from_rect(Vec2::new(80.0, 300.0), Vec2::splat(50.0));
        let graze = obstacle(1, ObstacleKind::BossProjectile, 127.0, 300.0, 35.0);
        assert!(projectile_hits(&graze, target, 0.0));
        assert!(!projectile_hits(&graze, target, 6.0));
        let direct = obstacle(2, ObstacleKind::BossProjectile, 90.0, 310.0, 35.0);
        assert!(projectile_hits(&direct, target, 6.0));
    }

    #[test]
    fn test_prune_projectiles() {
        let mut shots = vec![
            obstacle(1, ObstacleKind::PlayerProjectile, 1250.0, 0.0, 10.0),
            obstacle(2, ObstacleKind::BossProjectile, -150.0, 0.0, 10.0),
            obstacle(3, ObstacleKind::BossProjectile, 500.0, 0.0, 10.0),
        ];
        prune_projectiles(&mut shots, 1100.0);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].id, 3);
    }
}

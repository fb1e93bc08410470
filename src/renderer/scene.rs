//! Scene tessellation
//!
//! Turns simulation state into a pixel-space triangle list. Nothing here
//! touches the GPU, so the output can be checked in native tests.

use glam::Vec2;

use super::shapes;
use super::vertex::{Vertex, colors};
use crate::sim::{BossEncounter, Lifecycle, ObstacleKind, Outcome, Phase, Run, Runner};

const CIRCLE_SEGMENTS: u32 = 24;
/// Spacing of the arena grid (reference pixels)
const GRID_STEP: f32 = 80.0;
/// Frames per explosion pulse
const EXPLOSION_PERIOD: u64 = 18;

/// Local point of a rotated body mapped to screen space
#[inline]
fn place(center: Vec2, rot: Vec2, local: Vec2) -> Vec2 {
    center + rot.rotate(local)
}

/// The hen: body, comb, beak and eye, rotated around its center
fn hen(out: &mut Vec<Vertex>, runner: &Runner, rotation: f32, s: f32) {
    let center = runner.center();
    let (pw, ph) = (runner.size.x, runner.size.y);
    let rot = Vec2::from_angle(rotation);

    out.extend(shapes::rotated_rect(center, runner.size, rotation, runner.color));

    for x in [-pw / 4.0, 0.0, pw / 4.0] {
        let c = place(center, rot, Vec2::new(x, -ph / 2.0));
        out.extend(shapes::circle(c, 6.0 * s, colors::COMB, 12));
    }

    out.extend(shapes::triangle(
        place(center, rot, Vec2::new(pw / 2.0 - 2.0 * s, -ph / 4.0)),
        place(center, rot, Vec2::new(pw / 2.0 + 12.0 * s, 0.0)),
        place(center, rot, Vec2::new(pw / 2.0 - 2.0 * s, ph / 4.0)),
        colors::BEAK,
    ));

    let eye = place(center, rot, Vec2::new(pw / 4.0, -ph / 6.0));
    out.extend(shapes::circle(eye, 3.0 * s, colors::EYE, 8));
}

fn full_screen(out: &mut Vec<Vertex>, size: Vec2, color: [f32; 4]) {
    out.extend(shapes::rect(Vec2::ZERO, size, color));
}

/// Runner-mode frame
pub fn run_scene(run: &Run, reduced_motion: bool) -> Vec<Vertex> {
    let cfg = &run.config;
    let s = cfg.scale;
    let screen = Vec2::new(cfg.viewport.width, cfg.viewport.height);
    let mut out = Vec::with_capacity(512);

    full_screen(&mut out, screen, colors::SKY);
    out.extend(shapes::rect(
        Vec2::new(0.0, cfg.ground_y),
        Vec2::new(screen.x, screen.y - cfg.ground_y),
        colors::GROUND,
    ));
    out.extend(shapes::rect(
        Vec2::new(0.0, cfg.ground_y - s),
        Vec2::new(screen.x, 2.0 * s),
        colors::GROUND_LINE,
    ));

    for obs in run.obstacles.iter().filter(|o| !o.collected) {
        match obs.kind {
            ObstacleKind::Hazard => out.extend(shapes::triangle(
                Vec2::new(obs.pos.x, obs.pos.y + obs.size.y),
                Vec2::new(obs.pos.x + obs.size.x / 2.0, obs.pos.y),
                obs.pos + obs.size,
                colors::SPIKE,
            )),
            ObstacleKind::Pickup => out.extend(shapes::circle(
                obs.center(),
                obs.size.x / 2.0,
                colors::COIN,
                CIRCLE_SEGMENTS,
            )),
            ObstacleKind::Portal => out.extend(shapes::ellipse(
                obs.center(),
                obs.size * 0.5,
                colors::PORTAL,
                CIRCLE_SEGMENTS * 2,
            )),
            // Projectiles only exist in the boss arena
            ObstacleKind::PlayerProjectile | ObstacleKind::BossProjectile => {}
        }
    }

    let rotation = if reduced_motion { 0.0 } else { run.runner.rotation };
    hen(&mut out, &run.runner, rotation, s);

    if run.lifecycle == Lifecycle::Teleporting {
        let alpha = if reduced_motion {
            1.0
        } else {
            run.fade.progress().min(1.0)
        };
        full_screen(&mut out, screen, colors::with_alpha(colors::FADE, alpha));
    }

    out
}

/// Boss-mode frame
pub fn boss_scene(enc: &BossEncounter) -> Vec<Vertex> {
    let s = enc.scale.scale;
    let vp = enc.viewport();
    let screen = Vec2::new(vp.width, vp.height);
    let boss = &enc.boss;
    let mut out = Vec::with_capacity(1024);

    full_screen(&mut out, screen, colors::ARENA);

    let step = GRID_STEP * s;
    let mut x = 0.0;
    while x < screen.x {
        out.extend(shapes::rect(Vec2::new(x, 0.0), Vec2::new(1.0, screen.y), colors::GRID));
        x += step;
    }
    let mut y = 0.0;
    while y < screen.y {
        out.extend(shapes::rect(Vec2::new(0.0, y), Vec2::new(screen.x, 1.0), colors::GRID));
        y += step;
    }

    let outcome = match enc.phase {
        Phase::Resolving(o) | Phase::Done(o) => Some(o),
        _ => None,
    };

    if outcome == Some(Outcome::Lethal) && enc.detonated {
        let pulse = (enc.frames % EXPLOSION_PERIOD) as f32 / EXPLOSION_PERIOD as f32;
        let center = boss.pos + boss.size * 0.5;
        out.extend(shapes::circle(center, pulse * 400.0 * s, colors::EXPLOSION, CIRCLE_SEGMENTS * 2));
    } else {
        let mut color = if outcome == Some(Outcome::Merciful) {
            colors::BOSS_SPARED
        } else {
            colors::BOSS
        };
        if enc.phase != Phase::Combat {
            color[3] = 0.9;
        }
        out.extend(shapes::rect(boss.pos, boss.size, color));
        // Speech strip above the head; the text itself is DOM
        out.extend(shapes::rect(
            Vec2::new(boss.pos.x + 10.0 * s, boss.pos.y - 20.0 * s),
            Vec2::new(boss.size.x - 20.0 * s, 30.0 * s),
            colors::BAR_BACK,
        ));
        if enc.phase == Phase::Combat {
            out.extend(shapes::bar(
                Vec2::new(boss.pos.x, boss.pos.y - 15.0 * s),
                Vec2::new(boss.size.x, 8.0 * s),
                boss.health_fraction(),
                colors::BOSS_HEALTH,
                colors::BAR_BACK,
            ));
        }
    }

    let runner = &enc.runner;
    if let Some(x) = enc.final_shot {
        out.extend(shapes::rect(
            Vec2::new(x, runner.center().y),
            Vec2::new(50.0 * s, 15.0 * s),
            colors::PLAYER_SHOT,
        ));
    }

    out.extend(shapes::rect(runner.pos, runner.size, runner.color));
    if outcome != Some(Outcome::Merciful) {
        let c = runner.center();
        out.extend(shapes::rect(
            Vec2::new(c.x + 15.0 * s, c.y - 8.0 * s),
            Vec2::new(50.0 * s, 18.0 * s),
            colors::BLASTER,
        ));
    }

    let hp_fraction = match runner.hp {
        Some(hp) if enc.tuning.runner_hp > 0 => hp.max(0) as f32 / enc.tuning.runner_hp as f32,
        _ => 0.0,
    };
    out.extend(shapes::bar(
        Vec2::new(20.0 * s, screen.y - 40.0 * s),
        Vec2::new(150.0 * s, 14.0 * s),
        hp_fraction,
        colors::HEALTH,
        colors::BAR_BACK,
    ));

    for shot in &enc.player_shots {
        out.extend(shapes::rect(shot.pos, shot.size, colors::PLAYER_SHOT));
    }
    for shot in &enc.boss_shots {
        out.extend(shapes::circle(shot.center(), shot.size.x / 2.0, colors::BOSS_SHOT, 16));
    }

    // Arena dims once a decision has been made
    if outcome.is_some() {
        full_screen(&mut out, screen, colors::DIM);
    }
    if let Phase::Done(_) = enc.phase {
        let alpha = enc.fade.progress().min(1.0);
        if alpha > 0.0 {
            full_screen(&mut out, screen, colors::with_alpha(colors::FADE, alpha));
        }
    }

    out
}

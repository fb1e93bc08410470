//! Per-frame run update
//!
//! Core game loop for the runner modes. Advances one [`Run`] by exactly one
//! display frame and drives its lifecycle state machine.

use super::collision::{CollisionEffect, resolve_runner_contacts};
use super::generator;
use super::physics;
use super::state::{Lifecycle, ObstacleKind, Run, RunMode};
use crate::consts::*;
use crate::events::RunObserver;

/// How far ahead (in frames of travel) the autopilot reacts to a hazard
pub const AUTOPILOT_LEAD_FRAMES: f32 = 13.0;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer/touch jump request
    pub jump: bool,
    /// Idle/demo mode - jump automatically ahead of hazards
    pub autopilot: bool,
}

/// Advance the run by one frame
pub fn tick(run: &mut Run, input: &TickInput, observer: &mut dyn RunObserver) {
    if run.is_disposed() {
        return;
    }

    match run.lifecycle {
        Lifecycle::Running => step_running(run, input, observer),
        Lifecycle::Teleporting => {
            // Gameplay is frozen; only the fade moves
            if run.fade.advance(FRAME_MS) {
                run.lifecycle = Lifecycle::Complete;
                let coins = run.completion_coins();
                log::info!(
                    "Level {} complete: score={} coins={}",
                    run.level,
                    run.state.score,
                    coins
                );
                observer.on_level_complete(run.state.score, coins);
            }
        }
        Lifecycle::Complete | Lifecycle::GameOver => {}
    }
}

fn step_running(run: &mut Run, input: &TickInput, observer: &mut dyn RunObserver) {
    // Jump source depends on the mode; voice runs ignore the pointer
    let requested = match run.mode {
        RunMode::Classic => input.jump,
        RunMode::Voice => run.voice.poll(),
    };
    let wants_jump = requested || (input.autopilot && autopilot_wants_jump(run));
    if wants_jump {
        physics::jump(&mut run.runner, run.config.jump_impulse);
    }

    physics::integrate(
        &mut run.runner,
        run.config.gravity,
        run.config.ground_y,
        TUMBLE_PER_FRAME,
    );
    debug_assert!(
        !run.runner.grounded
            || (run.runner.pos.y + run.runner.size.y - run.config.ground_y).abs() <= GROUND_TOLERANCE,
        "grounded runner off the ground line"
    );

    let speed = run.config.speed;
    run.state.distance += speed;
    run.state.score = run.config.score_for(run.state.distance);
    observer.on_score_update(run.state.score, run.state.coins);

    generator::spawn_portal_if_due(run);

    generator::scroll(&mut run.obstacles, &mut run.state.last_obstacle_x, speed);

    let effects = resolve_runner_contacts(
        &run.runner,
        &mut run.obstacles,
        run.config.collision_buffer,
    );
    for effect in effects {
        match effect {
            CollisionEffect::Collected(_) => {
                run.state.coins += run.tuning.pickup_value * run.multiplier;
            }
            CollisionEffect::Hit(id) => {
                run.lifecycle = Lifecycle::GameOver;
                log::info!(
                    "Run over at distance {:.0} (hazard {}): score={} coins={}",
                    run.state.distance,
                    id,
                    run.state.score,
                    run.state.coins
                );
                observer.on_game_over(run.state.score, run.state.coins);
                return;
            }
            CollisionEffect::Portal(_) => {
                run.lifecycle = Lifecycle::Teleporting;
                run.fade.start();
                log::debug!("Portal reached, teleporting");
            }
        }
    }

    generator::prune_passed(&mut run.obstacles);
    generator::top_up(run);

    run.frames += 1;
}

/// Jump when the nearest hazard ahead is about to be under the runner
fn autopilot_wants_jump(run: &Run) -> bool {
    if !run.runner.grounded {
        return false;
    }
    let lead = run.runner.right();
    let window = run.config.speed * AUTOPILOT_LEAD_FRAMES;

    run.obstacles
        .iter()
        .filter(|o| o.kind == ObstacleKind::Hazard && !o.collected)
        .map(|o| o.pos.x - lead)
        .filter(|gap| *gap >= 0.0)
        .reduce(f32::min)
        .is_some_and(|gap| gap <= window)
}

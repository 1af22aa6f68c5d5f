//! Fixed timestep simulation tick
//!
//! Order within a tick:
//! 1. player motion
//! 2. contact events (left, landed, staying)
//! 3. platform behaviors, then registry sync
//! 4. generation and cleanup
//! 5. pickups, enemies, falling out

use super::collision::{EntityRef, LayerMask, PhysicsQuery};
use super::screen::ScreenBounds;
use super::state::{DeathCause, GamePhase, GameState};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// -1 (left) to 1 (right)
    pub horizontal: f32,
    pub jump: bool,
    /// Fall through the one-way platform underfoot
    pub drop_through: bool,
    /// Pause toggle
    pub pause: bool,
    /// Start a new run (only honoured once the current one is over)
    pub restart: bool,
    /// Let the simulation steer
    pub autopilot: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }

    if state.phase == GamePhase::GameOver {
        if input.restart || input.autopilot {
            state.restart();
        }
        return;
    }
    if state.phase == GamePhase::Paused {
        return;
    }

    let mut input = input.clone();
    if input.autopilot {
        autopilot(state, &mut input);
    }

    state.time_ticks += 1;

    // 1. Player motion
    if input.drop_through {
        if let Some(ground) = state.player.ground {
            state.scene.drop_through(ground);
        }
    }
    if input.jump {
        state.player.try_jump();
    }
    let prev_feet = state.player.integrate(input.horizontal, dt);
    state.player.clamp_x(state.scene.viewport().half_width());

    // 2. Contact events
    let contact = if state.player.velocity.y <= LANDING_VELOCITY_THRESHOLD {
        state.scene.find_landing(prev_feet, state.player.feet())
    } else {
        None
    };
    if let Some((_, top)) = contact {
        state.player.land_on(top);
    }
    let previous = state.player.ground;
    let current = contact.map(|(id, _)| id);
    state.player.ground = current;
    match (previous, current) {
        (Some(a), Some(b)) if a == b => {
            state.scene.notify_staying(b, &mut state.player, &mut state.rng);
        }
        (previous, current) => {
            if let Some(a) = previous {
                state.scene.notify_left(a, &mut state.player, &mut state.rng);
            }
            if let Some(b) = current {
                state.landings += 1;
                state.scene.notify_landed(b, &mut state.player, &mut state.rng);
            }
        }
    }
    // A bounce may have launched the player off the platform
    if state.player.velocity.y > LANDING_VELOCITY_THRESHOLD {
        if let Some(id) = state.player.ground.take() {
            state.scene.notify_left(id, &mut state.player, &mut state.rng);
        }
    }

    // 3. Platform behaviors
    state.scene.update(dt, &mut state.rng);
    if let Some(id) = state.player.ground {
        if !state.scene.platform(id).is_some_and(|p| p.is_solid()) {
            // Broke or vanished underfoot
            state.player.ground = None;
            state.scene.notify_left(id, &mut state.player, &mut state.rng);
        }
    }

    // 4. Generation and cleanup
    let player_y = state.player.position.y;
    state.best_height = state.best_height.max(player_y);
    state.scene.viewport_mut().follow(player_y);
    state
        .generator
        .update_generation(player_y, &mut state.scene, &mut state.rng);

    // 5. Pickups and hazards
    let position = state.player.position;
    let radius = state.player.radius;
    state.coins += state.scene.collect_coins(position, radius);
    if let Some(EntityRef::Enemy(_)) = state.scene.overlap_at(position, radius, LayerMask::ENEMIES) {
        state.end_run(DeathCause::Enemy);
        return;
    }
    if position.y < state.scene.viewport().bottom() - SCREEN_DEATH_MARGIN {
        state.end_run(DeathCause::Fell);
    }
}

/// Steer toward the nearest platform above that looks reachable
fn autopilot(state: &GameState, input: &mut TickInput) {
    let player = &state.player;
    let constraints = state.generator.planner().constraints();
    let target = state
        .scene
        .registry()
        .iter()
        .filter(|(id, fp)| {
            Some(*id) != player.ground
                && fp.y > player.position.y
                && fp.y - player.position.y <= constraints.max_vertical_jump
                && state.scene.platform(*id).is_some_and(|p| p.is_solid())
        })
        .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y))
        .map(|(_, fp)| *fp);

    let Some(target) = target else {
        input.horizontal = 0.0;
        return;
    };
    let dx = target.x - player.position.x;
    input.horizontal = (dx / target.half_width.max(0.1)).clamp(-1.0, 1.0);
    // Jump once roughly lined up; air control covers the rest
    input.jump = player.is_grounded() && dx.abs() <= constraints.max_horizontal_jump + target.half_width;
}

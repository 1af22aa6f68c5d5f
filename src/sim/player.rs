//! The climber

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pool::PoolHandle;
use crate::consts::{GRAVITY, PLAYER_JUMP_FORCE, PLAYER_MOVE_SPEED, PLAYER_RADIUS};

/// What platform behaviors are allowed to do to the player
pub trait PlayerHandle {
    fn position(&self) -> Vec2;
    fn base_jump_force(&self) -> f32;
    /// Replace vertical velocity with `force` (upward)
    fn jump(&mut self, force: f32);
    fn set_multipliers(&mut self, speed: f32, jump: f32);
    fn reset_multipliers(&mut self) {
        self.set_multipliers(1.0, 1.0);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub move_speed: f32,
    pub jump_force: f32,
    pub speed_multiplier: f32,
    pub jump_multiplier: f32,
    /// Platform currently under the player's feet
    #[serde(skip)]
    pub ground: Option<PoolHandle>,
}

impl Player {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            radius: PLAYER_RADIUS,
            move_speed: PLAYER_MOVE_SPEED,
            jump_force: PLAYER_JUMP_FORCE,
            speed_multiplier: 1.0,
            jump_multiplier: 1.0,
            ground: None,
        }
    }

    #[inline]
    pub fn feet(&self) -> Vec2 {
        self.position - Vec2::new(0.0, self.radius)
    }

    pub fn is_grounded(&self) -> bool {
        self.ground.is_some()
    }

    /// Steer, apply gravity and move; returns the feet position before the move
    pub fn integrate(&mut self, horizontal: f32, dt: f32) -> Vec2 {
        let prev_feet = self.feet();
        self.velocity.x = horizontal.clamp(-1.0, 1.0) * self.move_speed * self.speed_multiplier;
        self.velocity.y -= GRAVITY * dt;
        self.position += self.velocity * dt;
        prev_feet
    }

    /// Player-initiated jump; only from the ground
    pub fn try_jump(&mut self) -> bool {
        if !self.is_grounded() {
            return false;
        }
        self.velocity.y = self.jump_force * self.jump_multiplier;
        true
    }

    /// Stand on a surface at `top`
    pub fn land_on(&mut self, top: f32) {
        self.position.y = top + self.radius;
        self.velocity.y = self.velocity.y.max(0.0);
    }

    /// Keep the player inside `[-half_width, half_width]`
    pub fn clamp_x(&mut self, half_width: f32) {
        let limit = (half_width - self.radius).max(0.0);
        self.position.x = self.position.x.clamp(-limit, limit);
    }
}

impl PlayerHandle for Player {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn base_jump_force(&self) -> f32 {
        self.jump_force
    }

    fn jump(&mut self, force: f32) {
        self.velocity.y = force;
    }

    fn set_multipliers(&mut self, speed: f32, jump: f32) {
        self.speed_multiplier = speed;
        self.jump_multiplier = jump;
    }
}

//! Platforms that drift side to side within the play area

use serde::{Deserialize, Serialize};

use crate::consts::MIN_MOVEMENT_RANGE;
use crate::sim::platform::PlatformBody;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingConfig {
    /// Units per second
    pub speed: f32,
    /// Full width of the patrol, centred on the placement point
    pub range: f32,
    pub start_right: bool,
}

impl Default for MovingConfig {
    fn default() -> Self {
        Self {
            speed: 2.0,
            range: 3.0,
            start_right: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovingPhase {
    Stationary,
    Moving,
}

/// Patrols horizontally between two bounds that stay on screen
#[derive(Debug, Clone)]
pub struct Moving {
    config: MovingConfig,
    phase: MovingPhase,
    left: f32,
    right: f32,
    direction: f32,
    origin_x: f32,
}

impl Moving {
    pub fn new(config: MovingConfig) -> Self {
        let direction = if config.start_right { 1.0 } else { -1.0 };
        Self {
            config,
            phase: MovingPhase::Stationary,
            left: 0.0,
            right: 0.0,
            direction,
            origin_x: 0.0,
        }
    }

    pub fn phase(&self) -> MovingPhase {
        self.phase
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.left, self.right)
    }

    fn start_direction(&self) -> f32 {
        if self.config.start_right { 1.0 } else { -1.0 }
    }

    pub(super) fn initialize(&mut self, body: &PlatformBody) {
        self.origin_x = body.position.x;
        self.phase = MovingPhase::Stationary;
        self.direction = self.start_direction();
    }

    /// Compute patrol bounds now that the platform has its final position
    pub(super) fn on_ready(&mut self, body: &mut PlatformBody, play_half_width: Option<f32>) {
        self.origin_x = body.position.x;
        let Some(play_half_width) = play_half_width else {
            log::debug!("moving platform has no screen bounds; staying put");
            return;
        };
        let screen_left = -play_half_width + body.half_width;
        let screen_right = play_half_width - body.half_width;
        if screen_right - screen_left < MIN_MOVEMENT_RANGE {
            log::debug!("screen too narrow for a moving platform; staying put");
            return;
        }

        let x = body.position.x;
        let half_range = self.config.range * 0.5;
        let mut left = (x - half_range).max(screen_left);
        let mut right = (x + half_range).min(screen_right);

        if right - left < MIN_MOVEMENT_RANGE {
            let centre = (left + right) * 0.5;
            left = centre - MIN_MOVEMENT_RANGE * 0.5;
            right = centre + MIN_MOVEMENT_RANGE * 0.5;
            if left < screen_left {
                right += screen_left - left;
                left = screen_left;
            } else if right > screen_right {
                left -= right - screen_right;
                right = screen_right;
            }
        }

        self.left = left;
        self.right = right;
        self.direction = self.start_direction();
        self.phase = MovingPhase::Moving;
    }

    pub(super) fn on_update(&mut self, body: &mut PlatformBody, dt: f32) {
        if self.phase != MovingPhase::Moving {
            return;
        }
        let mut x = body.position.x + self.direction * self.config.speed * dt;
        if x >= self.right {
            x = self.right;
            self.direction = -1.0;
        } else if x <= self.left {
            x = self.left;
            self.direction = 1.0;
        }
        body.position.x = x;
    }

    pub(super) fn on_reset(&mut self, body: &mut PlatformBody) {
        if self.phase == MovingPhase::Moving {
            body.position.x = self.origin_x;
        }
        self.phase = MovingPhase::Stationary;
        self.direction = self.start_direction();
    }
}

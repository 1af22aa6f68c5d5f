//! Bouncy platforms: launch the player and pulse the platform scale

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::roll;
use crate::sim::platform::PlatformBody;
use crate::sim::player::PlayerHandle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BounceConfig {
    /// Probability that a landing launches the player
    pub chance: f32,
    pub jump_force_multiplier: f32,
    pub bounce_scale: f32,
    /// Seconds the squash stays visible
    pub bounce_duration: f32,
}

impl Default for BounceConfig {
    fn default() -> Self {
        Self {
            chance: 1.0,
            jump_force_multiplier: 1.5,
            bounce_scale: 1.1,
            bounce_duration: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BouncePhase {
    Idle,
    Bouncing,
}

/// Launches the player on landing and briefly enlarges the platform
#[derive(Debug, Clone)]
pub struct Bounce {
    config: BounceConfig,
    phase: BouncePhase,
    timer: f32,
    normal_scale: Vec2,
}

impl Bounce {
    pub fn new(config: BounceConfig) -> Self {
        Self {
            config,
            phase: BouncePhase::Idle,
            timer: 0.0,
            normal_scale: Vec2::ONE,
        }
    }

    pub fn phase(&self) -> BouncePhase {
        self.phase
    }

    pub(super) fn initialize(&mut self, body: &PlatformBody) {
        self.normal_scale = body.visual.scale;
        self.phase = BouncePhase::Idle;
        self.timer = 0.0;
    }

    pub(super) fn on_landed(
        &mut self,
        body: &mut PlatformBody,
        player: &mut dyn PlayerHandle,
        rng: &mut Pcg32,
    ) {
        // Only a player on top gets launched, not one clipping the side
        if player.position().y < body.top() {
            return;
        }
        if !roll(rng, self.config.chance) {
            return;
        }
        player.jump(player.base_jump_force() * self.config.jump_force_multiplier);
        body.visual.scale = self.normal_scale * self.config.bounce_scale;
        self.phase = BouncePhase::Bouncing;
        self.timer = self.config.bounce_duration;
    }

    pub(super) fn on_update(&mut self, body: &mut PlatformBody, dt: f32) {
        if self.phase != BouncePhase::Bouncing {
            return;
        }
        self.timer -= dt;
        if self.timer <= 0.0 {
            body.visual.scale = self.normal_scale;
            self.phase = BouncePhase::Idle;
            self.timer = 0.0;
        }
    }

    pub(super) fn on_reset(&mut self, body: &mut PlatformBody) {
        if self.phase == BouncePhase::Bouncing {
            body.visual.scale = self.normal_scale;
        }
        self.phase = BouncePhase::Idle;
        self.timer = 0.0;
    }
}

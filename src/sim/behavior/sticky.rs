//! Sticky platforms: slow the player while they stand on them

use serde::{Deserialize, Serialize};

use crate::sim::player::PlayerHandle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickyConfig {
    pub speed_multiplier: f32,
    pub jump_multiplier: f32,
}

impl Default for StickyConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 0.7,
            jump_multiplier: 0.7,
        }
    }
}

/// Slows the player's run and jump while they stand on it
#[derive(Debug, Clone)]
pub struct Sticky {
    config: StickyConfig,
    player_present: bool,
}

impl Sticky {
    pub fn new(config: StickyConfig) -> Self {
        Self {
            config,
            player_present: false,
        }
    }

    pub fn player_present(&self) -> bool {
        self.player_present
    }

    pub(super) fn initialize(&mut self) {
        self.player_present = false;
    }

    /// Landing and staying both (re)apply the multipliers
    pub(super) fn on_player_contact(&mut self, player: &mut dyn PlayerHandle) {
        player.set_multipliers(self.config.speed_multiplier, self.config.jump_multiplier);
        self.player_present = true;
    }

    pub(super) fn on_left(&mut self, player: &mut dyn PlayerHandle) {
        player.reset_multipliers();
        self.player_present = false;
    }

    pub(super) fn on_reset(&mut self) {
        self.player_present = false;
    }
}

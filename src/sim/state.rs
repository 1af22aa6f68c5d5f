//! Game state and run bookkeeping

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::generator::{GenerationStats, LevelGenerator};
use super::player::Player;
use super::scene::Scene;
use crate::settings::Settings;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    Paused,
    /// Run ended
    GameOver,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    /// Dropped below the bottom of the screen
    Fell,
    /// Touched an enemy
    Enemy,
}

/// Per-run results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub seed: u64,
    pub ticks: u64,
    pub best_height: f32,
    pub coins: u32,
    pub landings: u32,
    pub death: Option<DeathCause>,
    pub generation: GenerationStats,
}

/// Complete simulation state
///
/// One RNG drives everything, so a seed plus an input sequence always
/// replays the same run.
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub player: Player,
    pub scene: Scene,
    pub generator: LevelGenerator,
    pub best_height: f32,
    pub coins: u32,
    pub landings: u32,
    pub death: Option<DeathCause>,
    start: Vec2,
}

impl GameState {
    /// Create a new run with the given seed
    pub fn new(seed: u64, settings: &Settings) -> Self {
        let scene = Scene::new(
            settings.viewport,
            settings.placement.margin,
            &settings.pools,
            settings.presets.clone(),
        );
        let generator = LevelGenerator::new(settings.generator.clone(), settings.placement.clone());
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            time_ticks: 0,
            player: Player::new(Vec2::ZERO),
            scene,
            generator,
            best_height: 0.0,
            coins: 0,
            landings: 0,
            death: None,
            start: Vec2::ZERO,
        };
        state.begin_run();
        state
    }

    /// Start over from the starting point with a fresh RNG
    pub fn restart(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.begin_run();
    }

    fn begin_run(&mut self) {
        self.scene.release_player(&mut self.player, &mut self.rng);
        self.player = Player::new(self.start);
        self.scene.viewport_mut().center_y = self.start.y;
        let seed = self
            .generator
            .reset_generation(self.start, &mut self.scene, &mut self.rng);

        // Stand on the first platform
        if let Some(top) = seed.and_then(|id| self.scene.platform(id)).map(|p| p.body().top()) {
            self.player.position.y = top + self.player.radius;
        }
        self.phase = GamePhase::Playing;
        self.time_ticks = 0;
        self.best_height = self.player.position.y;
        self.coins = 0;
        self.landings = 0;
        self.death = None;
    }

    pub fn end_run(&mut self, cause: DeathCause) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        log::info!(
            "run over ({cause:?}) at y={:.1}, best {:.1}, {} coins",
            self.player.position.y,
            self.best_height,
            self.coins
        );
        self.death = Some(cause);
        self.phase = GamePhase::GameOver;
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            seed: self.seed,
            ticks: self.time_ticks,
            best_height: self.best_height,
            coins: self.coins,
            landings: self.landings,
            death: self.death,
            generation: *self.generator.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_stands_on_seed() {
        let state = GameState::new(3, &Settings::default());
        let lowest = state.scene.registry().lowest_y().unwrap();
        assert!(state.player.position.y > lowest);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.scene.platforms().active_count(), 8);
    }

    #[test]
    fn test_restart_replays_layout() {
        let mut state = GameState::new(21, &Settings::default());
        let layout: Vec<_> = state.scene.registry().iter().map(|(_, fp)| *fp).collect();
        state.end_run(DeathCause::Fell);
        state.restart();
        let again: Vec<_> = state.scene.registry().iter().map(|(_, fp)| *fp).collect();
        let sort = |mut v: Vec<crate::sim::registry::Footprint>| {
            v.sort_by(|a, b| a.y.total_cmp(&b.y));
            v
        };
        assert_eq!(sort(layout), sort(again));
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.death.is_none());
    }
}

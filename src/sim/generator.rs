//! Endless level generation
//!
//! Keeps a band of platforms ahead of the player: levels are appended above
//! the highest one as the player climbs, and everything far enough below is
//! returned to the pool.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::behavior::roll;
use super::planner::{PlacementConstraints, PlacementPlanner, PlacementSlot, SlotOrigin};
use super::pool::PoolHandle;
use super::scene::Scene;
use super::screen::ScreenBounds;
use crate::error::SimError;

/// Generation tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub min_vertical_distance: f32,
    pub max_vertical_distance: f32,
    /// How many platforms to keep above the player
    pub platforms_ahead: usize,
    /// Platforms this far below the player are recycled
    pub cleanup_distance: f32,
    pub multi_platform_chance: f32,
    pub max_platforms_per_level: usize,
    /// Height of the first platform relative to the player
    pub first_platform_offset: f32,
    /// Preset for the first platform; unknown or `None` picks by weight
    pub seed_preset: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_vertical_distance: 3.0,
            max_vertical_distance: 5.0,
            platforms_ahead: 8,
            cleanup_distance: 20.0,
            multi_platform_chance: 0.8,
            max_platforms_per_level: 3,
            first_platform_offset: 0.5,
            seed_preset: Some("normal".to_string()),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.min_vertical_distance > 0.0)
            || !self.max_vertical_distance.is_finite()
            || self.max_vertical_distance < self.min_vertical_distance
        {
            return Err(SimError::InvariantViolation(format!(
                "vertical distance range [{}, {}] is invalid",
                self.min_vertical_distance, self.max_vertical_distance
            )));
        }
        if self.platforms_ahead == 0 {
            return Err(SimError::InvariantViolation("platforms_ahead must be at least 1".into()));
        }
        if !(self.cleanup_distance > 0.0) {
            return Err(SimError::InvariantViolation(format!(
                "cleanup distance {} must be positive",
                self.cleanup_distance
            )));
        }
        Ok(())
    }

    pub fn average_vertical_distance(&self) -> f32 {
        (self.min_vertical_distance + self.max_vertical_distance) * 0.5
    }
}

/// Heights the generator has covered so far
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationWindow {
    /// Never decreases within a run; jumps to just below the player when
    /// the player outruns the band
    pub highest_generated_y: f32,
    /// Lowest platform still active after the last cleanup
    pub lowest_generated_y: f32,
    pub last_cleanup_y: f32,
}

impl GenerationWindow {
    fn at(y: f32) -> Self {
        Self {
            highest_generated_y: y,
            lowest_generated_y: y,
            last_cleanup_y: y,
        }
    }
}

/// Running counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub levels: u32,
    pub platforms: u32,
    /// Levels where no slot could be found
    pub skipped_levels: u32,
    /// Platforms placed without a reachable reference below
    pub fallbacks: u32,
    pub recycled: u32,
}

#[derive(Debug, Clone)]
pub struct LevelGenerator {
    config: GeneratorConfig,
    planner: PlacementPlanner,
    window: GenerationWindow,
    stats: GenerationStats,
}

impl LevelGenerator {
    pub fn new(config: GeneratorConfig, constraints: PlacementConstraints) -> Self {
        debug_assert!(config.validate().is_ok(), "{:?}", config.validate());
        Self {
            config,
            planner: PlacementPlanner::new(constraints),
            window: GenerationWindow::at(0.0),
            stats: GenerationStats::default(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn window(&self) -> &GenerationWindow {
        &self.window
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    pub fn planner(&self) -> &PlacementPlanner {
        &self.planner
    }

    /// Clear the scene and seed a fresh run around `player`
    ///
    /// Returns the platform placed under the player, if any. Platforms are
    /// recycled without left events; a host keeping its player across runs
    /// calls [`Scene::release_player`] first.
    pub fn initialize(&mut self, player: Vec2, scene: &mut Scene, rng: &mut Pcg32) -> Option<PoolHandle> {
        let recycled = scene.clear(rng);
        if recycled > 0 {
            log::debug!("recycled {recycled} platforms for a new run");
        }
        self.planner.set_screen_half_width(scene.viewport().half_width());
        self.window = GenerationWindow::at(player.y);
        self.stats = GenerationStats::default();

        let seed = self.spawn_seed(player, scene, rng);

        // Each round either adds a level or rerolls its height
        let rounds = self.config.platforms_ahead * 4;
        let mut placed = scene.platforms().active_count();
        for _ in 0..rounds {
            if placed >= self.config.platforms_ahead {
                break;
            }
            placed += self.generate_level(self.config.platforms_ahead - placed, scene, rng);
        }
        if placed < self.config.platforms_ahead {
            log::warn!(
                "seeded {placed} of {} platforms ahead",
                self.config.platforms_ahead
            );
        }
        log::info!(
            "seeded {placed} platforms from y={:.1} to y={:.1}",
            player.y,
            self.window.highest_generated_y
        );
        seed
    }

    /// Same as [`initialize`](Self::initialize), for restarting a run
    pub fn reset_generation(&mut self, player: Vec2, scene: &mut Scene, rng: &mut Pcg32) -> Option<PoolHandle> {
        self.initialize(player, scene, rng)
    }

    /// Extend ahead of the player and recycle what fell behind
    pub fn update_generation(&mut self, player_y: f32, scene: &mut Scene, rng: &mut Pcg32) {
        self.planner.set_screen_half_width(scene.viewport().half_width());

        // Recycle first so catching up reuses what fell behind
        let cleaned = self.cleanup(player_y, scene, rng);

        // Levels the player already skipped are never built; the band
        // restarts one jump below the player
        let restart = player_y - self.planner.constraints().max_vertical_jump;
        if restart > self.window.highest_generated_y {
            log::debug!(
                "player outran generation at y={:.1}; restarting band at y={restart:.1}",
                self.window.highest_generated_y
            );
            self.window.highest_generated_y = restart;
        }

        let lead = self.config.platforms_ahead as f32 * self.config.average_vertical_distance();
        let behind = player_y - self.window.highest_generated_y;
        let budget = if behind > 0.0 {
            self.config.platforms_ahead + (behind / self.config.min_vertical_distance).ceil() as usize
        } else {
            1
        };
        for _ in 0..budget {
            if self.window.highest_generated_y - player_y >= lead {
                break;
            }
            self.generate_level(self.config.max_platforms_per_level.max(1), scene, rng);
        }

        if cleaned {
            self.window.lowest_generated_y = scene
                .registry()
                .lowest_y()
                .unwrap_or(self.window.highest_generated_y);
        }
    }

    /// Release platforms more than `cleanup_distance` below the player
    fn cleanup(&mut self, player_y: f32, scene: &mut Scene, rng: &mut Pcg32) -> bool {
        if player_y - self.window.last_cleanup_y <= self.config.cleanup_distance {
            return false;
        }
        let threshold = player_y - self.config.cleanup_distance;
        let recycled = scene.cleanup_below(threshold, rng);
        self.stats.recycled += recycled as u32;
        self.window.last_cleanup_y = player_y;
        if recycled > 0 {
            log::debug!("recycled {recycled} platforms below y={threshold:.1}");
        }
        true
    }

    fn spawn_seed(&mut self, player: Vec2, scene: &mut Scene, rng: &mut Pcg32) -> Option<PoolHandle> {
        let c = self.planner.constraints();
        let half_width = (c.min_width + c.max_width) * 0.25;
        let limit = (c.max_half_width() - half_width).max(0.0);
        let slot = PlacementSlot {
            x: player.x.clamp(-limit, limit),
            y: player.y + self.config.first_platform_offset,
            half_width: half_width.min(c.max_half_width()),
            origin: SlotOrigin::Seed,
        };
        let preset = self
            .config
            .seed_preset
            .as_deref()
            .and_then(|name| scene.preset_index(name));
        match scene.spawn_platform(&slot, preset, rng) {
            Ok(id) => {
                scene.ready(id, rng);
                self.record_level(slot.y, &[slot], 1);
                Some(id)
            }
            Err(e) => {
                log::warn!("could not place the seed platform: {e}");
                None
            }
        }
    }

    /// Place one level above the highest; returns platforms spawned
    fn generate_level(&mut self, max_count: usize, scene: &mut Scene, rng: &mut Pcg32) -> usize {
        let c = &self.config;
        let step = rng
            .random_range(c.min_vertical_distance..=c.max_vertical_distance)
            .min(self.planner.constraints().max_vertical_jump);
        let target_y = self.window.highest_generated_y + step;

        let mut count = 1;
        if c.max_platforms_per_level >= 2 && roll(rng, c.multi_platform_chance) {
            count = rng.random_range(2..=c.max_platforms_per_level);
        }
        let count = count.min(max_count.max(1));

        let slots = if count > 1 {
            self.planner
                .find_multi_slot_level(target_y, count, scene.registry(), rng)
        } else {
            self.planner
                .find_slot_at_height(target_y, scene.registry(), rng)
                .into_iter()
                .collect()
        };
        if slots.is_empty() {
            self.stats.skipped_levels += 1;
            let err = SimError::PlacementExhausted {
                target_y,
                attempts: self.planner.constraints().max_attempts,
            };
            log::debug!("{err}; retrying next pass");
            return 0;
        }

        let spawned = scene.spawn_level(&slots, rng);
        if !spawned.is_empty() {
            self.record_level(target_y, &slots, spawned.len());
        }
        spawned.len()
    }

    fn record_level(&mut self, y: f32, slots: &[PlacementSlot], spawned: usize) {
        self.window.highest_generated_y = self.window.highest_generated_y.max(y);
        self.stats.levels += 1;
        self.stats.platforms += spawned as u32;
        self.stats.fallbacks += slots
            .iter()
            .take(spawned)
            .filter(|s| s.origin == SlotOrigin::Unconstrained)
            .count() as u32;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::sim::preset::default_catalog;
    use crate::sim::scene::PoolSizes;
    use crate::sim::screen::Viewport;

    fn rig(config: GeneratorConfig) -> (LevelGenerator, Scene, Pcg32) {
        let constraints = PlacementConstraints::default();
        let scene = Scene::new(
            Viewport::default(),
            constraints.margin,
            &PoolSizes::default(),
            default_catalog(),
        );
        (LevelGenerator::new(config, constraints), scene, Pcg32::seed_from_u64(99))
    }

    #[test]
    fn test_multi_level_seeding_caps_at_platforms_ahead() {
        let (mut generator, mut scene, mut rng) = rig(GeneratorConfig {
            multi_platform_chance: 1.0,
            ..Default::default()
        });
        let seed = generator.initialize(Vec2::ZERO, &mut scene, &mut rng);
        assert!(seed.is_some());
        assert_eq!(scene.platforms().active_count(), 8);
        assert_eq!(generator.stats().platforms, 8);
    }

    #[test]
    fn test_update_keeps_lead_and_never_lowers_highest() {
        let (mut generator, mut scene, mut rng) = rig(GeneratorConfig::default());
        generator.initialize(Vec2::ZERO, &mut scene, &mut rng);
        let mut last_highest = generator.window().highest_generated_y;
        let mut y = 0.0;
        while y < 200.0 {
            generator.update_generation(y, &mut scene, &mut rng);
            let highest = generator.window().highest_generated_y;
            assert!(highest >= last_highest);
            assert!(highest >= y);
            last_highest = highest;
            y += 0.5;
        }
        assert!(generator.stats().recycled > 0);
        let lowest = scene.registry().lowest_y().unwrap();
        assert!(lowest >= 200.0 - 0.5 - 20.0 - 20.0, "lowest platform {lowest}");
    }

    #[test]
    fn test_large_jump_does_not_grow_the_pool() {
        let (mut generator, mut scene, mut rng) = rig(GeneratorConfig::default());
        generator.initialize(Vec2::ZERO, &mut scene, &mut rng);
        let seeded = scene.platforms().active_count() as u32;
        let pool_before = scene.platforms().len();

        generator.update_generation(6000.0, &mut scene, &mut rng);

        assert_eq!(generator.stats().recycled, seeded, "only the old band is recycled");
        assert!(scene.platforms().len() <= pool_before.max(40), "pool grew to {}", scene.platforms().len());
        assert!(generator.window().highest_generated_y >= 6000.0);
        assert!(scene.registry().iter().all(|(_, fp)| fp.y >= 6000.0 - 20.0));
        assert!(generator.stats().levels < 30);
    }

    #[test]
    fn test_reset_generation_recycles_everything() {
        let (mut generator, mut scene, mut rng) = rig(GeneratorConfig::default());
        generator.initialize(Vec2::ZERO, &mut scene, &mut rng);
        for i in 0..100 {
            generator.update_generation(i as f32, &mut scene, &mut rng);
        }
        let seed = generator.reset_generation(Vec2::new(0.0, 50.0), &mut scene, &mut rng);
        let seed_y = scene.platform(seed.unwrap()).unwrap().position().y;
        assert_eq!(seed_y, 50.5);
        assert!(scene.registry().lowest_y().unwrap() >= 50.5);
        assert_eq!(generator.window().highest_generated_y, scene.registry().highest_y().unwrap());
    }
}

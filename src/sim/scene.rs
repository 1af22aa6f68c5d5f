//! The live world: pooled platforms, their registry, and their children
//!
//! Every platform event goes through here so behaviors always see the same
//! collaborators: the shared RNG, the registry, the child pools and the
//! current screen extents.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::behavior::BehaviorCtx;
use super::children::ChildPools;
use super::collision::{EntityRef, LayerMask, PhysicsQuery, circle_touches_box, crossed_top};
use super::planner::PlacementSlot;
use super::platform::PlatformEntity;
use super::player::PlayerHandle;
use super::pool::{EntityPool, PoolHandle, Poolable};
use super::preset::{PlatformPreset, pick_weighted};
use super::registry::PlatformRegistry;
use super::screen::{ScreenBounds, Viewport};
use crate::consts::{COIN_RADIUS, ENEMY_RADIUS};
use crate::error::SimError;

/// Pre-warm sizes for each pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSizes {
    pub platforms: usize,
    /// Hard cap on platforms; `None` lets the pool grow
    pub platform_capacity: Option<usize>,
    pub coins: usize,
    pub enemies: usize,
}

impl Default for PoolSizes {
    fn default() -> Self {
        Self {
            platforms: 30,
            platform_capacity: None,
            coins: 20,
            enemies: 10,
        }
    }
}

#[derive(Debug)]
pub struct Scene {
    viewport: Viewport,
    /// Gap between platform edges and the screen edge
    margin: f32,
    platforms: EntityPool<PlatformEntity>,
    registry: PlatformRegistry,
    children: ChildPools,
    presets: Vec<PlatformPreset>,
}

impl Scene {
    pub fn new(viewport: Viewport, margin: f32, sizes: &PoolSizes, presets: Vec<PlatformPreset>) -> Self {
        if presets.iter().all(|p| p.spawn_weight <= 0.0) {
            log::warn!("no preset has a positive spawn weight; platforms will be plain");
        }
        Self {
            viewport,
            margin,
            platforms: EntityPool::new(
                "platforms",
                sizes.platforms,
                sizes.platform_capacity,
                PlatformEntity::default,
            ),
            registry: PlatformRegistry::new(),
            children: ChildPools::new(sizes.coins, sizes.enemies),
            presets,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Largest |x| a platform edge may reach
    pub fn play_half_width(&self) -> f32 {
        (self.viewport.half_width() - self.margin).max(0.0)
    }

    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    pub fn platforms(&self) -> &EntityPool<PlatformEntity> {
        &self.platforms
    }

    pub fn platform(&self, id: PoolHandle) -> Option<&PlatformEntity> {
        self.platforms.get(id)
    }

    pub fn children(&self) -> &ChildPools {
        &self.children
    }

    pub fn presets(&self) -> &[PlatformPreset] {
        &self.presets
    }

    pub fn preset_index(&self, name: &str) -> Option<usize> {
        self.presets.iter().position(|p| p.name == name)
    }

    /// Spawn a whole level, then make each platform ready once all of them
    /// are registered (so neighbour checks see the full level)
    pub fn spawn_level(&mut self, slots: &[PlacementSlot], rng: &mut Pcg32) -> Vec<PoolHandle> {
        let mut spawned = Vec::with_capacity(slots.len());
        for slot in slots {
            match self.spawn_platform(slot, None, rng) {
                Ok(id) => spawned.push(id),
                Err(e) => log::warn!("platform at y={:.2} skipped: {e}", slot.y),
            }
        }
        for &id in &spawned {
            self.ready(id, rng);
        }
        spawned
    }

    /// Take a platform from the pool, place it, dress it with a preset
    /// (`None` picks one by weight) and register it. Not yet ready.
    pub fn spawn_platform(
        &mut self,
        slot: &PlacementSlot,
        preset: Option<usize>,
        rng: &mut Pcg32,
    ) -> Result<PoolHandle, SimError> {
        let preset = preset.or_else(|| pick_weighted(&self.presets, rng));
        let play_half_width = self.play_half_width();
        let id = self.platforms.acquire()?;
        let Some(platform) = self.platforms.get_mut(id) else {
            return Err(SimError::InvariantViolation(format!(
                "fresh handle {id:?} not alive"
            )));
        };
        if let Err(e) = platform.place(slot) {
            self.platforms.release(id);
            return Err(e);
        }
        if let Some(preset) = preset.and_then(|i| self.presets.get(i)) {
            let mut ctx = BehaviorCtx {
                id,
                rng,
                registry: Some(&self.registry),
                children: Some(&mut self.children),
                play_half_width: Some(play_half_width),
                dt: 0.0,
            };
            platform.apply_preset(preset, &mut ctx);
        }
        let footprint = platform.footprint();
        self.registry.insert(id, footprint);
        Ok(id)
    }

    /// Run `f` on a live platform with a fully wired context
    fn with_platform<T>(
        &mut self,
        id: PoolHandle,
        rng: &mut Pcg32,
        dt: f32,
        f: impl FnOnce(&mut PlatformEntity, &mut BehaviorCtx) -> T,
    ) -> Option<T> {
        let play_half_width = self.play_half_width();
        let platform = self.platforms.get_mut(id)?;
        let mut ctx = BehaviorCtx {
            id,
            rng,
            registry: Some(&self.registry),
            children: Some(&mut self.children),
            play_half_width: Some(play_half_width),
            dt,
        };
        Some(f(platform, &mut ctx))
    }

    pub fn ready(&mut self, id: PoolHandle, rng: &mut Pcg32) {
        self.with_platform(id, rng, 0.0, |p, ctx| p.ready(ctx));
        self.sync(id);
    }

    pub fn notify_landed(&mut self, id: PoolHandle, player: &mut dyn PlayerHandle, rng: &mut Pcg32) {
        self.with_platform(id, rng, 0.0, |p, ctx| p.notify_landed(player, ctx));
    }

    pub fn notify_staying(&mut self, id: PoolHandle, player: &mut dyn PlayerHandle, rng: &mut Pcg32) {
        self.with_platform(id, rng, 0.0, |p, ctx| p.notify_staying(player, ctx));
    }

    pub fn notify_left(&mut self, id: PoolHandle, player: &mut dyn PlayerHandle, rng: &mut Pcg32) {
        self.with_platform(id, rng, 0.0, |p, ctx| p.notify_left(player, ctx));
    }

    pub fn drop_through(&mut self, id: PoolHandle) -> bool {
        self.platforms
            .get_mut(id)
            .is_some_and(|p| p.drop_through())
    }

    /// Tick every active platform, then refresh the registry from their bodies
    pub fn update(&mut self, dt: f32, rng: &mut Pcg32) {
        let ids: Vec<PoolHandle> = self.platforms.active_handles().collect();
        for &id in &ids {
            self.with_platform(id, rng, dt, |p, ctx| p.tick(ctx));
        }
        for id in ids {
            self.sync(id);
        }
    }

    fn sync(&mut self, id: PoolHandle) {
        if let Some(platform) = self.platforms.get(id) {
            self.registry.update(id, platform.footprint());
        }
    }

    /// Reset and return a platform. `false` if the handle is stale or the
    /// platform refused (player still on it).
    pub fn release_platform(&mut self, id: PoolHandle, rng: &mut Pcg32) -> bool {
        let releasable = match self.platforms.get(id) {
            Some(platform) => platform.can_release(),
            None => {
                self.registry.remove(id);
                return false;
            }
        };
        if !releasable {
            return false;
        }
        self.with_platform(id, rng, 0.0, |p, ctx| p.reset_to_pool_defaults(ctx));
        let released = self.platforms.release(id);
        if released {
            self.registry.remove(id);
        }
        released
    }

    /// Release every platform strictly below `y`; returns how many went back
    pub fn cleanup_below(&mut self, y: f32, rng: &mut Pcg32) -> usize {
        self.registry
            .below(y)
            .into_iter()
            .filter(|&id| self.release_platform(id, rng))
            .count()
    }

    /// Send a left event from every platform the player stands on, so
    /// effects like sticky multipliers come off; returns how many there were
    pub fn release_player(&mut self, player: &mut dyn PlayerHandle, rng: &mut Pcg32) -> usize {
        let standing: Vec<PoolHandle> = self
            .platforms
            .iter_active()
            .filter(|(_, p)| p.player_on())
            .map(|(id, _)| id)
            .collect();
        for &id in &standing {
            self.notify_left(id, player, rng);
        }
        standing.len()
    }

    /// Return everything to the pools, ignoring the player
    ///
    /// Contact is dropped without a left event; call
    /// [`release_player`](Self::release_player) first to undo player effects.
    pub fn clear(&mut self, rng: &mut Pcg32) -> usize {
        let ids: Vec<PoolHandle> = self.platforms.active_handles().collect();
        let mut released = 0;
        for id in ids {
            if let Some(platform) = self.platforms.get_mut(id) {
                platform.clear_contact();
            }
            if self.release_platform(id, rng) {
                released += 1;
            }
        }
        let strays = self.children.release_all();
        if strays > 0 {
            log::warn!("{strays} children outlived their platforms");
        }
        self.registry.clear();
        released
    }

    /// Highest solid platform top the feet swept through this step
    pub fn find_landing(&self, prev_feet: Vec2, feet: Vec2) -> Option<(PoolHandle, f32)> {
        self.platforms
            .iter_active()
            .filter(|(_, p)| p.is_solid())
            .filter_map(|(id, p)| {
                let body = p.body();
                let top = body.top();
                crossed_top(prev_feet, feet, top, body.position.x, body.half_width)
                    .then_some((id, top))
            })
            .fold(None, |best: Option<(PoolHandle, f32)>, hit| match best {
                Some(b) if b.1 >= hit.1 => Some(b),
                _ => Some(hit),
            })
    }

    /// Pick up every coin the player touches
    pub fn collect_coins(&mut self, point: Vec2, radius: f32) -> u32 {
        self.children.collect_coins(point, radius + COIN_RADIUS)
    }
}

impl PhysicsQuery for Scene {
    fn overlap_at(&self, point: Vec2, radius: f32, mask: LayerMask) -> Option<EntityRef> {
        if mask.contains(LayerMask::PLATFORMS) {
            let hit = self.platforms.iter_active().find(|(_, p)| {
                let body = p.body();
                p.is_solid() && circle_touches_box(point, radius, body.position, body.half_extents())
            });
            if let Some((id, _)) = hit {
                return Some(EntityRef::Platform(id));
            }
        }
        if mask.contains(LayerMask::COINS) {
            let hit = self
                .children
                .coins
                .iter_active()
                .find(|(_, c)| c.position.distance(point) <= radius + COIN_RADIUS);
            if let Some((id, _)) = hit {
                return Some(EntityRef::Coin(id));
            }
        }
        if mask.contains(LayerMask::ENEMIES) {
            let hit = self
                .children
                .enemies
                .iter_active()
                .find(|(_, e)| e.position.distance(point) <= radius + ENEMY_RADIUS);
            if let Some((id, _)) = hit {
                return Some(EntityRef::Enemy(id));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::sim::behavior::Behavior;
    use crate::sim::children::ChildKind;
    use crate::sim::planner::SlotOrigin;
    use crate::sim::player::Player;
    use crate::sim::preset::default_catalog;

    fn scene() -> Scene {
        Scene::new(Viewport::default(), 0.3, &PoolSizes::default(), default_catalog())
    }

    fn slot(x: f32, y: f32) -> PlacementSlot {
        PlacementSlot {
            x,
            y,
            half_width: 0.8,
            origin: SlotOrigin::Reachable,
        }
    }

    #[test]
    fn test_spawn_registers_and_tints() {
        let mut scene = scene();
        let mut rng = Pcg32::seed_from_u64(1);
        let sticky = scene.preset_index("sticky").unwrap();
        let id = scene.spawn_platform(&slot(0.5, 3.0), Some(sticky), &mut rng).unwrap();
        let platform = scene.platform(id).unwrap();
        assert_eq!(platform.preset_name(), Some("sticky"));
        assert_eq!(platform.body().visual.color, scene.presets()[sticky].color);
        assert_eq!(scene.registry().get(id).unwrap().y, 3.0);
    }

    #[test]
    fn test_isolated_platform_moves_but_paired_one_does_not() {
        let mut scene = scene();
        let mut rng = Pcg32::seed_from_u64(2);
        let drifting = scene.preset_index("drifting").unwrap();

        let lone = scene.spawn_platform(&slot(0.0, 4.0), Some(drifting), &mut rng).unwrap();
        scene.ready(lone, &mut rng);

        let a = scene.spawn_platform(&slot(-1.5, 9.0), Some(drifting), &mut rng).unwrap();
        let b = scene.spawn_platform(&slot(1.5, 9.2), Some(drifting), &mut rng).unwrap();
        scene.ready(a, &mut rng);
        scene.ready(b, &mut rng);

        for _ in 0..30 {
            scene.update(1.0 / 60.0, &mut rng);
        }
        assert_ne!(scene.platform(lone).unwrap().position().x, 0.0);
        assert_eq!(scene.platform(a).unwrap().position().x, -1.5);
        assert_eq!(scene.platform(b).unwrap().position().x, 1.5);
        // Registry follows the mover
        assert_eq!(
            scene.registry().get(lone).unwrap().x,
            scene.platform(lone).unwrap().position().x
        );
    }

    #[test]
    fn test_release_veto_while_standing() {
        let mut scene = scene();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut player = Player::new(Vec2::ZERO);
        let id = scene.spawn_platform(&slot(0.0, 1.0), None, &mut rng).unwrap();
        scene.notify_landed(id, &mut player, &mut rng);

        assert!(!scene.release_platform(id, &mut rng));
        assert!(scene.registry().contains(id));

        scene.notify_left(id, &mut player, &mut rng);
        assert!(scene.release_platform(id, &mut rng));
        assert!(!scene.registry().contains(id));
        assert!(!scene.release_platform(id, &mut rng), "stale handle");
    }

    #[test]
    fn test_clear_returns_children() {
        let mut scene = scene();
        let mut rng = Pcg32::seed_from_u64(4);
        let guarded = scene.preset_index("guarded").unwrap();
        let ids = scene.spawn_level(&[slot(-1.0, 2.0)], &mut rng);
        let id = scene.spawn_platform(&slot(1.0, 6.0), Some(guarded), &mut rng).unwrap();
        scene.ready(id, &mut rng);
        assert_eq!(scene.children().active_count(ChildKind::Enemy), 1);
        assert!(scene.children().active_count(ChildKind::Coin) >= 1);

        let mut player = Player::new(Vec2::ZERO);
        scene.notify_landed(ids[0], &mut player, &mut rng);
        assert_eq!(scene.clear(&mut rng), 2);
        assert_eq!(scene.platforms().active_count(), 0);
        assert_eq!(scene.children().active_count(ChildKind::Enemy), 0);
        assert_eq!(scene.children().active_count(ChildKind::Coin), 0);
        assert!(scene.registry().is_empty());
    }

    #[test]
    fn test_release_player_lifts_sticky_before_clear() {
        let mut scene = scene();
        let mut rng = Pcg32::seed_from_u64(7);
        let sticky = scene.preset_index("sticky").unwrap();
        let id = scene.spawn_platform(&slot(0.0, 2.0), Some(sticky), &mut rng).unwrap();
        scene.ready(id, &mut rng);
        let mut player = Player::new(Vec2::new(0.0, 2.5));
        scene.notify_landed(id, &mut player, &mut rng);
        assert_eq!(player.speed_multiplier, 0.7);

        assert_eq!(scene.release_player(&mut player, &mut rng), 1);
        assert_eq!((player.speed_multiplier, player.jump_multiplier), (1.0, 1.0));
        assert!(!scene.platform(id).unwrap().player_on());
        assert_eq!(scene.release_player(&mut player, &mut rng), 0);
        assert_eq!(scene.clear(&mut rng), 1);
    }

    #[test]
    fn test_landing_and_overlap_queries() {
        let mut scene = scene();
        let mut rng = Pcg32::seed_from_u64(5);
        let normal = scene.preset_index("normal").unwrap();
        let id = scene.spawn_platform(&slot(0.0, 2.0), Some(normal), &mut rng).unwrap();
        let top = scene.platform(id).unwrap().body().top();

        let hit = scene.find_landing(Vec2::new(0.2, top + 0.05), Vec2::new(0.2, top - 0.05));
        assert_eq!(hit, Some((id, top)));
        assert!(scene.find_landing(Vec2::new(2.0, top + 0.05), Vec2::new(2.0, top - 0.05)).is_none());

        assert_eq!(
            scene.overlap_at(Vec2::new(0.0, 2.3), 0.2, LayerMask::PLATFORMS),
            Some(EntityRef::Platform(id))
        );
        assert!(scene.drop_through(id));
        assert!(scene.overlap_at(Vec2::new(0.0, 2.3), 0.2, LayerMask::PLATFORMS).is_none());
        assert!(scene.find_landing(Vec2::new(0.2, top + 0.05), Vec2::new(0.2, top - 0.05)).is_none());
    }

    #[test]
    fn test_behaviors_are_fresh_per_spawn() {
        let mut scene = scene();
        let mut rng = Pcg32::seed_from_u64(6);
        let fragile = scene.preset_index("fragile").unwrap();
        let a = scene.spawn_platform(&slot(-1.0, 2.0), Some(fragile), &mut rng).unwrap();
        let b = scene.spawn_platform(&slot(1.0, 2.0), Some(fragile), &mut rng).unwrap();
        let mut player = Player::new(Vec2::ZERO);
        scene.notify_landed(a, &mut player, &mut rng);
        let hits = |scene: &Scene, id| match &scene.platform(id).unwrap().behaviors()[0] {
            Behavior::Fragile(f) => f.hits(),
            _ => unreachable!(),
        };
        assert_eq!(hits(&scene, a), 1);
        assert_eq!(hits(&scene, b), 0);
    }
}

//! Entities that ride on platforms: coins to collect and enemies that patrol

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pool::{EntityPool, PoolHandle, Poolable};
use crate::consts::{COIN_SPAWN_HEIGHT, ENEMY_SPAWN_HEIGHT, ENEMY_SPEED};
use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildKind {
    Coin,
    Enemy,
}

impl ChildKind {
    pub fn default_height(self) -> f32 {
        match self {
            ChildKind::Coin => COIN_SPAWN_HEIGHT,
            ChildKind::Enemy => ENEMY_SPAWN_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Coin {
    pub position: Vec2,
}

impl Poolable for Coin {
    fn on_release(&mut self) {
        self.position = Vec2::ZERO;
    }
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub position: Vec2,
    /// Offset from the platform centre along the patrol
    pub local_x: f32,
    pub direction: f32,
    /// Patrol speed in units per second
    pub speed: f32,
}

impl Default for Enemy {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            local_x: 0.0,
            direction: 1.0,
            speed: ENEMY_SPEED,
        }
    }
}

impl Enemy {
    /// Walk back and forth across `[-limit, limit]` around the anchor
    fn patrol(&mut self, anchor: Vec2, limit: f32, dt: f32) {
        let limit = limit.max(0.0);
        self.local_x += self.direction * self.speed * dt;
        if self.local_x >= limit {
            self.local_x = limit;
            self.direction = -1.0;
        } else if self.local_x <= -limit {
            self.local_x = -limit;
            self.direction = 1.0;
        }
        self.position = anchor + Vec2::new(self.local_x, 0.0);
    }
}

impl Poolable for Enemy {
    fn on_acquire(&mut self) {
        self.local_x = 0.0;
        self.direction = 1.0;
    }
}

/// Pools for everything a platform can spawn
#[derive(Debug)]
pub struct ChildPools {
    pub coins: EntityPool<Coin>,
    pub enemies: EntityPool<Enemy>,
}

impl ChildPools {
    pub fn new(coins: usize, enemies: usize) -> Self {
        Self {
            coins: EntityPool::new("coins", coins, None, Coin::default),
            enemies: EntityPool::new("enemies", enemies, None, Enemy::default),
        }
    }

    pub fn spawn(&mut self, kind: ChildKind, at: Vec2) -> Result<PoolHandle, SimError> {
        match kind {
            ChildKind::Coin => {
                let handle = self.coins.acquire()?;
                if let Some(coin) = self.coins.get_mut(handle) {
                    coin.position = at;
                }
                Ok(handle)
            }
            ChildKind::Enemy => {
                let handle = self.enemies.acquire()?;
                if let Some(enemy) = self.enemies.get_mut(handle) {
                    enemy.position = at;
                }
                Ok(handle)
            }
        }
    }

    /// Keep a child attached to its platform; `false` once the handle is stale
    pub fn follow(
        &mut self,
        kind: ChildKind,
        handle: PoolHandle,
        anchor: Vec2,
        half_width: f32,
        dt: f32,
    ) -> bool {
        match kind {
            ChildKind::Coin => match self.coins.get_mut(handle) {
                Some(coin) => {
                    coin.position = anchor;
                    true
                }
                None => false,
            },
            ChildKind::Enemy => match self.enemies.get_mut(handle) {
                Some(enemy) => {
                    enemy.patrol(anchor, half_width * 0.8, dt);
                    true
                }
                None => false,
            },
        }
    }

    pub fn release(&mut self, kind: ChildKind, handle: PoolHandle) -> bool {
        match kind {
            ChildKind::Coin => self.coins.release(handle),
            ChildKind::Enemy => self.enemies.release(handle),
        }
    }

    pub fn release_all(&mut self) -> usize {
        self.coins.release_all() + self.enemies.release_all()
    }

    pub fn active_count(&self, kind: ChildKind) -> usize {
        match kind {
            ChildKind::Coin => self.coins.active_count(),
            ChildKind::Enemy => self.enemies.active_count(),
        }
    }

    /// Release every coin within `reach` of `point`; returns how many were taken
    pub fn collect_coins(&mut self, point: Vec2, reach: f32) -> u32 {
        let touched: Vec<PoolHandle> = self
            .coins
            .iter_active()
            .filter(|(_, coin)| coin.position.distance(point) <= reach)
            .map(|(h, _)| h)
            .collect();
        touched.into_iter().filter(|&h| self.coins.release(h)).count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enemy_patrol_turns_at_edges() {
        let mut enemy = Enemy::default();
        let anchor = Vec2::new(1.0, 2.0);
        for _ in 0..200 {
            enemy.patrol(anchor, 0.5, 0.05);
            assert!((enemy.position.x - anchor.x).abs() <= 0.5 + 1e-6);
            assert_eq!(enemy.position.y, anchor.y);
        }
    }

    #[test]
    fn test_enemy_uses_its_own_speed() {
        let mut slow = Enemy::default();
        let mut fast = Enemy {
            speed: 3.0,
            ..Default::default()
        };
        slow.patrol(Vec2::ZERO, 5.0, 0.1);
        fast.patrol(Vec2::ZERO, 5.0, 0.1);
        assert!((slow.local_x - ENEMY_SPEED * 0.1).abs() < 1e-6);
        assert!((fast.local_x - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_collect_coins_in_reach() {
        let mut pools = ChildPools::new(2, 0);
        let near = pools.spawn(ChildKind::Coin, Vec2::new(0.0, 1.0)).unwrap();
        let far = pools.spawn(ChildKind::Coin, Vec2::new(0.0, 9.0)).unwrap();
        assert_eq!(pools.collect_coins(Vec2::ZERO, 1.2), 1);
        assert!(!pools.coins.is_alive(near));
        assert!(pools.coins.is_alive(far));
        assert!(!pools.follow(ChildKind::Coin, near, Vec2::ZERO, 1.0, 0.1));
    }
}

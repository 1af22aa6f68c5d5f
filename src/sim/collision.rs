//! Overlap and landing queries
//!
//! Platforms are flat boxes that are solid only from above. The player is a
//! circle. There is no general physics engine: landing is a swept check of
//! the player's feet against each platform's top surface.

use glam::Vec2;

use super::pool::PoolHandle;
use crate::consts::PLATFORM_HALF_HEIGHT;
use crate::point_box_distance;

/// Bit set of collision layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerMask(u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const PLATFORMS: Self = Self(1);
    pub const COINS: Self = Self(1 << 1);
    pub const ENEMIES: Self = Self(1 << 2);
    pub const ALL: Self = Self(0b111);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Something an overlap query hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Platform(PoolHandle),
    Coin(PoolHandle),
    Enemy(PoolHandle),
}

/// Spatial queries over the live world
pub trait PhysicsQuery {
    /// First entity on `mask` whose shape comes within `radius` of `point`
    fn overlap_at(&self, point: Vec2, radius: f32, mask: LayerMask) -> Option<EntityRef>;
}

/// Whether a circle touches a platform box
#[inline]
pub fn circle_touches_box(point: Vec2, radius: f32, center: Vec2, half_extents: Vec2) -> bool {
    point_box_distance(point, center, half_extents) <= radius
}

/// Swept landing test of the feet against a one-way top surface
///
/// Hits when the feet started at or above `top` (within a small skin) and end
/// at or below it, while horizontally over the platform.
pub fn crossed_top(prev_feet: Vec2, feet: Vec2, top: f32, center_x: f32, half_width: f32) -> bool {
    const SKIN: f32 = PLATFORM_HALF_HEIGHT;
    if prev_feet.y < top - SKIN || feet.y > top {
        return false;
    }
    (feet.x - center_x).abs() <= half_width
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_mask() {
        let mask = LayerMask::PLATFORMS.union(LayerMask::COINS);
        assert!(mask.contains(LayerMask::COINS));
        assert!(!mask.contains(LayerMask::ENEMIES));
        assert!(LayerMask::ALL.contains(mask));
        assert!(!mask.contains(LayerMask::NONE));
    }

    #[test]
    fn test_circle_box() {
        let center = Vec2::new(0.0, 0.0);
        let half = Vec2::new(1.0, 0.15);
        assert!(circle_touches_box(Vec2::new(0.5, 0.4), 0.3, center, half));
        assert!(!circle_touches_box(Vec2::new(0.5, 0.6), 0.3, center, half));
        assert!(circle_touches_box(Vec2::new(1.2, 0.0), 0.3, center, half));
    }

    #[test]
    fn test_crossed_top() {
        // Falling through the surface
        assert!(crossed_top(Vec2::new(0.0, 1.1), Vec2::new(0.0, 0.9), 1.0, 0.0, 1.0));
        // Rising from below passes through
        assert!(!crossed_top(Vec2::new(0.0, 0.5), Vec2::new(0.0, 0.9), 1.0, 0.0, 1.0));
        // Beside the platform
        assert!(!crossed_top(Vec2::new(1.5, 1.1), Vec2::new(1.5, 0.9), 1.0, 0.0, 1.0));
        // Resting exactly on top counts
        assert!(crossed_top(Vec2::new(0.0, 1.0), Vec2::new(0.0, 0.99), 1.0, 0.0, 1.0));
    }
}

//! Sky Climber - endless vertical platformer simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (pooling, placement, generation, platform behaviors)
//! - `settings`: Data-driven tuning, loaded from / saved to JSON
//! - `error`: Return-value error signals shared by the simulation

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{SettingsError, SimError};
pub use settings::{Difficulty, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Orthographic camera half-height in world units
    pub const CAMERA_SIZE: f32 = 5.0;
    /// Default portrait aspect ratio (width / height)
    pub const DEFAULT_ASPECT: f32 = 9.0 / 16.0;
    /// Gap kept between platforms and the screen edge
    pub const SCREEN_MARGIN: f32 = 0.3;
    /// How far below the camera bottom the player may fall before the run ends
    pub const SCREEN_DEATH_MARGIN: f32 = 0.5;

    /// Platform defaults
    pub const DEFAULT_PLATFORM_WIDTH: f32 = 2.0;
    pub const PLATFORM_HALF_HEIGHT: f32 = 0.15;
    pub const PLATFORM_SPACING: f32 = 0.5;
    /// Two platforms closer than this in Y are treated as the same level
    pub const SAME_HORIZONTAL_LEVEL_TOLERANCE: f32 = 0.5;
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 10;
    /// Shortest travel a moving platform is allowed
    pub const MIN_MOVEMENT_RANGE: f32 = 1.0;
    /// Collider stays off this long after a drop-through
    pub const DROP_THROUGH_COLLISION_DELAY: f32 = 0.2;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 0.35;
    pub const PLAYER_MOVE_SPEED: f32 = 5.0;
    pub const PLAYER_JUMP_FORCE: f32 = 16.0;
    pub const GRAVITY: f32 = 25.0;
    /// Landing only counts while falling (or nearly at rest)
    pub const LANDING_VELOCITY_THRESHOLD: f32 = 0.1;

    /// Spawned children sit this far above the platform surface
    pub const COIN_SPAWN_HEIGHT: f32 = 1.0;
    pub const ENEMY_SPAWN_HEIGHT: f32 = 0.3;
    pub const COIN_RADIUS: f32 = 0.25;
    pub const ENEMY_RADIUS: f32 = 0.3;
    pub const ENEMY_SPEED: f32 = 1.0;
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// True when every component is a finite number
#[inline]
pub fn is_finite_vec(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

/// Distance from a point to an axis-aligned box given by center and half extents
#[inline]
pub fn point_box_distance(point: Vec2, center: Vec2, half_extents: Vec2) -> f32 {
    let d = (point - center).abs() - half_extents;
    d.max(Vec2::ZERO).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_box_distance() {
        let center = Vec2::new(1.0, 1.0);
        let half = Vec2::new(1.0, 0.5);
        assert_eq!(point_box_distance(Vec2::new(1.5, 1.2), center, half), 0.0);
        assert!((point_box_distance(Vec2::new(3.0, 1.0), center, half) - 1.0).abs() < 1e-6);
        assert!((point_box_distance(Vec2::new(1.0, 2.5), center, half) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_is_finite_vec() {
        assert!(is_finite_vec(Vec2::new(1.0, -2.0)));
        assert!(!is_finite_vec(Vec2::new(f32::NAN, 0.0)));
        assert!(!is_finite_vec(Vec2::new(0.0, f32::INFINITY)));
    }
}

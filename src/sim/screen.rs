//! Camera viewport and the screen extents placement works against

use serde::{Deserialize, Serialize};

use crate::consts::{CAMERA_SIZE, DEFAULT_ASPECT};

/// Horizontal extent of the visible play area
pub trait ScreenBounds {
    fn half_width(&self) -> f32;
}

/// Orthographic camera that only ever scrolls upward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    /// Half the visible height
    pub ortho_size: f32,
    /// Width over height
    pub aspect: f32,
    pub center_y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            ortho_size: CAMERA_SIZE,
            aspect: DEFAULT_ASPECT,
            center_y: 0.0,
        }
    }
}

impl Viewport {
    pub fn bottom(&self) -> f32 {
        self.center_y - self.ortho_size
    }

    pub fn top(&self) -> f32 {
        self.center_y + self.ortho_size
    }

    /// Scroll up to keep `y` centred; never scrolls back down
    pub fn follow(&mut self, y: f32) {
        self.center_y = self.center_y.max(y);
    }
}

impl ScreenBounds for Viewport {
    fn half_width(&self) -> f32 {
        self.ortho_size * self.aspect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_only_rises() {
        let mut view = Viewport::default();
        view.follow(3.0);
        view.follow(1.0);
        assert_eq!(view.center_y, 3.0);
        assert_eq!(view.bottom(), -2.0);
        assert!((view.half_width() - 2.8125).abs() < 1e-6);
    }
}

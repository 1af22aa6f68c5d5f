//! Coins and enemies spawned on top of a platform

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{BehaviorCtx, roll};
use crate::sim::children::ChildKind;
use crate::sim::platform::PlatformBody;
use crate::sim::pool::PoolHandle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub kind: ChildKind,
    pub chance: f32,
    /// Offset above the platform centre; `None` uses the kind's default
    pub height: Option<f32>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            kind: ChildKind::Coin,
            chance: 0.3,
            height: None,
        }
    }
}

/// Rolls for a child (coin, enemy) when the platform becomes ready and
/// returns it to its pool when the platform is recycled
#[derive(Debug, Clone)]
pub struct SpawnChild {
    config: SpawnConfig,
    child: Option<PoolHandle>,
}

impl SpawnChild {
    pub fn new(config: SpawnConfig) -> Self {
        Self {
            config,
            child: None,
        }
    }

    pub fn child(&self) -> Option<PoolHandle> {
        self.child
    }

    fn offset(&self) -> Vec2 {
        Vec2::new(0.0, self.config.height.unwrap_or(self.config.kind.default_height()))
    }

    pub(super) fn initialize(&mut self, ctx: &mut BehaviorCtx) {
        // Anything still held here belongs to a previous life
        self.release_child(ctx);
    }

    pub(super) fn on_ready(&mut self, body: &mut PlatformBody, ctx: &mut BehaviorCtx) {
        if self.child.is_some() || !roll(ctx.rng, self.config.chance) {
            return;
        }
        let children = match ctx.children() {
            Ok(children) => children,
            Err(e) => {
                log::debug!("skipping {:?} spawn: {e}", self.config.kind);
                return;
            }
        };
        match children.spawn(self.config.kind, body.position + self.offset()) {
            Ok(handle) => self.child = Some(handle),
            Err(e) => log::debug!("child spawn skipped: {e}"),
        }
    }

    pub(super) fn on_update(&mut self, body: &mut PlatformBody, ctx: &mut BehaviorCtx) {
        let Some(handle) = self.child else {
            return;
        };
        let Some(children) = ctx.children.as_deref_mut() else {
            return;
        };
        let anchor = body.position + self.offset();
        if !children.follow(self.config.kind, handle, anchor, body.half_width, ctx.dt) {
            // Collected or otherwise gone
            self.child = None;
        }
    }

    pub(super) fn on_reset(&mut self, ctx: &mut BehaviorCtx) {
        self.release_child(ctx);
    }

    fn release_child(&mut self, ctx: &mut BehaviorCtx) {
        let Some(handle) = self.child else {
            return;
        };
        match ctx.children() {
            Ok(children) => {
                children.release(self.config.kind, handle);
                self.child = None;
            }
            Err(e) => log::warn!("cannot return {:?} child {handle:?}: {e}", self.config.kind),
        }
    }
}

//! Platform entity: a body the player stands on plus the behaviors driving it

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use super::behavior::{Behavior, BehaviorCtx, BehaviorSpec};
use super::planner::{PlacementSlot, SlotOrigin};
use super::player::PlayerHandle;
use super::pool::Poolable;
use super::preset::PlatformPreset;
use super::registry::Footprint;
use crate::consts::{DEFAULT_PLATFORM_WIDTH, DROP_THROUGH_COLLISION_DELAY, PLATFORM_HALF_HEIGHT};
use crate::error::SimError;
use crate::is_finite_vec;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Visual {
    /// RGBA, alpha used for fades
    pub color: Vec4,
    pub scale: Vec2,
    pub visible: bool,
}

impl Default for Visual {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            scale: Vec2::ONE,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub enabled: bool,
    /// Solid only from above
    pub one_way: bool,
    pub size: Vec2,
    pub offset: Vec2,
}

impl Default for Collider {
    fn default() -> Self {
        Self {
            enabled: true,
            one_way: true,
            size: Vec2::new(DEFAULT_PLATFORM_WIDTH, PLATFORM_HALF_HEIGHT * 2.0),
            offset: Vec2::ZERO,
        }
    }
}

/// The parts of a platform behaviors are allowed to change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformBody {
    pub position: Vec2,
    pub half_width: f32,
    pub visual: Visual,
    /// `None` when the platform was built without one
    pub collider: Option<Collider>,
}

impl Default for PlatformBody {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            half_width: DEFAULT_PLATFORM_WIDTH * 0.5,
            visual: Visual::default(),
            collider: Some(Collider::default()),
        }
    }
}

impl PlatformBody {
    pub fn is_solid(&self) -> bool {
        self.collider.is_some_and(|c| c.enabled)
    }

    /// Y of the standing surface
    pub fn top(&self) -> f32 {
        let offset = self.collider.map_or(0.0, |c| c.offset.y);
        self.position.y + offset + PLATFORM_HALF_HEIGHT
    }

    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.half_width, PLATFORM_HALF_HEIGHT)
    }

    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.position.x, self.position.y, self.half_width)
    }
}

/// A pooled platform
#[derive(Debug, Clone)]
pub struct PlatformEntity {
    body: PlatformBody,
    /// Body as built by the pool; every reuse starts from this
    pristine: PlatformBody,
    behaviors: Vec<Behavior>,
    preset: Option<String>,
    origin: SlotOrigin,
    active: bool,
    player_on: bool,
    drop_through_timer: f32,
}

impl Default for PlatformEntity {
    fn default() -> Self {
        Self::new(PlatformBody::default())
    }
}

impl PlatformEntity {
    pub fn new(body: PlatformBody) -> Self {
        Self {
            pristine: body.clone(),
            body,
            behaviors: Vec::new(),
            preset: None,
            origin: SlotOrigin::Seed,
            active: false,
            player_on: false,
            drop_through_timer: 0.0,
        }
    }

    pub fn body(&self) -> &PlatformBody {
        &self.body
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn footprint(&self) -> Footprint {
        self.body.footprint()
    }

    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    pub fn preset_name(&self) -> Option<&str> {
        self.preset.as_deref()
    }

    pub fn origin(&self) -> SlotOrigin {
        self.origin
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn player_on(&self) -> bool {
        self.player_on
    }

    /// Solid and not mid drop-through
    pub fn is_solid(&self) -> bool {
        self.body.is_solid()
    }

    /// Move onto a planned slot and size the collider to match
    pub fn place(&mut self, slot: &PlacementSlot) -> Result<(), SimError> {
        let position = Vec2::new(slot.x, slot.y);
        if !is_finite_vec(position) || !slot.half_width.is_finite() || slot.half_width <= 0.0 {
            return Err(SimError::InvariantViolation(format!(
                "bad platform slot ({}, {}) half width {}",
                slot.x, slot.y, slot.half_width
            )));
        }
        self.body.position = position;
        self.body.half_width = slot.half_width;
        if let Some(collider) = self.body.collider.as_mut() {
            collider.size.x = slot.half_width * 2.0;
        }
        self.origin = slot.origin;
        Ok(())
    }

    /// Tint the platform and attach the preset's behaviors
    pub fn apply_preset(&mut self, preset: &PlatformPreset, ctx: &mut BehaviorCtx) {
        self.body.visual.color = preset.color;
        self.preset = Some(preset.name.clone());
        for spec in &preset.behaviors {
            self.attach(spec, ctx);
        }
    }

    /// Instantiate and initialize one behavior
    pub fn attach(&mut self, spec: &BehaviorSpec, ctx: &mut BehaviorCtx) {
        let mut behavior = spec.instantiate();
        behavior.initialize(&mut self.body, ctx);
        self.behaviors.push(behavior);
    }

    pub fn ready(&mut self, ctx: &mut BehaviorCtx) {
        for behavior in &mut self.behaviors {
            behavior.on_ready(&mut self.body, ctx);
        }
    }

    pub fn notify_landed(&mut self, player: &mut dyn PlayerHandle, ctx: &mut BehaviorCtx) {
        self.player_on = true;
        for behavior in &mut self.behaviors {
            behavior.on_landed(&mut self.body, player, ctx);
        }
    }

    pub fn notify_staying(&mut self, player: &mut dyn PlayerHandle, ctx: &mut BehaviorCtx) {
        for behavior in &mut self.behaviors {
            behavior.on_staying(&mut self.body, player, ctx);
        }
    }

    pub fn notify_left(&mut self, player: &mut dyn PlayerHandle, ctx: &mut BehaviorCtx) {
        self.player_on = false;
        for behavior in &mut self.behaviors {
            behavior.on_left(&mut self.body, player, ctx);
        }
    }

    pub fn tick(&mut self, ctx: &mut BehaviorCtx) {
        if self.drop_through_timer > 0.0 {
            self.drop_through_timer -= ctx.dt;
            if self.drop_through_timer <= 0.0 {
                self.drop_through_timer = 0.0;
                // A platform that broke during the window stays open
                let held = self.behaviors.iter().any(Behavior::holds_collider_off);
                if let Some(collider) = self.body.collider.as_mut() {
                    collider.enabled = !held;
                }
            }
        }
        for behavior in &mut self.behaviors {
            behavior.on_update(&mut self.body, ctx);
        }
    }

    /// Let the player fall through a one-way platform for a moment
    pub fn drop_through(&mut self) -> bool {
        match self.body.collider.as_mut() {
            Some(collider) if collider.one_way && collider.enabled => {
                collider.enabled = false;
                self.drop_through_timer = DROP_THROUGH_COLLISION_DELAY;
                true
            }
            _ => false,
        }
    }

    /// Forget the player is standing here (forced teardown)
    pub fn clear_contact(&mut self) {
        self.player_on = false;
    }

    /// Undo everything this life did: behaviors reset in order, then dropped,
    /// and the body goes back to how the pool built it. Idempotent.
    pub fn reset_to_pool_defaults(&mut self, ctx: &mut BehaviorCtx) {
        for behavior in &mut self.behaviors {
            behavior.on_reset(&mut self.body, ctx);
        }
        self.behaviors.clear();
        self.restore_pristine();
    }

    fn restore_pristine(&mut self) {
        self.body = self.pristine.clone();
        self.preset = None;
        self.origin = SlotOrigin::Seed;
        self.player_on = false;
        self.drop_through_timer = 0.0;
    }
}

impl Poolable for PlatformEntity {
    fn on_created(&mut self) {
        self.pristine = self.body.clone();
    }

    fn on_acquire(&mut self) {
        self.restore_pristine();
        self.active = true;
    }

    fn on_release(&mut self) {
        self.active = false;
    }

    fn can_release(&self) -> bool {
        !self.player_on
    }
}

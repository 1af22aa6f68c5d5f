//! Composable platform behaviors
//!
//! A platform carries an ordered list of [`Behavior`]s. Every lifecycle event
//! is broadcast to each of them in list order, and each keeps its own state.
//! Behaviors only touch what they captured themselves and put it back on
//! reset, so a recycled platform never inherits a previous owner's state.
//!
//! Lifecycle:
//! - `initialize`: attached to a freshly positioned platform; snapshot state
//! - `on_ready`: the platform's level is registered; spawn, measure, decide
//! - `on_landed` / `on_staying` / `on_left`: player contact
//! - `on_update`: once per tick
//! - `on_reset`: platform goes back to the pool (idempotent)

mod bounce;
mod breakable;
mod conditional;
mod moving;
mod spawn;
mod sticky;

pub use bounce::{Bounce, BounceConfig, BouncePhase};
pub use breakable::{BreakPhase, Crumble, CrumbleConfig, Fragile, FragileConfig};
pub use conditional::{Condition, Conditional};
pub use moving::{Moving, MovingConfig, MovingPhase};
pub use spawn::{SpawnChild, SpawnConfig};
pub use sticky::{Sticky, StickyConfig};

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::children::ChildPools;
use super::platform::PlatformBody;
use super::player::PlayerHandle;
use super::pool::PoolHandle;
use super::registry::PlatformRegistry;
use crate::error::SimError;

/// Services a behavior may use during one hook call
///
/// Every collaborator except the RNG is optional; a behavior that needs a
/// missing one skips that operation instead of failing the whole dispatch.
pub struct BehaviorCtx<'a> {
    /// Handle of the platform being dispatched to
    pub id: PoolHandle,
    pub rng: &'a mut Pcg32,
    pub registry: Option<&'a PlatformRegistry>,
    pub children: Option<&'a mut ChildPools>,
    /// Largest |x| a platform edge may reach (screen half width minus margin)
    pub play_half_width: Option<f32>,
    pub dt: f32,
}

impl<'a> BehaviorCtx<'a> {
    /// Child pools, or the error to log when none were wired in
    pub fn children(&mut self) -> Result<&mut ChildPools, SimError> {
        self.children
            .as_deref_mut()
            .ok_or(SimError::MissingCollaborator("child pools"))
    }

    pub fn registry(&self) -> Result<&'a PlatformRegistry, SimError> {
        self.registry
            .ok_or(SimError::MissingCollaborator("platform registry"))
    }
}

/// Roll a probability in `[0, 1]`; 1.0 always passes, 0.0 never does
#[inline]
pub(crate) fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f32) -> bool {
    chance >= 1.0 || rng.random::<f32>() < chance
}

/// One behavior attached to one platform
#[derive(Debug, Clone)]
pub enum Behavior {
    Bounce(Bounce),
    Fragile(Fragile),
    Crumble(Crumble),
    Sticky(Sticky),
    Moving(Moving),
    Conditional(Conditional),
    SpawnChild(SpawnChild),
}

impl Behavior {
    pub fn name(&self) -> &'static str {
        match self {
            Behavior::Bounce(_) => "bounce",
            Behavior::Fragile(_) => "fragile",
            Behavior::Crumble(_) => "crumble",
            Behavior::Sticky(_) => "sticky",
            Behavior::Moving(_) => "moving",
            Behavior::Conditional(_) => "conditional",
            Behavior::SpawnChild(_) => "spawn_child",
        }
    }

    /// True while this behavior keeps the platform's collider switched off
    pub fn holds_collider_off(&self) -> bool {
        match self {
            Behavior::Fragile(b) => b.phase() == BreakPhase::Broken,
            Behavior::Crumble(b) => b.phase() == BreakPhase::Broken,
            Behavior::Conditional(b) => b.is_active() && b.inner().holds_collider_off(),
            _ => false,
        }
    }

    pub fn initialize(&mut self, body: &mut PlatformBody, ctx: &mut BehaviorCtx) {
        match self {
            Behavior::Bounce(b) => b.initialize(body),
            Behavior::Fragile(b) => b.initialize(body),
            Behavior::Crumble(b) => b.initialize(body),
            Behavior::Sticky(b) => b.initialize(),
            Behavior::Moving(b) => b.initialize(body),
            Behavior::Conditional(b) => b.initialize(body, ctx),
            Behavior::SpawnChild(b) => b.initialize(ctx),
        }
    }

    pub fn on_ready(&mut self, body: &mut PlatformBody, ctx: &mut BehaviorCtx) {
        match self {
            Behavior::Moving(b) => b.on_ready(body, ctx.play_half_width),
            Behavior::Conditional(b) => b.on_ready(body, ctx),
            Behavior::SpawnChild(b) => b.on_ready(body, ctx),
            _ => {}
        }
    }

    pub fn on_landed(
        &mut self,
        body: &mut PlatformBody,
        player: &mut dyn PlayerHandle,
        ctx: &mut BehaviorCtx,
    ) {
        match self {
            Behavior::Bounce(b) => b.on_landed(body, player, ctx.rng),
            Behavior::Fragile(b) => b.on_landed(body),
            Behavior::Crumble(b) => b.on_landed(),
            Behavior::Sticky(b) => b.on_player_contact(player),
            Behavior::Conditional(b) => b.on_landed(body, player, ctx),
            Behavior::Moving(_) | Behavior::SpawnChild(_) => {}
        }
    }

    pub fn on_staying(
        &mut self,
        body: &mut PlatformBody,
        player: &mut dyn PlayerHandle,
        ctx: &mut BehaviorCtx,
    ) {
        match self {
            Behavior::Crumble(b) => b.on_staying(),
            Behavior::Sticky(b) => b.on_player_contact(player),
            Behavior::Conditional(b) => b.on_staying(body, player, ctx),
            _ => {}
        }
    }

    pub fn on_left(
        &mut self,
        body: &mut PlatformBody,
        player: &mut dyn PlayerHandle,
        ctx: &mut BehaviorCtx,
    ) {
        match self {
            Behavior::Crumble(b) => b.on_left(body),
            Behavior::Sticky(b) => b.on_left(player),
            Behavior::Conditional(b) => b.on_left(body, player, ctx),
            _ => {}
        }
    }

    pub fn on_update(&mut self, body: &mut PlatformBody, ctx: &mut BehaviorCtx) {
        match self {
            Behavior::Bounce(b) => b.on_update(body, ctx.dt),
            Behavior::Fragile(b) => b.on_update(body, ctx.dt),
            Behavior::Crumble(b) => b.on_update(body, ctx.dt),
            Behavior::Moving(b) => b.on_update(body, ctx.dt),
            Behavior::Conditional(b) => b.on_update(body, ctx),
            Behavior::SpawnChild(b) => b.on_update(body, ctx),
            Behavior::Sticky(_) => {}
        }
    }

    pub fn on_reset(&mut self, body: &mut PlatformBody, ctx: &mut BehaviorCtx) {
        match self {
            Behavior::Bounce(b) => b.on_reset(body),
            Behavior::Fragile(b) => b.on_reset(body),
            Behavior::Crumble(b) => b.on_reset(body),
            Behavior::Sticky(b) => b.on_reset(),
            Behavior::Moving(b) => b.on_reset(body),
            Behavior::Conditional(b) => b.on_reset(body, ctx),
            Behavior::SpawnChild(b) => b.on_reset(ctx),
        }
    }
}

/// Serializable template a [`Behavior`] is instantiated from
///
/// Instantiating never shares state: two platforms built from the same spec
/// get independent behaviors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BehaviorSpec {
    Bounce(BounceConfig),
    Fragile(FragileConfig),
    Crumble(CrumbleConfig),
    Sticky(StickyConfig),
    Moving(MovingConfig),
    Conditional {
        condition: Condition,
        behavior: Box<BehaviorSpec>,
    },
    SpawnChild(SpawnConfig),
}

impl BehaviorSpec {
    pub fn instantiate(&self) -> Behavior {
        match self {
            BehaviorSpec::Bounce(c) => Behavior::Bounce(Bounce::new(c.clone())),
            BehaviorSpec::Fragile(c) => Behavior::Fragile(Fragile::new(c.clone())),
            BehaviorSpec::Crumble(c) => Behavior::Crumble(Crumble::new(c.clone())),
            BehaviorSpec::Sticky(c) => Behavior::Sticky(Sticky::new(c.clone())),
            BehaviorSpec::Moving(c) => Behavior::Moving(Moving::new(c.clone())),
            BehaviorSpec::Conditional {
                condition,
                behavior,
            } => Behavior::Conditional(Conditional::new(condition.clone(), behavior.instantiate())),
            BehaviorSpec::SpawnChild(c) => Behavior::SpawnChild(SpawnChild::new(c.clone())),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::sim::player::Player;

    /// Owns everything a hook call borrows
    pub struct Rig {
        pub body: PlatformBody,
        pub rng: Pcg32,
        pub registry: PlatformRegistry,
        pub children: ChildPools,
        pub player: Player,
        pub id: PoolHandle,
    }

    impl Rig {
        pub fn new() -> Self {
            let mut body = PlatformBody::default();
            body.position = Vec2::new(0.0, 5.0);
            body.half_width = 1.0;
            Self {
                body,
                rng: Pcg32::seed_from_u64(11),
                registry: PlatformRegistry::new(),
                children: ChildPools::new(4, 4),
                player: Player::new(Vec2::new(0.0, 5.5)),
                id: PoolHandle::new(0, 0),
            }
        }

        /// Run `f` with a full context
        pub fn with<T>(
            &mut self,
            dt: f32,
            f: impl FnOnce(&mut PlatformBody, &mut Player, &mut BehaviorCtx) -> T,
        ) -> T {
            let mut ctx = BehaviorCtx {
                id: self.id,
                rng: &mut self.rng,
                registry: Some(&self.registry),
                children: Some(&mut self.children),
                play_half_width: Some(5.0),
                dt,
            };
            f(&mut self.body, &mut self.player, &mut ctx)
        }
    }
}

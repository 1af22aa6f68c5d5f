//! Behaviors that only switch on when a condition holds at ready time

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Behavior, BehaviorCtx};
use crate::sim::platform::PlatformBody;
use crate::sim::player::PlayerHandle;

/// Predicate over a platform's surroundings, checked once when it becomes ready
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// No other platform on the same level
    HorizontallyIsolated { tolerance: f32 },
    /// At least one other platform on the same level within `radius`
    HasNeighbors { radius: f32, tolerance: f32 },
    Chance { probability: f32 },
    AboveHeight { y: f32 },
    All { conditions: Vec<Condition> },
}

impl Condition {
    pub fn evaluate(&self, body: &PlatformBody, ctx: &mut BehaviorCtx) -> bool {
        match self {
            Condition::HorizontallyIsolated { tolerance } => {
                let registry = match ctx.registry() {
                    Ok(registry) => registry,
                    Err(e) => {
                        log::debug!("isolation check failed: {e}");
                        return false;
                    }
                };
                registry
                    .same_level_neighbors(ctx.id, body.position.y, *tolerance)
                    .next()
                    .is_none()
            }
            Condition::HasNeighbors { radius, tolerance } => {
                let registry = match ctx.registry() {
                    Ok(registry) => registry,
                    Err(e) => {
                        log::debug!("neighbour check failed: {e}");
                        return false;
                    }
                };
                registry
                    .same_level_neighbors(ctx.id, body.position.y, *tolerance)
                    .any(|(_, fp)| (fp.x - body.position.x).abs() <= *radius)
            }
            Condition::Chance { probability } => ctx.rng.random::<f32>() < *probability,
            Condition::AboveHeight { y } => body.position.y >= *y,
            Condition::All { conditions } => conditions.iter().all(|c| c.evaluate(body, ctx)),
        }
    }
}

/// Wraps another behavior and only lets it run when its condition held at ready time
#[derive(Debug, Clone)]
pub struct Conditional {
    condition: Condition,
    inner: Box<Behavior>,
    active: bool,
}

impl Conditional {
    pub fn new(condition: Condition, inner: Behavior) -> Self {
        Self {
            condition,
            inner: Box::new(inner),
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn inner(&self) -> &Behavior {
        &self.inner
    }

    pub(super) fn initialize(&mut self, body: &mut PlatformBody, ctx: &mut BehaviorCtx) {
        self.active = false;
        self.inner.initialize(body, ctx);
    }

    pub(super) fn on_ready(&mut self, body: &mut PlatformBody, ctx: &mut BehaviorCtx) {
        self.active = self.condition.evaluate(body, ctx);
        if self.active {
            self.inner.on_ready(body, ctx);
        }
    }

    pub(super) fn on_landed(
        &mut self,
        body: &mut PlatformBody,
        player: &mut dyn PlayerHandle,
        ctx: &mut BehaviorCtx,
    ) {
        if self.active {
            self.inner.on_landed(body, player, ctx);
        }
    }

    pub(super) fn on_staying(
        &mut self,
        body: &mut PlatformBody,
        player: &mut dyn PlayerHandle,
        ctx: &mut BehaviorCtx,
    ) {
        if self.active {
            self.inner.on_staying(body, player, ctx);
        }
    }

    pub(super) fn on_left(
        &mut self,
        body: &mut PlatformBody,
        player: &mut dyn PlayerHandle,
        ctx: &mut BehaviorCtx,
    ) {
        if self.active {
            self.inner.on_left(body, player, ctx);
        }
    }

    pub(super) fn on_update(&mut self, body: &mut PlatformBody, ctx: &mut BehaviorCtx) {
        if self.active {
            self.inner.on_update(body, ctx);
        }
    }

    /// The inner reset runs even when inactive; it is a no-op on untouched state
    pub(super) fn on_reset(&mut self, body: &mut PlatformBody, ctx: &mut BehaviorCtx) {
        self.inner.on_reset(body, ctx);
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::behavior::{Moving, MovingConfig, MovingPhase, test_support::Rig};
    use crate::sim::pool::PoolHandle;
    use crate::sim::registry::Footprint;

    fn isolated_mover() -> Conditional {
        Conditional::new(
            Condition::HorizontallyIsolated { tolerance: 0.5 },
            Behavior::Moving(Moving::new(MovingConfig::default())),
        )
    }

    fn inner_phase(c: &Conditional) -> MovingPhase {
        match c.inner() {
            Behavior::Moving(m) => m.phase(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_isolated_platform_activates() {
        let mut rig = Rig::new();
        rig.registry
            .insert(rig.id, Footprint::new(0.0, rig.body.position.y, 1.0));
        let mut cond = isolated_mover();
        rig.with(0.1, |body, _, ctx| {
            cond.initialize(body, ctx);
            cond.on_ready(body, ctx);
        });
        assert!(cond.is_active());
        assert_eq!(inner_phase(&cond), MovingPhase::Moving);
    }

    #[test]
    fn test_neighbour_keeps_it_dormant() {
        let mut rig = Rig::new();
        let y = rig.body.position.y;
        rig.registry.insert(rig.id, Footprint::new(0.0, y, 1.0));
        rig.registry
            .insert(PoolHandle::new(7, 0), Footprint::new(3.0, y + 0.2, 1.0));
        let mut cond = isolated_mover();
        rig.with(0.1, |body, _, ctx| {
            cond.initialize(body, ctx);
            cond.on_ready(body, ctx);
            for _ in 0..10 {
                cond.on_update(body, ctx);
            }
        });
        assert!(!cond.is_active());
        assert_eq!(inner_phase(&cond), MovingPhase::Stationary);
        assert_eq!(rig.body.position.x, 0.0);
    }

    #[test]
    fn test_missing_registry_means_inactive() {
        let mut rig = Rig::new();
        let mut cond = isolated_mover();
        let mut ctx = BehaviorCtx {
            id: rig.id,
            rng: &mut rig.rng,
            registry: None,
            children: None,
            play_half_width: Some(5.0),
            dt: 0.1,
        };
        cond.initialize(&mut rig.body, &mut ctx);
        cond.on_ready(&mut rig.body, &mut ctx);
        assert!(!cond.is_active());
    }

    #[test]
    fn test_compound_conditions() {
        let mut rig = Rig::new();
        let y = rig.body.position.y;
        rig.registry
            .insert(PoolHandle::new(3, 0), Footprint::new(2.5, y, 1.0));
        let near = Condition::HasNeighbors {
            radius: 3.0,
            tolerance: 0.5,
        };
        let far = Condition::HasNeighbors {
            radius: 1.0,
            tolerance: 0.5,
        };
        let high = Condition::AboveHeight { y: 4.0 };
        let higher = Condition::AboveHeight { y: 40.0 };
        rig.with(0.0, |body, _, ctx| {
            assert!(near.evaluate(body, ctx));
            assert!(!far.evaluate(body, ctx));
            assert!(
                Condition::All {
                    conditions: vec![near.clone(), high.clone()]
                }
                .evaluate(body, ctx)
            );
            assert!(
                !Condition::All {
                    conditions: vec![near.clone(), higher.clone()]
                }
                .evaluate(body, ctx)
            );
            assert!(!Condition::Chance { probability: 0.0 }.evaluate(body, ctx));
        });
    }
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, passed explicitly
//! - Stable iteration order (by pool handle)
//! - No rendering or platform dependencies

pub mod behavior;
pub mod children;
pub mod collision;
pub mod generator;
pub mod planner;
pub mod platform;
pub mod player;
pub mod pool;
pub mod preset;
pub mod registry;
pub mod scene;
pub mod screen;
pub mod state;
pub mod tick;

pub use behavior::{Behavior, BehaviorCtx, BehaviorSpec, Condition};
pub use children::{ChildKind, ChildPools, Coin, Enemy};
pub use collision::{EntityRef, LayerMask, PhysicsQuery};
pub use generator::{GenerationStats, GenerationWindow, GeneratorConfig, LevelGenerator};
pub use planner::{PlacementConstraints, PlacementPlanner, PlacementSlot, SlotOrigin};
pub use platform::{Collider, PlatformBody, PlatformEntity, Visual};
pub use player::{Player, PlayerHandle};
pub use pool::{EntityPool, PoolHandle, Poolable};
pub use preset::{PlatformPreset, default_catalog, pick_weighted};
pub use registry::{Footprint, PlatformRegistry};
pub use scene::{PoolSizes, Scene};
pub use screen::{ScreenBounds, Viewport};
pub use state::{DeathCause, GamePhase, GameState, RunStats};
pub use tick::{TickInput, tick};

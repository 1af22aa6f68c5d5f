//! Reusable entity pools
//!
//! Platforms, coins and enemies are created once and recycled. Every slot is
//! addressed by a generational [`PoolHandle`]: releasing a slot bumps its
//! generation, so a handle held past release is detected as stale instead of
//! aliasing whatever reuses the slot next.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Generational handle into an [`EntityPool`]
///
/// Ordered by index first, so maps keyed by handle iterate in slot order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

impl PoolHandle {
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Storage slot this handle points at
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolHandle({}v{})", self.index, self.generation)
    }
}

/// Lifecycle hooks for pooled entities
pub trait Poolable {
    /// Called once, right after the pool constructs the entity
    fn on_created(&mut self) {}
    /// Called every time the entity is handed out
    fn on_acquire(&mut self) {}
    /// Called every time the entity goes back into the pool
    fn on_release(&mut self) {}
    /// Veto a release (e.g. the player is still standing on it)
    fn can_release(&self) -> bool {
        true
    }
}

struct Slot<T> {
    item: T,
    generation: u32,
    active: bool,
}

/// Fixed or growable pool of reusable entities
pub struct EntityPool<T> {
    name: &'static str,
    slots: Vec<Slot<T>>,
    /// Free slot indices, FIFO so reuse spreads across slots
    free: VecDeque<u32>,
    /// Hard cap on slots; `None` grows without bound
    capacity: Option<usize>,
    factory: Box<dyn Fn() -> T>,
}

impl<T: Poolable> EntityPool<T> {
    /// Create a pool pre-warmed with `initial` entities
    pub fn new(
        name: &'static str,
        initial: usize,
        capacity: Option<usize>,
        factory: impl Fn() -> T + 'static,
    ) -> Self {
        let mut pool = Self {
            name,
            slots: Vec::with_capacity(initial),
            free: VecDeque::with_capacity(initial),
            capacity,
            factory: Box::new(factory),
        };
        let warm = capacity.map_or(initial, |cap| initial.min(cap));
        for _ in 0..warm {
            pool.create_slot();
        }
        pool
    }

    fn create_slot(&mut self) -> u32 {
        let index = self.slots.len() as u32;
        let mut item = (self.factory)();
        item.on_created();
        self.slots.push(Slot {
            item,
            generation: 0,
            active: false,
        });
        self.free.push_back(index);
        index
    }

    /// Hand out a free entity, growing the pool if allowed
    pub fn acquire(&mut self) -> Result<PoolHandle, SimError> {
        if self.free.is_empty() {
            if let Some(cap) = self.capacity {
                if self.slots.len() >= cap {
                    return Err(SimError::PoolExhausted {
                        pool: self.name,
                        capacity: cap,
                    });
                }
            }
            log::debug!("pool '{}' growing to {}", self.name, self.slots.len() + 1);
            self.create_slot();
        }

        let Some(index) = self.free.pop_front() else {
            return Err(SimError::PoolExhausted {
                pool: self.name,
                capacity: self.slots.len(),
            });
        };
        let slot = &mut self.slots[index as usize];
        slot.active = true;
        slot.item.on_acquire();
        Ok(PoolHandle::new(index, slot.generation))
    }

    /// Return an entity to the pool
    ///
    /// Stale or unknown handles, entities that are already free, and entities
    /// that veto the release are ignored and return `false`.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return false;
        };
        if !slot.active || slot.generation != handle.generation {
            return false;
        }
        if !slot.item.can_release() {
            return false;
        }
        slot.item.on_release();
        slot.active = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push_back(handle.index);
        true
    }

    /// Release every active entity (vetoes still apply)
    pub fn release_all(&mut self) -> usize {
        let handles: Vec<PoolHandle> = self.active_handles().collect();
        handles.into_iter().filter(|&h| self.release(h)).count()
    }

    pub fn is_alive(&self, handle: PoolHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .is_some_and(|s| s.active && s.generation == handle.generation)
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.active && s.generation == handle.generation)
            .map(|s| &s.item)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.active && s.generation == handle.generation)
            .map(|s| &mut s.item)
    }

    /// Handles of all active entities, in slot order
    pub fn active_handles(&self) -> impl Iterator<Item = PoolHandle> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, s)| PoolHandle::new(i as u32, s.generation))
    }

    /// Active entities with their handles, in slot order
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, s)| (PoolHandle::new(i as u32, s.generation), &s.item))
    }

    pub fn active_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn available_count(&self) -> usize {
        self.free.len()
    }

    /// Total slots ever created
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> fmt::Debug for EntityPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityPool")
            .field("name", &self.name)
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

//! Reachability-aware stochastic platform placement
//!
//! Given a target height and the registry, the planner picks a width, works
//! out which X positions are both on screen and within jumping distance of a
//! platform below, then draws candidates until one clears its neighbours.
//! First valid candidate wins.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::registry::{Footprint, PlatformRegistry};
use crate::consts::*;
use crate::error::SimError;

/// Tunables for a placement query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConstraints {
    pub min_width: f32,
    pub max_width: f32,
    /// Furthest horizontal distance a jump can cover
    pub max_horizontal_jump: f32,
    /// Highest rise a jump can cover
    pub max_vertical_jump: f32,
    pub screen_half_width: f32,
    pub margin: f32,
    /// Minimum horizontal gap between platforms on the same level
    pub min_spacing: f32,
    /// Platforms closer than this in Y are checked for overlap
    pub vertical_check_range: f32,
    pub max_attempts: u32,
}

impl Default for PlacementConstraints {
    fn default() -> Self {
        Self {
            min_width: 1.2,
            max_width: 2.4,
            max_horizontal_jump: 2.0,
            max_vertical_jump: 5.0,
            screen_half_width: CAMERA_SIZE * DEFAULT_ASPECT,
            margin: SCREEN_MARGIN,
            min_spacing: PLATFORM_SPACING,
            vertical_check_range: 2.0 * SAME_HORIZONTAL_LEVEL_TOLERANCE,
            max_attempts: MAX_PLACEMENT_ATTEMPTS,
        }
    }
}

impl PlacementConstraints {
    /// Reject tunables that could only ever produce invalid platforms
    pub fn validate(&self) -> Result<(), SimError> {
        let finite = [
            self.min_width,
            self.max_width,
            self.max_horizontal_jump,
            self.max_vertical_jump,
            self.screen_half_width,
            self.margin,
            self.min_spacing,
            self.vertical_check_range,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(SimError::InvariantViolation("non-finite placement constraint".into()));
        }
        if self.min_width <= 0.0 || self.max_width < self.min_width {
            return Err(SimError::InvariantViolation(format!(
                "platform width range [{}, {}] is invalid",
                self.min_width, self.max_width
            )));
        }
        if self.screen_half_width - self.margin <= 0.0 {
            return Err(SimError::InvariantViolation(format!(
                "screen half width {} leaves no room inside margin {}",
                self.screen_half_width, self.margin
            )));
        }
        Ok(())
    }

    /// Largest half width that still fits inside the margins
    #[inline]
    pub fn max_half_width(&self) -> f32 {
        self.screen_half_width - self.margin
    }
}

/// How a slot relates to the platforms below it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotOrigin {
    /// First platform of a run, placed under the player
    Seed,
    /// Within jump range of at least one platform below
    Reachable,
    /// Reachability was dropped (no reference below, or none in range)
    Unconstrained,
}

/// Candidate platform position, never stored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementSlot {
    pub x: f32,
    pub y: f32,
    pub half_width: f32,
    pub origin: SlotOrigin,
}

impl PlacementSlot {
    #[inline]
    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.x, self.y, self.half_width)
    }
}

/// Placement queries against a read-only registry
#[derive(Debug, Clone)]
pub struct PlacementPlanner {
    constraints: PlacementConstraints,
}

impl PlacementPlanner {
    pub fn new(constraints: PlacementConstraints) -> Self {
        debug_assert!(constraints.validate().is_ok(), "{:?}", constraints.validate());
        Self { constraints }
    }

    pub fn constraints(&self) -> &PlacementConstraints {
        &self.constraints
    }

    /// Track a changed viewport
    pub fn set_screen_half_width(&mut self, half_width: f32) {
        if half_width.is_finite() && half_width > self.constraints.margin {
            self.constraints.screen_half_width = half_width;
        } else {
            log::warn!("ignoring unusable screen half width {half_width}");
        }
    }

    /// Find one slot at `target_y`, or `None` when every attempt collided
    pub fn find_slot_at_height<R: Rng + ?Sized>(
        &self,
        target_y: f32,
        registry: &PlatformRegistry,
        rng: &mut R,
    ) -> Option<PlacementSlot> {
        self.find_slot_avoiding(target_y, registry, &[], rng)
    }

    /// Anchor slot plus up to `count - 1` extra slots on the same level
    ///
    /// Empty when the anchor cannot be placed; otherwise as many as fit.
    pub fn find_multi_slot_level<R: Rng + ?Sized>(
        &self,
        target_y: f32,
        count: usize,
        registry: &PlatformRegistry,
        rng: &mut R,
    ) -> Vec<PlacementSlot> {
        let Some(anchor) = self.find_slot_at_height(target_y, registry, rng) else {
            return Vec::new();
        };

        let mut slots = Vec::with_capacity(count.max(1));
        slots.push(anchor);
        for _ in 1..count {
            let extra = self
                .find_slot_avoiding(target_y, registry, &slots, rng)
                .or_else(|| self.find_slot_anywhere(target_y, registry, &slots, rng));
            match extra {
                Some(slot) => slots.push(slot),
                // Level is full
                None => break,
            }
        }
        slots
    }

    fn find_slot_avoiding<R: Rng + ?Sized>(
        &self,
        target_y: f32,
        registry: &PlatformRegistry,
        placed: &[PlacementSlot],
        rng: &mut R,
    ) -> Option<PlacementSlot> {
        if !target_y.is_finite() {
            debug_assert!(false, "non-finite placement height");
            return None;
        }
        let c = &self.constraints;
        let (half_width, min_x, max_x) = self.safe_range(self.pick_half_width(rng)?)?;

        let mut has_reference = false;
        let mut intervals = Vec::new();
        for (_, reference) in registry.below_within(target_y, c.max_vertical_jump) {
            has_reference = true;
            let lo = min_x.max(reference.x - c.max_horizontal_jump);
            let hi = max_x.min(reference.x + c.max_horizontal_jump);
            if lo <= hi {
                intervals.push((lo, hi));
            }
        }
        let intervals = merge_intervals(intervals);

        let (intervals, origin) = if intervals.is_empty() {
            if has_reference {
                log::warn!("y={target_y:.2}: no reachable x inside the screen, placing unconstrained");
            } else {
                log::debug!("y={target_y:.2}: no reference platform below, placing unconstrained");
            }
            (vec![(min_x, max_x)], SlotOrigin::Unconstrained)
        } else {
            (intervals, SlotOrigin::Reachable)
        };

        self.draw(target_y, half_width, &intervals, origin, registry, placed, rng)
    }

    /// Unconstrained draw over the whole safe range, used to fill out a level
    fn find_slot_anywhere<R: Rng + ?Sized>(
        &self,
        target_y: f32,
        registry: &PlatformRegistry,
        placed: &[PlacementSlot],
        rng: &mut R,
    ) -> Option<PlacementSlot> {
        let (half_width, min_x, max_x) = self.safe_range(self.pick_half_width(rng)?)?;
        let mut slot = self.draw(
            target_y,
            half_width,
            &[(min_x, max_x)],
            SlotOrigin::Unconstrained,
            registry,
            placed,
            rng,
        )?;
        if self.is_reachable(&slot, registry) {
            slot.origin = SlotOrigin::Reachable;
        }
        Some(slot)
    }

    #[allow(clippy::too_many_arguments)]
    fn draw<R: Rng + ?Sized>(
        &self,
        target_y: f32,
        half_width: f32,
        intervals: &[(f32, f32)],
        origin: SlotOrigin,
        registry: &PlatformRegistry,
        placed: &[PlacementSlot],
        rng: &mut R,
    ) -> Option<PlacementSlot> {
        for _ in 0..self.constraints.max_attempts {
            let slot = PlacementSlot {
                x: sample_intervals(intervals, rng),
                y: target_y,
                half_width,
                origin,
            };
            if self.is_clear(&slot, registry, placed) {
                return Some(slot);
            }
        }
        None
    }

    fn pick_half_width<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<f32> {
        let c = &self.constraints;
        let (lo, hi) = (c.min_width.min(c.max_width), c.max_width.max(c.min_width));
        if !(lo > 0.0) || !hi.is_finite() {
            debug_assert!(false, "invalid width range [{lo}, {hi}]");
            return None;
        }
        let width = if hi > lo { rng.random_range(lo..=hi) } else { lo };
        Some(width * 0.5)
    }

    /// On-screen range for a platform centre, shrinking the platform if it cannot fit
    ///
    /// Returns `(half_width, min_x, max_x)`.
    fn safe_range(&self, half_width: f32) -> Option<(f32, f32, f32)> {
        let limit = self.constraints.max_half_width();
        if !(limit > 0.0) {
            debug_assert!(false, "screen too narrow for any platform");
            return None;
        }
        let half_width = half_width.min(limit);
        Some((half_width, -limit + half_width, limit - half_width))
    }

    fn is_clear(&self, slot: &PlacementSlot, registry: &PlatformRegistry, placed: &[PlacementSlot]) -> bool {
        let c = &self.constraints;
        let candidate = slot.footprint();
        let blocks = |other: &Footprint| {
            (other.y - candidate.y).abs() < c.vertical_check_range
                && candidate.overlaps_horizontally(other, c.min_spacing)
        };
        !registry.iter().any(|(_, fp)| blocks(fp)) && !placed.iter().any(|s| blocks(&s.footprint()))
    }

    fn is_reachable(&self, slot: &PlacementSlot, registry: &PlatformRegistry) -> bool {
        let c = &self.constraints;
        registry
            .below_within(slot.y, c.max_vertical_jump)
            .any(|(_, fp)| (fp.x - slot.x).abs() <= c.max_horizontal_jump)
    }
}

/// Sort and merge overlapping closed intervals
fn merge_intervals(mut intervals: Vec<(f32, f32)>) -> Vec<(f32, f32)> {
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<(f32, f32)> = Vec::with_capacity(intervals.len());
    for (lo, hi) in intervals {
        match merged.last_mut() {
            Some(last) if lo <= last.1 => last.1 = last.1.max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

/// Uniform draw over a union of disjoint intervals
fn sample_intervals<R: Rng + ?Sized>(intervals: &[(f32, f32)], rng: &mut R) -> f32 {
    let total: f32 = intervals.iter().map(|(lo, hi)| hi - lo).sum();
    if total <= 0.0 {
        // Only single points left
        let i = rng.random_range(0..intervals.len());
        return intervals[i].0;
    }
    let mut t = rng.random::<f32>() * total;
    for &(lo, hi) in intervals {
        let len = hi - lo;
        if t <= len {
            return (lo + t).min(hi);
        }
        t -= len;
    }
    intervals[intervals.len() - 1].1
}

//! Registry of active platforms and the spatial queries placement needs
//!
//! The registry never owns platforms - the pool does. It keeps a footprint
//! snapshot per handle, refreshed whenever a platform moves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::pool::PoolHandle;

/// Horizontal extent of a platform at a given height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub x: f32,
    pub y: f32,
    pub half_width: f32,
}

impl Footprint {
    pub fn new(x: f32, y: f32, half_width: f32) -> Self {
        Self { x, y, half_width }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x - self.half_width
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.half_width
    }

    /// Whether two footprints come closer than `spacing` horizontally
    #[inline]
    pub fn overlaps_horizontally(&self, other: &Footprint, spacing: f32) -> bool {
        self.left() < other.right() + spacing && other.left() < self.right() + spacing
    }
}

/// Set of active platforms keyed by pool handle
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    entries: BTreeMap<PoolHandle, Footprint>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: PoolHandle, footprint: Footprint) {
        self.entries.insert(id, footprint);
    }

    pub fn remove(&mut self, id: PoolHandle) -> Option<Footprint> {
        self.entries.remove(&id)
    }

    /// Refresh a footprint after the platform moved; unknown ids are ignored
    pub fn update(&mut self, id: PoolHandle, footprint: Footprint) {
        if let Some(entry) = self.entries.get_mut(&id) {
            *entry = footprint;
        }
    }

    pub fn get(&self, id: PoolHandle) -> Option<&Footprint> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: PoolHandle) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &Footprint)> + '_ {
        self.entries.iter().map(|(id, fp)| (*id, fp))
    }

    /// Platforms with `min_y <= y <= max_y`
    pub fn within_y_band(
        &self,
        min_y: f32,
        max_y: f32,
    ) -> impl Iterator<Item = (PoolHandle, &Footprint)> + '_ {
        self.iter().filter(move |(_, fp)| fp.y >= min_y && fp.y <= max_y)
    }

    /// Platforms whose centre lies in `min_x <= x <= max_x`
    pub fn within_x_range(
        &self,
        min_x: f32,
        max_x: f32,
    ) -> impl Iterator<Item = (PoolHandle, &Footprint)> + '_ {
        self.iter().filter(move |(_, fp)| fp.x >= min_x && fp.x <= max_x)
    }

    /// Reference platforms for a jump to `target_y`: strictly below, at most `max_rise` down
    pub fn below_within(
        &self,
        target_y: f32,
        max_rise: f32,
    ) -> impl Iterator<Item = (PoolHandle, &Footprint)> + '_ {
        self.iter().filter(move |(_, fp)| {
            let rise = target_y - fp.y;
            rise > 0.0 && rise <= max_rise
        })
    }

    /// Platforms other than `id` on the level at `y` (|dy| <= tolerance)
    pub fn same_level_neighbors(
        &self,
        id: PoolHandle,
        y: f32,
        tolerance: f32,
    ) -> impl Iterator<Item = (PoolHandle, &Footprint)> + '_ {
        self.iter()
            .filter(move |(other, fp)| *other != id && (fp.y - y).abs() <= tolerance)
    }

    pub fn highest_y(&self) -> Option<f32> {
        self.entries.values().map(|fp| fp.y).reduce(f32::max)
    }

    pub fn lowest_y(&self) -> Option<f32> {
        self.entries.values().map(|fp| fp.y).reduce(f32::min)
    }

    /// Handles of platforms strictly below `y`
    pub fn below(&self, y: f32) -> Vec<PoolHandle> {
        self.iter()
            .filter(|(_, fp)| fp.y < y)
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(footprints: &[(f32, f32, f32)]) -> (PlatformRegistry, Vec<PoolHandle>) {
        let mut reg = PlatformRegistry::new();
        let ids: Vec<_> = footprints
            .iter()
            .enumerate()
            .map(|(i, &(x, y, hw))| {
                let id = PoolHandle::new(i as u32, 0);
                reg.insert(id, Footprint::new(x, y, hw));
                id
            })
            .collect();
        (reg, ids)
    }

    #[test]
    fn test_footprint_edges_and_spacing() {
        let a = Footprint::new(0.0, 1.0, 1.0);
        let b = Footprint::new(2.4, 1.0, 1.0);
        assert_eq!((a.left(), a.right()), (-1.0, 1.0));
        assert!(!a.overlaps_horizontally(&b, 0.3));
        assert!(a.overlaps_horizontally(&b, 0.5));
        assert!(b.overlaps_horizontally(&a, 0.5));
        assert!(a.overlaps_horizontally(&Footprint::new(0.5, 1.0, 0.2), 0.0));
    }

    #[test]
    fn test_band_queries() {
        let (reg, ids) = registry_with(&[(0.0, 0.0, 1.0), (2.0, 3.0, 1.0), (-2.0, 6.0, 1.0)]);
        let band: Vec<_> = reg.within_y_band(2.0, 6.0).map(|(id, _)| id).collect();
        assert_eq!(band, vec![ids[1], ids[2]]);

        let xs: Vec<_> = reg.within_x_range(-0.5, 2.5).map(|(id, _)| id).collect();
        assert_eq!(xs, vec![ids[0], ids[1]]);

        assert_eq!(reg.highest_y(), Some(6.0));
        assert_eq!(reg.lowest_y(), Some(0.0));
    }

    #[test]
    fn test_below_within_is_strict() {
        let (reg, ids) = registry_with(&[(0.0, 0.0, 1.0), (0.0, 4.0, 1.0), (0.0, 5.0, 1.0)]);
        let refs: Vec<_> = reg.below_within(5.0, 5.0).map(|(id, _)| id).collect();
        assert_eq!(refs, vec![ids[0], ids[1]], "same-height platform is not a reference");
        let refs: Vec<_> = reg.below_within(5.0, 1.0).map(|(id, _)| id).collect();
        assert_eq!(refs, vec![ids[1]]);
    }

    #[test]
    fn test_same_level_neighbors() {
        let (reg, ids) = registry_with(&[(0.0, 10.0, 1.0), (3.0, 10.3, 1.0), (0.0, 12.0, 1.0)]);
        let n: Vec<_> = reg.same_level_neighbors(ids[0], 10.0, 0.5).map(|(id, _)| id).collect();
        assert_eq!(n, vec![ids[1]]);
        let n: Vec<_> = reg.same_level_neighbors(ids[2], 12.0, 0.5).collect();
        assert!(n.is_empty());
    }

    #[test]
    fn test_update_and_below() {
        let (mut reg, ids) = registry_with(&[(0.0, 70.0, 1.0), (0.0, 85.0, 1.0)]);
        reg.update(ids[0], Footprint::new(1.0, 79.9, 1.0));
        assert_eq!(reg.get(ids[0]).unwrap().x, 1.0);
        assert_eq!(reg.below(80.0), vec![ids[0]]);
        reg.update(PoolHandle::new(9, 0), Footprint::new(0.0, 0.0, 1.0));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_empty_extremes() {
        let reg = PlatformRegistry::new();
        assert!(reg.highest_y().is_none());
        assert!(reg.lowest_y().is_none());
    }
}

//! Platform presets: a colour plus a behavior list, picked by weight

use glam::Vec4;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::behavior::{
    BehaviorSpec, BounceConfig, Condition, CrumbleConfig, FragileConfig, MovingConfig,
    SpawnConfig, StickyConfig,
};
use super::children::ChildKind;
use crate::consts::SAME_HORIZONTAL_LEVEL_TOLERANCE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformPreset {
    pub name: String,
    pub color: Vec4,
    /// Relative likelihood; zero or negative never spawns
    pub spawn_weight: f32,
    #[serde(default)]
    pub behaviors: Vec<BehaviorSpec>,
}

impl PlatformPreset {
    pub fn new(name: &str, color: Vec4, spawn_weight: f32, behaviors: Vec<BehaviorSpec>) -> Self {
        Self {
            name: name.to_string(),
            color,
            spawn_weight,
            behaviors,
        }
    }

    /// Whether any behavior can hurt or drop the player
    pub fn is_hazard(&self) -> bool {
        self.behaviors.iter().any(|b| {
            matches!(b, BehaviorSpec::Fragile(_) | BehaviorSpec::Crumble(_))
                || matches!(b, BehaviorSpec::SpawnChild(c) if c.kind == ChildKind::Enemy)
        })
    }
}

/// Built-in catalogue
pub fn default_catalog() -> Vec<PlatformPreset> {
    let coin = |chance| {
        BehaviorSpec::SpawnChild(SpawnConfig {
            kind: ChildKind::Coin,
            chance,
            height: None,
        })
    };
    vec![
        PlatformPreset::new(
            "normal",
            Vec4::new(0.45, 0.75, 0.45, 1.0),
            10.0,
            vec![coin(0.3)],
        ),
        PlatformPreset::new(
            "bouncy",
            Vec4::new(0.35, 0.6, 1.0, 1.0),
            2.0,
            vec![BehaviorSpec::Bounce(BounceConfig::default())],
        ),
        PlatformPreset::new(
            "fragile",
            Vec4::new(0.85, 0.55, 0.3, 1.0),
            2.0,
            vec![BehaviorSpec::Fragile(FragileConfig::default())],
        ),
        PlatformPreset::new(
            "crumbling",
            Vec4::new(0.6, 0.5, 0.4, 1.0),
            1.5,
            vec![BehaviorSpec::Crumble(CrumbleConfig::default())],
        ),
        PlatformPreset::new(
            "sticky",
            Vec4::new(0.7, 0.4, 0.8, 1.0),
            1.5,
            vec![BehaviorSpec::Sticky(StickyConfig::default()), coin(0.5)],
        ),
        PlatformPreset::new(
            "drifting",
            Vec4::new(0.95, 0.9, 0.4, 1.0),
            2.0,
            vec![BehaviorSpec::Conditional {
                condition: Condition::HorizontallyIsolated {
                    tolerance: SAME_HORIZONTAL_LEVEL_TOLERANCE,
                },
                behavior: Box::new(BehaviorSpec::Moving(MovingConfig::default())),
            }],
        ),
        PlatformPreset::new(
            "guarded",
            Vec4::new(0.9, 0.3, 0.3, 1.0),
            1.0,
            vec![
                BehaviorSpec::SpawnChild(SpawnConfig {
                    kind: ChildKind::Enemy,
                    chance: 1.0,
                    height: None,
                }),
                coin(1.0),
            ],
        ),
    ]
}

/// Weighted pick; `None` when nothing has positive weight
pub fn pick_weighted<R: Rng + ?Sized>(presets: &[PlatformPreset], rng: &mut R) -> Option<usize> {
    let total: f32 = presets.iter().map(|p| p.spawn_weight.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let mut roll = rng.random_range(0.0..total);
    let mut last = None;
    for (i, preset) in presets.iter().enumerate() {
        let weight = preset.spawn_weight.max(0.0);
        if weight <= 0.0 {
            continue;
        }
        if roll < weight {
            return Some(i);
        }
        roll -= weight;
        last = Some(i);
    }
    // Float drift past the final bucket
    last
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_zero_weight_never_picked() {
        let presets = vec![
            PlatformPreset::new("a", Vec4::ONE, 0.0, vec![]),
            PlatformPreset::new("b", Vec4::ONE, 1.0, vec![]),
            PlatformPreset::new("c", Vec4::ONE, -3.0, vec![]),
        ];
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..200 {
            assert_eq!(pick_weighted(&presets, &mut rng), Some(1));
        }
    }

    #[test]
    fn test_empty_or_weightless_catalog() {
        let mut rng = Pcg32::seed_from_u64(5);
        assert_eq!(pick_weighted(&[], &mut rng), None);
        let dead = vec![PlatformPreset::new("a", Vec4::ONE, 0.0, vec![])];
        assert_eq!(pick_weighted(&dead, &mut rng), None);
    }

    #[test]
    fn test_weights_shape_distribution() {
        let presets = vec![
            PlatformPreset::new("common", Vec4::ONE, 9.0, vec![]),
            PlatformPreset::new("rare", Vec4::ONE, 1.0, vec![]),
        ];
        let mut rng = Pcg32::seed_from_u64(77);
        let rare = (0..5000)
            .filter(|_| pick_weighted(&presets, &mut rng) == Some(1))
            .count();
        assert!((300..700).contains(&rare), "rare picked {rare} times");
    }

    #[test]
    fn test_catalog_roundtrips_and_flags_hazards() {
        let catalog = default_catalog();
        let json = serde_json::to_string_pretty(&catalog).unwrap();
        let back: Vec<PlatformPreset> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
        let hazards: Vec<_> = catalog.iter().filter(|p| p.is_hazard()).map(|p| p.name.as_str()).collect();
        assert_eq!(hazards, vec!["fragile", "crumbling", "guarded"]);
    }
}

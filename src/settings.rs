//! Tuning and preferences
//!
//! Everything the simulation reads at start-up: viewport, placement and
//! generation tunables, pool sizes and the platform catalogue. Stored as JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SettingsError, SimError};
use crate::sim::generator::GeneratorConfig;
use crate::sim::planner::PlacementConstraints;
use crate::sim::preset::{PlatformPreset, default_catalog};
use crate::sim::scene::PoolSizes;
use crate::sim::screen::{ScreenBounds, Viewport};

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Scale applied to the spawn weight of presets that can hurt the player
    pub fn hazard_weight_scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.4,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 2.0,
        }
    }

    /// Vertical gap range between levels
    pub fn vertical_distance(&self) -> (f32, f32) {
        match self {
            Difficulty::Easy => (2.5, 4.0),
            Difficulty::Normal => (3.0, 5.0),
            Difficulty::Hard => (3.5, 5.0),
        }
    }

    /// Chance a level gets more than one platform
    pub fn multi_platform_chance(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.9,
            Difficulty::Normal => 0.8,
            Difficulty::Hard => 0.5,
        }
    }
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    pub viewport: Viewport,
    pub placement: PlacementConstraints,
    pub generator: GeneratorConfig,
    pub pools: PoolSizes,
    pub presets: Vec<PlatformPreset>,
}

impl Default for Settings {
    fn default() -> Self {
        let viewport = Viewport::default();
        let placement = PlacementConstraints {
            screen_half_width: viewport.half_width(),
            ..Default::default()
        };
        Self {
            difficulty: Difficulty::Normal,
            viewport,
            placement,
            generator: GeneratorConfig::default(),
            pools: PoolSizes::default(),
            presets: default_catalog(),
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset (applies preset defaults)
    pub fn from_preset(difficulty: Difficulty) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(difficulty);
        settings
    }

    /// Apply a difficulty preset on top of the default catalogue
    pub fn apply_preset(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        let (min, max) = difficulty.vertical_distance();
        self.generator.min_vertical_distance = min;
        self.generator.max_vertical_distance = max.min(self.placement.max_vertical_jump);
        self.generator.multi_platform_chance = difficulty.multi_platform_chance();

        let scale = difficulty.hazard_weight_scale();
        self.presets = default_catalog()
            .into_iter()
            .map(|mut preset| {
                if preset.is_hazard() {
                    preset.spawn_weight *= scale;
                }
                preset
            })
            .collect();
    }

    /// Check that the tunables can produce a playable run
    pub fn validate(&self) -> Result<(), SimError> {
        self.placement.validate()?;
        self.generator.validate()?;
        if self.generator.min_vertical_distance > self.placement.max_vertical_jump {
            return Err(SimError::InvariantViolation(format!(
                "smallest level gap {} exceeds the highest jump {}",
                self.generator.min_vertical_distance, self.placement.max_vertical_jump
            )));
        }
        if self.placement.vertical_check_range > self.generator.min_vertical_distance {
            log::warn!(
                "vertical check range {} spans more than one level gap; reachable slots may be rejected",
                self.placement.vertical_check_range
            );
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read settings from a JSON file
    pub fn try_load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults when the file is missing,
    /// unreadable or describes an unplayable configuration
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => match settings.validate() {
                Ok(()) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Rejected settings from {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                log::info!("Using default settings ({e})");
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_names() {
        for d in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            assert_eq!(Difficulty::from_str(d.as_str()), Some(d));
        }
        assert_eq!(Difficulty::from_str("NORM"), Some(Difficulty::Normal));
        assert_eq!(Difficulty::from_str("brutal"), None);
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
        for d in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            assert!(Settings::from_preset(d).validate().is_ok(), "{d:?}");
        }
    }

    #[test]
    fn test_hard_weights_hazards_up() {
        let normal = Settings::from_preset(Difficulty::Normal);
        let hard = Settings::from_preset(Difficulty::Hard);
        let weight = |s: &Settings, name: &str| {
            s.presets.iter().find(|p| p.name == name).unwrap().spawn_weight
        };
        assert_eq!(weight(&hard, "fragile"), weight(&normal, "fragile") * 2.0);
        assert_eq!(weight(&hard, "bouncy"), weight(&normal, "bouncy"));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{ "generator": { "platforms_ahead": 4 } }"#).unwrap();
        assert_eq!(settings.generator.platforms_ahead, 4);
        assert_eq!(settings.generator.max_vertical_distance, 5.0);
        assert_eq!(settings.presets, default_catalog());
    }

    #[test]
    fn test_save_load_file() {
        let path = std::env::temp_dir().join(format!("sky-climber-settings-{}.json", std::process::id()));
        let settings = Settings::from_preset(Difficulty::Easy);
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_or_invalid_file_falls_back() {
        let missing = std::env::temp_dir().join("sky-climber-does-not-exist.json");
        assert_eq!(Settings::load(&missing), Settings::default());
        assert!(matches!(Settings::try_load(&missing), Err(SettingsError::Io(_))));
        assert!(matches!(Settings::from_json("{ nope"), Err(SettingsError::Parse(_))));
    }
}

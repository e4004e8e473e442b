//! Game settings and preferences
//!
//! Persisted separately from high scores in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::platform;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    /// Maximum particles drawn for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 192,
            QualityPreset::Medium => 512,
            QualityPreset::High => 1024,
        }
    }

    /// Raymarch steps per pixel in the shape shader
    pub fn march_steps(&self) -> u32 {
        match self {
            QualityPreset::Low => 48,
            QualityPreset::Medium => 72,
            QualityPreset::High => 110,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Trails behind flying shapes
    pub trails: bool,
    /// Explosion and trail particles
    pub particles: bool,

    // === HUD ===
    /// Show frame rate and node counts
    pub show_stats: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Mute when window loses focus
    pub mute_on_blur: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            trails: true,
            particles: true,
            show_stats: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            mute_on_blur: true,
        }
    }
}

impl Settings {
    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;

        // Low preset drops trails, which dominate the particle count
        if preset == QualityPreset::Low {
            self.trails = false;
        }
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "geometry_fighter_settings";

    /// Load settings, falling back to defaults
    pub fn load() -> Self {
        match platform::load_json(Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings");
                settings
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        if platform::save_json(Self::STORAGE_KEY, self) {
            log::info!("Settings saved");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particles_off_means_zero() {
        let mut settings = Settings::default();
        assert_eq!(settings.max_particles(), QualityPreset::Medium.max_particles());
        settings.particles = false;
        assert_eq!(settings.max_particles(), 0);
    }

    #[test]
    fn test_low_preset_drops_trails() {
        let mut settings = Settings {
            quality: QualityPreset::High,
            ..Settings::default()
        };
        assert!(settings.trails);
        settings.apply_preset(QualityPreset::Low);
        assert!(!settings.trails);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"quality":"High","show_stats":false}"#).expect("valid json");
        assert_eq!(settings.quality, QualityPreset::High);
        assert!(!settings.show_stats);
        assert!(settings.trails);
        assert_eq!(settings.master_volume, 0.8);
    }
}

//! JSON configuration parsing for headless mode
//!
//! Parses JSON skirmish configurations and folds them into [`SpawnSettings`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::battlefield::Zone;
use crate::settings::SpawnSettings;

/// Headless skirmish configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessSkirmishConfig {
    /// Global combatant cap (default: settings file or 30)
    #[serde(default)]
    pub max_combatants: Option<usize>,
    #[serde(default)]
    pub squad_size_min: Option<usize>,
    #[serde(default)]
    pub squad_size_max: Option<usize>,
    /// Seconds between reinforcement waves (clamped to at least 5)
    #[serde(default)]
    pub reinforcement_interval_secs: Option<f32>,
    /// Deploy a player-controlled US squad at the start
    #[serde(default)]
    pub create_player_squad: bool,
    /// Average casualties inflicted per second across the whole battlefield
    #[serde(default = "default_casualty_rate")]
    pub casualty_rate_per_sec: f32,
    /// Maximum skirmish duration in seconds (default: 120)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Random seed for deterministic skirmish reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Capture zones; none means legacy base positions
    #[serde(default)]
    pub zones: Vec<Zone>,
    /// Custom output path for the skirmish result (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// RON spawn settings applied before the overrides above
    #[serde(default)]
    pub settings_path: Option<String>,
}

fn default_casualty_rate() -> f32 {
    0.5
}

fn default_max_duration() -> f32 {
    120.0
}

impl Default for HeadlessSkirmishConfig {
    fn default() -> Self {
        Self {
            max_combatants: None,
            squad_size_min: None,
            squad_size_max: None,
            reinforcement_interval_secs: None,
            create_player_squad: false,
            casualty_rate_per_sec: default_casualty_rate(),
            max_duration_secs: default_max_duration(),
            random_seed: None,
            zones: Vec::new(),
            output_path: None,
            settings_path: None,
        }
    }
}

impl HeadlessSkirmishConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: HeadlessSkirmishConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_combatants == Some(0) {
            return Err("max_combatants must be at least 1".to_string());
        }

        if let (Some(min), Some(max)) = (self.squad_size_min, self.squad_size_max) {
            if min > max {
                return Err(format!(
                    "squad_size_min {} is larger than squad_size_max {}",
                    min, max
                ));
            }
        }
        if self.squad_size_min == Some(0) || self.squad_size_max == Some(0) {
            return Err("squad sizes must be at least 1".to_string());
        }

        if let Some(interval) = self.reinforcement_interval_secs {
            if interval <= 0.0 {
                return Err("reinforcement_interval_secs must be positive".to_string());
            }
        }

        if self.casualty_rate_per_sec < 0.0 {
            return Err("casualty_rate_per_sec must not be negative".to_string());
        }

        // Validate max duration
        if self.max_duration_secs <= 0.0 {
            return Err("max_duration_secs must be positive".to_string());
        }

        for zone in &self.zones {
            if zone.radius <= 0.0 {
                return Err(format!("zone '{}' must have a positive radius", zone.id));
            }
        }

        Ok(())
    }

    /// Spawn settings for this skirmish: the settings file (if any) with this
    /// config's overrides applied.
    pub fn to_spawn_settings(&self) -> Result<SpawnSettings, String> {
        let mut settings = match &self.settings_path {
            Some(path) => SpawnSettings::load_from_file(Path::new(path))?,
            None => SpawnSettings::default(),
        };

        if let Some(max) = self.max_combatants {
            settings.max_combatants = max;
        }
        if let Some(min) = self.squad_size_min {
            settings.squad_size_min = min;
        }
        if let Some(max) = self.squad_size_max {
            settings.squad_size_max = max;
        }
        if let Some(interval) = self.reinforcement_interval_secs {
            settings.reinforcement_interval = interval;
        }

        settings.validate();
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_json_uses_defaults() {
        let config: HeadlessSkirmishConfig = serde_json::from_str("{}").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_duration_secs, 120.0);
        assert!(!config.create_player_squad);

        let settings = config.to_spawn_settings().unwrap();
        assert_eq!(settings, SpawnSettings::default());
    }

    #[test]
    fn test_overrides_are_applied_and_clamped() {
        let config = HeadlessSkirmishConfig {
            max_combatants: Some(12),
            reinforcement_interval_secs: Some(2.0),
            ..Default::default()
        };
        let settings = config.to_spawn_settings().unwrap();
        assert_eq!(settings.max_combatants, 12);
        assert_eq!(settings.reinforcement_interval, 5.0);
    }

    #[test]
    fn test_inverted_squad_sizes_are_rejected() {
        let config = HeadlessSkirmishConfig {
            squad_size_min: Some(6),
            squad_size_max: Some(3),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("squad_size_min"));
    }

    #[test]
    fn test_missing_settings_file_is_an_error() {
        let config = HeadlessSkirmishConfig {
            settings_path: Some("/nonexistent/frontline.ron".to_string()),
            ..Default::default()
        };
        assert!(config.to_spawn_settings().unwrap_err().contains("Failed to read"));
    }
}

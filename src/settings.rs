//! Spawn settings
//!
//! Match-level tuning for the spawn systems. Defaults come from
//! [`crate::spawning::constants`]; a RON file can override any subset.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::spawning::constants::*;

/// Tunable spawn parameters
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    pub max_combatants: usize,
    pub squad_size_min: usize,
    pub squad_size_max: usize,
    /// Seconds between reinforcement waves (clamped to at least 5)
    pub reinforcement_interval: f32,
    /// Wall-clock seconds between maintenance passes
    pub maintenance_interval: f32,
    /// Seconds before a player-squad casualty rejoins
    pub respawn_delay: f32,
    pub initial_force_fraction: f32,
    pub progressive_spawn_interval_ms: f32,
    pub progressive_squad_fraction: f32,
    pub emergency_refill_living_fraction: f32,
    pub maintenance_squads: usize,
    pub emergency_squads: usize,
    pub rally_point_max_uses: u32,
    pub rally_point_lifetime: f32,
    pub rally_point_regeneration: f32,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            max_combatants: DEFAULT_MAX_COMBATANTS,
            squad_size_min: DEFAULT_SQUAD_SIZE_MIN,
            squad_size_max: DEFAULT_SQUAD_SIZE_MAX,
            reinforcement_interval: DEFAULT_REINFORCEMENT_INTERVAL,
            maintenance_interval: MAINTENANCE_INTERVAL,
            respawn_delay: RESPAWN_DELAY,
            initial_force_fraction: INITIAL_FORCE_FRACTION,
            progressive_spawn_interval_ms: PROGRESSIVE_SPAWN_INTERVAL_MS,
            progressive_squad_fraction: PROGRESSIVE_SQUAD_FRACTION,
            emergency_refill_living_fraction: EMERGENCY_REFILL_LIVING_FRACTION,
            maintenance_squads: MAINTENANCE_SQUADS,
            emergency_squads: EMERGENCY_SQUADS,
            rally_point_max_uses: RALLY_POINT_MAX_USES,
            rally_point_lifetime: RALLY_POINT_LIFETIME,
            rally_point_regeneration: RALLY_POINT_REGENERATION,
        }
    }
}

impl SpawnSettings {
    /// Load settings from a RON file and clamp them into range.
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

        let mut settings: SpawnSettings = ron::from_str(&contents)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

        settings.validate();
        info!("Loaded spawn settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub fn save_to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, contents)?;
        info!("Saved spawn settings to {:?}", path);
        Ok(())
    }

    /// Clamp conflicting values instead of rejecting them.
    pub fn validate(&mut self) {
        if self.squad_size_min == 0 {
            warn!("squad_size_min of 0 raised to 1");
            self.squad_size_min = 1;
        }
        if self.squad_size_max < self.squad_size_min {
            warn!(
                "squad_size_max {} below squad_size_min {}, swapping",
                self.squad_size_max, self.squad_size_min
            );
            std::mem::swap(&mut self.squad_size_min, &mut self.squad_size_max);
        }
        if self.reinforcement_interval < MIN_REINFORCEMENT_INTERVAL {
            warn!(
                "reinforcement_interval {:.1}s clamped to {:.1}s",
                self.reinforcement_interval, MIN_REINFORCEMENT_INTERVAL
            );
            self.reinforcement_interval = MIN_REINFORCEMENT_INTERVAL;
        }
        self.maintenance_interval = self.maintenance_interval.max(0.0);
        self.respawn_delay = self.respawn_delay.max(0.0);
        self.initial_force_fraction = self.initial_force_fraction.clamp(0.0, 1.0);
        self.progressive_squad_fraction = self.progressive_squad_fraction.clamp(0.0, 1.0);
        self.emergency_refill_living_fraction =
            self.emergency_refill_living_fraction.clamp(0.0, 1.0);
        self.rally_point_max_uses = self.rally_point_max_uses.max(1);
    }

    /// Per-side target strength.
    pub fn target_per_side(&self) -> usize {
        self.max_combatants / 2
    }

    pub fn average_squad_size(&self) -> f32 {
        (self.squad_size_min + self.squad_size_max) as f32 / 2.0
    }
}

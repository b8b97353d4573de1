//! Spawn Constants
//!
//! Centralized location for the tuning numbers used throughout the spawn
//! systems. Every value here is a default; [`SpawnSettings`](crate::settings::SpawnSettings)
//! can override them per match.

use bevy::prelude::*;

// ============================================================================
// Force Size
// ============================================================================

/// Global cap on simultaneously alive combatants, both sides together.
pub const DEFAULT_MAX_COMBATANTS: usize = 30;

/// Smallest squad fielded by waves and maintenance.
pub const DEFAULT_SQUAD_SIZE_MIN: usize = 3;

/// Largest squad fielded by waves and maintenance.
pub const DEFAULT_SQUAD_SIZE_MAX: usize = 6;

/// The player's own squad is always full strength.
pub const PLAYER_SQUAD_SIZE: usize = 6;

/// Share of per-side target strength deployed at match start.
pub const INITIAL_FORCE_FRACTION: f32 = 0.3;

// ============================================================================
// Timers
// ============================================================================

/// Seconds between reinforcement waves.
pub const DEFAULT_REINFORCEMENT_INTERVAL: f32 = 15.0;

/// Reinforcement intervals below this are clamped up to it.
pub const MIN_REINFORCEMENT_INTERVAL: f32 = 5.0;

/// Wall-clock seconds between force-strength maintenance passes.
pub const MAINTENANCE_INTERVAL: f32 = 3.0;

/// Seconds a dead player-squad member waits before rejoining.
pub const RESPAWN_DELAY: f32 = 5.0;

// ============================================================================
// Progressive Spawn Queue
// ============================================================================

/// Milliseconds between progressive (early-contact) spawns.
pub const PROGRESSIVE_SPAWN_INTERVAL_MS: f32 = 1000.0;

/// Progressive squads are this fraction of the average squad size.
pub const PROGRESSIVE_SQUAD_FRACTION: f32 = 0.6;

/// Progressive squads spawn this far from their base towards the enemy.
pub const PROGRESSIVE_FORWARD_DISTANCE: f32 = 40.0;

// ============================================================================
// Maintenance & Waves
// ============================================================================

/// Replacement squads per side in a normal maintenance pass.
pub const MAINTENANCE_SQUADS: usize = 2;

/// Replacement squads per side when an emergency refill triggers.
pub const EMERGENCY_SQUADS: usize = 3;

/// Emergency refill when living strength falls below this fraction of target
/// (equivalently, the shortfall exceeds 70% of target).
pub const EMERGENCY_REFILL_LIVING_FRACTION: f32 = 0.3;

/// Upper bound on squads in a single reinforcement wave.
pub const MAX_WAVE_SQUADS: usize = 3;

/// Random horizontal offset around a zone anchor for maintenance/wave squads.
pub const ANCHOR_SPREAD: f32 = 15.0;

// ============================================================================
// Placement
// ============================================================================

/// Distance between formation slots.
pub const FORMATION_SPACING: f32 = 4.0;

/// Slots per wedge row behind the leader.
pub const FORMATION_ROW_WIDTH: usize = 3;

/// Random sub-unit offset applied to each formation slot.
pub const FORMATION_JITTER: f32 = 0.5;

/// Minimum jitter around an HQ for initial deployment.
pub const HQ_JITTER_MIN: f32 = 20.0;

/// Maximum jitter around an HQ for initial deployment.
pub const HQ_JITTER_MAX: f32 = 40.0;

/// Player squad spawns this far behind the US base.
pub const PLAYER_SQUAD_OFFSET: Vec3 = Vec3::new(0.0, 0.0, -10.0);

/// Base positions used when the game mode defines no HQ zones.
pub const LEGACY_US_BASE: Vec3 = Vec3::new(0.0, 0.0, -50.0);
pub const LEGACY_OPFOR_BASE: Vec3 = Vec3::new(0.0, 0.0, 145.0);

/// Respawned squad members land this close to their spawn anchor.
pub const RESPAWN_SCATTER: f32 = 3.0;

// ============================================================================
// Squad Tactics
// ============================================================================

/// Default search radius for lower-threat approach positions.
pub const APPROACH_SEARCH_RADIUS: f32 = 50.0;

/// Squads smaller than this get no suppression/flank split.
pub const MIN_SUPPRESSION_SQUAD: usize = 3;

/// Flankers swing this far either side of the direct bearing.
pub const FLANK_ANGLE_DEGREES: f32 = 45.0;

pub const FLANK_DISTANCE_MIN: f32 = 20.0;
pub const FLANK_DISTANCE_MAX: f32 = 30.0;

// ============================================================================
// Rally Points
// ============================================================================

pub const RALLY_POINT_MAX_USES: u32 = 3;

/// Seconds an unused rally point stays up.
pub const RALLY_POINT_LIFETIME: f32 = 60.0;

/// Seconds before an exhausted rally point comes back.
pub const RALLY_POINT_REGENERATION: f32 = 30.0;

/// Rally points must sit within a friendly zone's radius plus this margin.
pub const RALLY_POINT_ZONE_MARGIN: f32 = 50.0;

// ============================================================================
// Telemetry
// ============================================================================

/// Entries the plugin's and the headless runner's spawn logs keep.
pub const SPAWN_LOG_CAPACITY: usize = 4096;

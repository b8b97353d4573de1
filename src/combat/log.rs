//! Spawn logging
//!
//! Records every lifecycle event (deployments, removals, respawns, waves) and
//! keeps running counters for post-match analysis. A `SpawnLog` is built by the
//! host and handed to the [`SpawnManager`](crate::spawning::SpawnManager); there
//! is no global instance.

use bevy::prelude::*;
use serde::Serialize;

/// A single entry in the spawn log
#[derive(Debug, Clone)]
pub struct SpawnLogEntry {
    /// Timestamp in match time (seconds since match start)
    pub timestamp: f32,
    /// The type of event
    pub event_type: SpawnLogEventType,
    /// Human-readable description of the event
    pub message: String,
}

/// Types of spawn log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnLogEventType {
    /// A squad entered the world
    SquadDeployed,
    /// A combatant was removed from the world
    CombatantRemoved,
    /// A respawn was scheduled for a player-squad member
    RespawnQueued,
    /// A squad member was reinstated
    Respawned,
    /// Interval-driven reinforcement wave
    ReinforcementWave,
    /// Force-strength top-up, including emergency refills
    Maintenance,
    /// Rally point placed, exhausted, regenerated or expired
    RallyPoint,
    /// A spawn was skipped because the world is full or the match is over
    SpawnWithheld,
    /// Match event (deployment, reseed, etc.)
    MatchEvent,
}

/// Running counters, cheap to copy out for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpawnMetrics {
    pub squads_deployed: u32,
    pub combatants_spawned: u32,
    pub combatants_removed: u32,
    pub respawns_queued: u32,
    pub respawns_completed: u32,
    pub reinforcement_waves: u32,
    pub progressive_spawns: u32,
    pub maintenance_squads: u32,
    pub emergency_refills: u32,
    pub rally_points_placed: u32,
    pub rally_point_uses: u32,
    pub spawns_withheld: u32,
}

/// The spawn log resource storing all events
#[derive(Resource, Default)]
pub struct SpawnLog {
    /// All log entries in chronological order
    pub entries: Vec<SpawnLogEntry>,
    /// Current match time
    pub match_time: f32,
    pub metrics: SpawnMetrics,
    /// Stop recording entries past this many (counters keep running). `None` = unbounded.
    pub capacity: Option<usize>,
}

impl SpawnLog {
    /// A log that keeps at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Default::default()
        }
    }

    /// Clear the log for a new match
    pub fn clear(&mut self) {
        self.entries.clear();
        self.match_time = 0.0;
        self.metrics = SpawnMetrics::default();
    }

    pub fn advance(&mut self, delta: f32) {
        self.match_time += delta;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: SpawnLogEventType, message: String) {
        if self.capacity.is_some_and(|cap| self.entries.len() >= cap) {
            return;
        }
        self.entries.push(SpawnLogEntry {
            timestamp: self.match_time,
            event_type,
            message,
        });
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: SpawnLogEventType) -> Vec<&SpawnLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Number of entries of the given type
    pub fn count(&self, event_type: SpawnLogEventType) -> usize {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&SpawnLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }
}

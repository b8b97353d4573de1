//! Combat system
//!
//! The slice of combat the spawn core cares about:
//! - Combatant records, factions and skill profiles
//! - Casualty and deployment events
//! - Spawn logging and metrics

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod log;
pub mod systems;

use events::*;
use systems::*;

/// Plugin for the combat system
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app
            // Combat events
            .add_event::<CasualtyEvent>()
            .add_event::<SquadDeployedEvent>()
            // Systems
            .add_systems(Update, (apply_casualties, announce_deployments).chain());
    }
}

//! Combat events
//!
//! Events exchanged between the host simulation and the spawn systems.

use bevy::prelude::*;

use super::components::{CombatantId, Faction, SquadId};

/// Fired by damage/ballistics when a combatant takes a lethal hit.
#[derive(Event, Debug, Clone, Copy)]
pub struct CasualtyEvent {
    /// Combatant that was hit
    pub victim: CombatantId,
    /// Combatant that fired the killing shot, if known
    pub killer: Option<CombatantId>,
}

/// Fired after the spawn systems deploy a new squad.
#[derive(Event, Debug, Clone, Copy)]
pub struct SquadDeployedEvent {
    pub squad: SquadId,
    pub faction: Faction,
    pub size: usize,
}

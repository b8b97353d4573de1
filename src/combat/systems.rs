//! Combat systems
//!
//! ECS systems that feed combat outcomes into the combatant roster.

use bevy::prelude::*;

use super::events::*;
use crate::spawning::Roster;

/// Mark the victims of casualty events dead.
///
/// Records stay in the roster until the next maintenance pass prunes them, so
/// squad bookkeeping and respawn queuing happen in one place.
pub fn apply_casualties(mut casualties: EventReader<CasualtyEvent>, mut roster: ResMut<Roster>) {
    for event in casualties.read() {
        let Some(victim) = roster.0.get_mut(&event.victim) else {
            debug!("Casualty {} not in roster", event.victim);
            continue;
        };
        if victim.is_dead() {
            continue;
        }
        victim.kill();
        match event.killer {
            Some(killer) => debug!("{} killed by {}", event.victim, killer),
            None => debug!("{} killed", event.victim),
        }
    }
}

/// Log squad deployments as they happen.
pub fn announce_deployments(mut deployed: EventReader<SquadDeployedEvent>) {
    for event in deployed.read() {
        debug!("{} ({}) deployed with {} members", event.squad, event.faction, event.size);
    }
}

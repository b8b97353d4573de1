//! Battlefield collaborators
//!
//! Narrow interfaces onto the systems the spawn core depends on but does not
//! own: spatial index, terrain, zone ownership, game mode / tickets, influence
//! map and the clock. Each has a small reference implementation so the core
//! can run headless.

pub mod clock;
pub mod spatial;
pub mod zones;

use bevy::prelude::*;

use crate::combat::components::{Combatant, CombatantId, CombatantStore, Faction};

pub use clock::{Clock, ManualClock, SystemClock};
pub use spatial::{GridSpatialIndex, SpatialStats};
pub use zones::{
    GameModeConfig, GamePhase, StaticTicketSystem, StaticZones, Zone, ZoneState,
};

/// Proximity index over combatant positions.
///
/// Implementations must accept ids they have never seen (removal of an
/// unknown id is a no-op).
pub trait SpatialIndex {
    fn update_position(&mut self, id: CombatantId, position: Vec3);
    fn remove(&mut self, id: CombatantId);
    fn query_radius(&self, position: Vec3, radius: f32) -> Vec<CombatantId>;
    fn clear(&mut self);
    fn stats(&self) -> SpatialStats;
}

/// Ground height lookup.
pub trait TerrainHeight {
    fn height_at(&self, x: f32, z: f32) -> f32;
}

impl<F> TerrainHeight for F
where
    F: Fn(f32, f32) -> f32,
{
    fn height_at(&self, x: f32, z: f32) -> f32 {
        self(x, z)
    }
}

/// Flat ground at a fixed height.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain(pub f32);

impl TerrainHeight for FlatTerrain {
    fn height_at(&self, _x: f32, _z: f32) -> f32 {
        self.0
    }
}

/// Zone / capture-point ownership.
pub trait ZoneProvider {
    fn zones(&self) -> &[Zone];
}

/// Game mode configuration and match phase.
pub trait TicketSystem {
    fn current_config(&self) -> GameModeConfig;
    fn game_phase(&self) -> GamePhase;
    fn is_game_active(&self) -> bool;
}

/// Optional threat/influence analysis used for objective selection.
pub trait InfluenceMap {
    /// Best contested or enemy-held zone for a squad standing at `position`.
    fn find_best_zone_target(&self, position: Vec3, faction: Faction) -> Option<Zone>;
    /// Lower-threat position within `radius` of `target`.
    fn find_best_position_near(&self, target: Vec3, radius: f32, faction: Faction) -> Option<Vec3>;
}

/// Everything the spawn core borrows from the host for one call.
pub struct Battlefield<'a> {
    pub combatants: &'a mut CombatantStore,
    pub spatial: &'a mut dyn SpatialIndex,
    pub terrain: &'a dyn TerrainHeight,
    pub zones: &'a dyn ZoneProvider,
    pub tickets: Option<&'a dyn TicketSystem>,
    pub influence: Option<&'a dyn InfluenceMap>,
}

impl<'a> Battlefield<'a> {
    pub fn new(
        combatants: &'a mut CombatantStore,
        spatial: &'a mut dyn SpatialIndex,
        terrain: &'a dyn TerrainHeight,
        zones: &'a dyn ZoneProvider,
    ) -> Self {
        Self {
            combatants,
            spatial,
            terrain,
            zones,
            tickets: None,
            influence: None,
        }
    }

    pub fn with_tickets(mut self, tickets: &'a dyn TicketSystem) -> Self {
        self.tickets = Some(tickets);
        self
    }

    pub fn with_influence(mut self, influence: &'a dyn InfluenceMap) -> Self {
        self.influence = Some(influence);
        self
    }

    /// False only when a ticket system is present and reports the match over.
    pub fn is_game_active(&self) -> bool {
        self.tickets.map_or(true, |t| t.is_game_active())
    }

    /// True when a ticket system is present and in the combat phase.
    pub fn in_combat_phase(&self) -> bool {
        self.tickets
            .is_some_and(|t| t.game_phase() == GamePhase::Combat)
    }

    pub fn mode_config(&self) -> Option<GameModeConfig> {
        self.tickets.map(|t| t.current_config())
    }

    /// Insert a combatant into the store and the spatial index.
    pub fn register(&mut self, combatant: Combatant) {
        self.spatial.update_position(combatant.id, combatant.position);
        self.combatants.insert(combatant.id, combatant);
    }

    /// Place a position on the ground.
    pub fn ground(&self, mut position: Vec3) -> Vec3 {
        position.y = self.terrain.height_at(position.x, position.z);
        position
    }
}

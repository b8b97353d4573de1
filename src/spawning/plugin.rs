//! Bevy integration for the spawn core
//!
//! The combatant store and the collaborators live in resources; each frame
//! [`drive_spawn_manager`] bundles them into a [`Battlefield`] and hands it to
//! the [`SpawnManager`].

use bevy::prelude::*;

use super::constants::SPAWN_LOG_CAPACITY;
use super::manager::SpawnManager;
use crate::battlefield::{
    Battlefield, FlatTerrain, GridSpatialIndex, InfluenceMap, SpatialIndex, StaticZones,
    SystemClock, TerrainHeight, TicketSystem, ZoneProvider,
};
use crate::combat::components::{CombatantStore, GameRng};
use crate::combat::events::SquadDeployedEvent;
use crate::combat::log::SpawnLog;
use crate::combat::systems::apply_casualties;
use crate::settings::SpawnSettings;

/// Every combatant record in the match.
#[derive(Resource, Default)]
pub struct Roster(pub CombatantStore);

/// The collaborators the spawn core borrows each frame.
#[derive(Resource)]
pub struct BattlefieldServices {
    pub spatial: Box<dyn SpatialIndex + Send + Sync>,
    pub terrain: Box<dyn TerrainHeight + Send + Sync>,
    pub zones: Box<dyn ZoneProvider + Send + Sync>,
    pub tickets: Option<Box<dyn TicketSystem + Send + Sync>>,
    pub influence: Option<Box<dyn InfluenceMap + Send + Sync>>,
}

impl Default for BattlefieldServices {
    fn default() -> Self {
        Self {
            spatial: Box::new(GridSpatialIndex::default()),
            terrain: Box::new(FlatTerrain(0.0)),
            zones: Box::new(StaticZones::default()),
            tickets: None,
            influence: None,
        }
    }
}

impl BattlefieldServices {
    pub fn battlefield<'a>(&'a mut self, combatants: &'a mut CombatantStore) -> Battlefield<'a> {
        let mut world = Battlefield::new(
            combatants,
            self.spatial.as_mut(),
            self.terrain.as_ref(),
            self.zones.as_ref(),
        );
        if let Some(tickets) = self.tickets.as_deref() {
            world = world.with_tickets(tickets);
        }
        if let Some(influence) = self.influence.as_deref() {
            world = world.with_influence(influence);
        }
        world
    }
}

/// Host switch forcing force-strength maintenance outside the combat phase.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct CombatEnabled(pub bool);

/// Startup options for the opening deployment.
#[derive(Resource, Debug, Clone, Copy)]
pub struct DeploymentOrders {
    pub create_player_squad: bool,
}

/// Plugin running the spawn core inside a Bevy app.
///
/// Hosts that need a custom clock, seed or log insert their own
/// [`SpawnManager`] before adding the plugin.
pub struct SpawnPlugin {
    pub settings: SpawnSettings,
    pub create_player_squad: bool,
}

impl Default for SpawnPlugin {
    fn default() -> Self {
        Self {
            settings: SpawnSettings::default(),
            create_player_squad: true,
        }
    }
}

impl Plugin for SpawnPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<SpawnManager>() {
            app.insert_resource(SpawnManager::new(
                self.settings.clone(),
                Box::new(SystemClock::new()),
                GameRng::from_entropy(),
                SpawnLog::with_capacity(SPAWN_LOG_CAPACITY),
            ));
        }

        app.add_event::<SquadDeployedEvent>()
            .init_resource::<Roster>()
            .init_resource::<BattlefieldServices>()
            .init_resource::<CombatEnabled>()
            .insert_resource(DeploymentOrders {
                create_player_squad: self.create_player_squad,
            })
            .add_systems(Startup, deploy_initial_forces)
            .add_systems(Update, drive_spawn_manager.after(apply_casualties));
    }
}

/// Opening deployment.
pub fn deploy_initial_forces(
    mut manager: ResMut<SpawnManager>,
    mut roster: ResMut<Roster>,
    mut services: ResMut<BattlefieldServices>,
    orders: Res<DeploymentOrders>,
    mut deployed: EventWriter<SquadDeployedEvent>,
) {
    let mut world = services.battlefield(&mut roster.0);
    if let Some(squad) = manager.spawn_initial_forces(&mut world, orders.create_player_squad) {
        info!("Player squad is {}", squad);
    }
    for event in manager.drain_deployments() {
        deployed.send(event);
    }
}

/// Advance the spawn timers by the frame's delta.
pub fn drive_spawn_manager(
    time: Res<Time>,
    mut manager: ResMut<SpawnManager>,
    mut roster: ResMut<Roster>,
    mut services: ResMut<BattlefieldServices>,
    combat: Res<CombatEnabled>,
    mut deployed: EventWriter<SquadDeployedEvent>,
) {
    let mut world = services.battlefield(&mut roster.0);
    manager.update(&mut world, time.delta_secs(), combat.0);
    for event in manager.drain_deployments() {
        deployed.send(event);
    }
}

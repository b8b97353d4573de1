//! Force registry
//!
//! The state every spawn path shares: the combatant factory, the squad
//! registry, rally points, the seeded RNG and the spawn log. Grouping them
//! lets the respawn manager and the orchestrator borrow all of it at once
//! while keeping their own timers separate.

use bevy::prelude::*;
use smallvec::SmallVec;

use super::constants::*;
use super::factory::CombatantFactory;
use super::rally::RallyPointSystem;
use super::squads::SquadManager;
use crate::battlefield::{Battlefield, Zone, ZoneState};
use crate::combat::components::{Faction, GameRng, Side, SquadId};
use crate::combat::events::SquadDeployedEvent;
use crate::combat::log::{SpawnLog, SpawnLogEventType};

pub struct Forces {
    pub factory: CombatantFactory,
    pub squads: SquadManager,
    pub rally_points: RallyPointSystem,
    pub rng: GameRng,
    pub log: SpawnLog,
    deployments: Vec<SquadDeployedEvent>,
}

impl Forces {
    pub fn new(rng: GameRng, log: SpawnLog, rally_points: RallyPointSystem) -> Self {
        Self {
            factory: CombatantFactory::new(),
            squads: SquadManager::new(),
            rally_points,
            rng,
            log,
            deployments: Vec::new(),
        }
    }

    /// Create a squad and put its members into the world.
    pub fn spawn_squad(
        &mut self,
        world: &mut Battlefield<'_>,
        faction: Faction,
        position: Vec3,
        size: usize,
    ) -> SquadId {
        let (squad_id, members) = self.squads.create_squad(
            &mut self.factory,
            &mut self.rng,
            world.terrain,
            faction,
            position,
            size,
        );
        let count = members.len();
        for member in members {
            world.register(member);
        }

        self.log.metrics.squads_deployed += 1;
        self.log.metrics.combatants_spawned += count as u32;
        self.log.log(
            SpawnLogEventType::SquadDeployed,
            format!("{} deployed with {} members at ({:.0}, {:.0})", squad_id, count, position.x, position.z),
        );
        self.deployments.push(SquadDeployedEvent {
            squad: squad_id,
            faction,
            size: count,
        });
        squad_id
    }

    /// Deployments since the last drain, oldest first.
    pub fn drain_deployments(&mut self) -> Vec<SquadDeployedEvent> {
        std::mem::take(&mut self.deployments)
    }

    /// Record a spawn that was skipped for capacity or match state.
    pub fn withhold(&mut self, reason: &str) {
        self.log.metrics.spawns_withheld += 1;
        self.log.log(SpawnLogEventType::SpawnWithheld, reason.to_string());
    }

    /// Uniform horizontal offset within `radius`.
    pub fn scatter(&mut self, center: Vec3, radius: f32) -> Vec3 {
        let angle = self.rng.random_range(0.0, std::f32::consts::TAU);
        let distance = self.rng.random_range(0.0, radius);
        center + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance)
    }

    /// Offset at a distance between `min` and `max` in a random direction.
    pub fn ring_offset(&mut self, center: Vec3, min: f32, max: f32) -> Vec3 {
        let angle = self.rng.random_range(0.0, std::f32::consts::TAU);
        let distance = self.rng.random_range(min, max);
        center + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance)
    }

    pub fn random_squad_size(&mut self, min: usize, max: usize) -> usize {
        self.rng.random_inclusive(min, max)
    }

    /// Where a side falls back to when it holds nothing useful: its HQ if it
    /// has one, otherwise the mode's base, otherwise the legacy base.
    pub fn fallback_position(&mut self, world: &Battlefield<'_>, side: Side) -> Vec3 {
        let hqs = headquarters(world.zones.zones(), side);
        match self.rng.index(hqs.len()) {
            Some(i) => hqs[i],
            None => base_position(world, side),
        }
    }
}

/// Mode-configured base for a side, or the legacy position.
pub fn base_position(world: &Battlefield<'_>, side: Side) -> Vec3 {
    match world.mode_config() {
        Some(config) => config.base_position(side),
        None => match side {
            Side::Blufor => LEGACY_US_BASE,
            Side::Opfor => LEGACY_OPFOR_BASE,
        },
    }
}

/// Home-base zones held by a side.
pub fn headquarters(zones: &[Zone], side: Side) -> SmallVec<[Vec3; 4]> {
    zones
        .iter()
        .filter(|z| z.is_home_base && z.is_owned_by(side))
        .map(|z| z.position)
        .collect()
}

/// Owned non-home zones, contested ones only if the side has any.
pub fn frontline_anchors(zones: &[Zone], side: Side) -> SmallVec<[Vec3; 8]> {
    let owned = zones
        .iter()
        .filter(|z| z.is_owned_by(side) && !z.is_home_base);
    let contested: SmallVec<[Vec3; 8]> = owned
        .clone()
        .filter(|z| z.state == ZoneState::Contested)
        .map(|z| z.position)
        .collect();
    if contested.is_empty() {
        owned.map(|z| z.position).collect()
    } else {
        contested
    }
}

/// Every zone a side holds, forward zones before headquarters.
pub fn owned_anchors(zones: &[Zone], side: Side) -> SmallVec<[Vec3; 8]> {
    let mut anchors: SmallVec<[Vec3; 8]> = zones
        .iter()
        .filter(|z| z.is_owned_by(side) && !z.is_home_base)
        .map(|z| z.position)
        .collect();
    if anchors.is_empty() {
        anchors.extend(headquarters(zones, side));
    }
    anchors
}

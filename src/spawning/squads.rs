//! Squad Management
//!
//! Groups combatants into squads, lays them out in formation, tracks
//! leadership and answers objective / approach / suppression queries.
//!
//! ## Invariants
//!
//! - A registered squad always has at least one member.
//! - A non-empty squad's leader is one of its members.
//! - Leadership passes to the first remaining member, immediately, when the
//!   leader leaves.

use std::collections::BTreeMap;

use bevy::prelude::*;
use smallvec::SmallVec;

use super::constants::*;
use super::factory::{CombatantFactory, SquadContext};
use crate::battlefield::{InfluenceMap, TerrainHeight, Zone};
use crate::combat::components::{
    Combatant, CombatantId, CombatantStore, Faction, GameRng, SquadId, TacticalRole,
};

/// Formation a squad moves in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Formation {
    #[default]
    Wedge,
    Line,
    Column,
}

/// Orders the player can give their own squad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquadCommand {
    FollowMe,
    HoldPosition,
    PatrolHere,
    Retreat,
    FreeRoam,
}

#[derive(Debug, Clone)]
pub struct Squad {
    pub id: SquadId,
    pub faction: Faction,
    /// Ordered; index 0 is the current leader
    pub members: Vec<CombatantId>,
    pub leader: Option<CombatantId>,
    pub formation: Formation,
    pub objective: Option<Vec3>,
    pub is_player_controlled: bool,
    pub command: Option<SquadCommand>,
    pub command_position: Option<Vec3>,
}

impl Squad {
    pub fn contains(&self, id: CombatantId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Output of [`SquadManager::assign_suppression_roles`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuppressionRoles {
    pub suppressors: SmallVec<[CombatantId; 2]>,
    pub flankers: SmallVec<[CombatantId; 6]>,
}

impl SuppressionRoles {
    pub fn is_empty(&self) -> bool {
        self.suppressors.is_empty() && self.flankers.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SquadManager {
    squads: BTreeMap<SquadId, Squad>,
    next_index: BTreeMap<Faction, u32>,
}

impl SquadManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn squad(&self, id: SquadId) -> Option<&Squad> {
        self.squads.get(&id)
    }

    pub fn squad_mut(&mut self, id: SquadId) -> Option<&mut Squad> {
        self.squads.get_mut(&id)
    }

    pub fn squads(&self) -> impl Iterator<Item = &Squad> {
        self.squads.values()
    }

    pub fn len(&self) -> usize {
        self.squads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squads.is_empty()
    }

    /// Forget every squad. Id counters keep running so ids stay unique.
    pub fn clear(&mut self) {
        self.squads.clear();
    }

    fn allocate_id(&mut self, faction: Faction) -> SquadId {
        let counter = self.next_index.entry(faction).or_insert(0);
        *counter += 1;
        SquadId { faction, index: *counter }
    }

    /// Create and register a squad of `size` members around `center`.
    ///
    /// Member 0 is the leader at the centre; the rest fill a wedge behind it,
    /// rows of [`FORMATION_ROW_WIDTH`] spaced [`FORMATION_SPACING`] apart.
    pub fn create_squad(
        &mut self,
        factory: &mut CombatantFactory,
        rng: &mut GameRng,
        terrain: &dyn TerrainHeight,
        faction: Faction,
        center: Vec3,
        size: usize,
    ) -> (SquadId, Vec<Combatant>) {
        let size = size.max(1);
        let id = self.allocate_id(faction);
        let mut members = Vec::with_capacity(size);

        for slot in 0..size {
            let mut position = center + formation_offset(slot);
            if slot > 0 {
                position.x += rng.jitter(FORMATION_JITTER);
                position.z += rng.jitter(FORMATION_JITTER);
            }
            position.y = terrain.height_at(position.x, position.z);

            let context = if slot == 0 {
                SquadContext::leader(id)
            } else {
                SquadContext::follower(id)
            };
            members.push(factory.create_combatant(rng, faction, position, Some(context)));
        }

        let member_ids: Vec<CombatantId> = members.iter().map(|c| c.id).collect();
        let leader = member_ids.first().copied();
        self.squads.insert(
            id,
            Squad {
                id,
                faction,
                members: member_ids,
                leader,
                formation: Formation::Wedge,
                objective: None,
                is_player_controlled: false,
                command: None,
                command_position: None,
            },
        );

        debug!("Created {} with {} members at {:?}", id, size, center);
        (id, members)
    }

    /// Append an already-built combatant to an existing squad.
    ///
    /// Returns false (and leaves everything untouched) if the squad is gone.
    pub fn add_member(&mut self, squad_id: SquadId, member: CombatantId) -> bool {
        let Some(squad) = self.squads.get_mut(&squad_id) else {
            return false;
        };
        if !squad.members.contains(&member) {
            squad.members.push(member);
        }
        if squad.leader.is_none() {
            squad.leader = Some(member);
        }
        true
    }

    /// Remove a member, dissolving the squad when it empties and promoting
    /// the first remaining member when the leader leaves.
    ///
    /// Returns the newly promoted leader, if leadership changed.
    pub fn remove_squad_member(
        &mut self,
        squad_id: SquadId,
        member: CombatantId,
    ) -> Option<CombatantId> {
        let Some(squad) = self.squads.get_mut(&squad_id) else {
            debug!("remove_squad_member: {} already gone", squad_id);
            return None;
        };
        let Some(index) = squad.members.iter().position(|&m| m == member) else {
            return None;
        };
        squad.members.remove(index);

        if squad.members.is_empty() {
            self.squads.remove(&squad_id);
            debug!("{} dissolved, last member {} removed", squad_id, member);
            return None;
        }

        if squad.leader == Some(member) {
            let promoted = squad.members[0];
            squad.leader = Some(promoted);
            debug!("{} leader {} removed, {} promoted", squad_id, member, promoted);
            return Some(promoted);
        }
        None
    }

    /// Give a player-controlled squad an order. Other squads ignore orders.
    pub fn issue_command(
        &mut self,
        squad_id: SquadId,
        command: SquadCommand,
        position: Option<Vec3>,
    ) -> bool {
        let Some(squad) = self
            .squads
            .get_mut(&squad_id)
            .filter(|s| s.is_player_controlled)
        else {
            return false;
        };
        squad.command = Some(command);
        squad.command_position = position;
        debug!("{} ordered to {:?}", squad_id, command);
        true
    }

    /// Pick an objective zone for a squad and remember it.
    ///
    /// Defers to the influence map when one is available, otherwise picks
    /// uniformly among zones that are neither friendly nor a home base.
    pub fn assign_squad_objective(
        &mut self,
        rng: &mut GameRng,
        squad_id: SquadId,
        leader_position: Vec3,
        zones: &[Zone],
        influence: Option<&dyn InfluenceMap>,
    ) -> Option<Zone> {
        let squad = self.squads.get_mut(&squad_id)?;

        let chosen = influence
            .and_then(|map| map.find_best_zone_target(leader_position, squad.faction))
            .or_else(|| {
                let side = squad.faction.side();
                let eligible: SmallVec<[&Zone; 8]> = zones
                    .iter()
                    .filter(|z| !z.is_owned_by(side) && !z.is_home_base)
                    .collect();
                rng.index(eligible.len()).map(|i| eligible[i].clone())
            })?;

        squad.objective = Some(chosen.position);
        Some(chosen)
    }

    /// Lower-threat spot near `target`, or `None` when there is no influence
    /// map (callers should then path straight at the target).
    pub fn find_best_approach_position(
        &self,
        current: Vec3,
        target: Vec3,
        faction: Faction,
        radius: f32,
        influence: Option<&dyn InfluenceMap>,
    ) -> Option<Vec3> {
        let position = influence?.find_best_position_near(target, radius, faction)?;
        trace!(
            "{} approach from {:?} to {:?} via {:?}",
            faction,
            current,
            target,
            position
        );
        Some(position)
    }

    /// Split a squad into suppressors (leader + member 1) and flankers.
    ///
    /// Flankers alternate ±45° around the bearing from the target back to
    /// the squad leader, 20 to 30 units out, and have their `destination_point`
    /// set. Members that no longer resolve are skipped.
    pub fn assign_suppression_roles(
        &self,
        rng: &mut GameRng,
        squad_id: SquadId,
        target: Vec3,
        combatants: &mut CombatantStore,
        terrain: &dyn TerrainHeight,
    ) -> SuppressionRoles {
        let mut roles = SuppressionRoles::default();
        let Some(squad) = self.squads.get(&squad_id) else {
            return roles;
        };
        if squad.members.len() < MIN_SUPPRESSION_SQUAD {
            return roles;
        }

        let leader = squad.leader.unwrap_or(squad.members[0]);
        let anchor = combatants
            .get(&leader)
            .map(|c| c.position)
            .unwrap_or(target);
        let mut bearing = Vec2::new(anchor.x - target.x, anchor.z - target.z);
        if bearing.length_squared() < f32::EPSILON {
            bearing = Vec2::Y;
        }
        let bearing = bearing.normalize();

        for id in [leader, squad.members[1]] {
            if let Some(c) = combatants.get_mut(&id) {
                c.tactical_role = Some(TacticalRole::Suppressor);
                c.destination_point = None;
                roles.suppressors.push(id);
            }
        }

        let flank_angle = FLANK_ANGLE_DEGREES.to_radians();
        for (n, &id) in squad.members.iter().skip(2).enumerate() {
            let Some(c) = combatants.get_mut(&id) else {
                continue;
            };
            let angle = if n % 2 == 0 { flank_angle } else { -flank_angle };
            let direction = Vec2::from_angle(angle).rotate(bearing);
            let distance = rng.random_range(FLANK_DISTANCE_MIN, FLANK_DISTANCE_MAX);
            let x = target.x + direction.x * distance;
            let z = target.z + direction.y * distance;

            c.tactical_role = Some(TacticalRole::Flanker);
            c.destination_point = Some(Vec3::new(x, terrain.height_at(x, z), z));
            roles.flankers.push(id);
        }

        roles
    }
}

/// Wedge slot offset relative to the leader.
fn formation_offset(slot: usize) -> Vec3 {
    if slot == 0 {
        return Vec3::ZERO;
    }
    let row = (slot - 1) / FORMATION_ROW_WIDTH + 1;
    let column = (slot - 1) % FORMATION_ROW_WIDTH;
    let lateral = column as f32 - (FORMATION_ROW_WIDTH as f32 - 1.0) / 2.0;
    Vec3::new(
        lateral * FORMATION_SPACING,
        0.0,
        -(row as f32) * FORMATION_SPACING,
    )
}

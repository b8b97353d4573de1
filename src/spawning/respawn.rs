//! Respawn Handling
//!
//! Owns the pending-respawn queue. Casualties from the player's squad come
//! back individually after a short delay, at the squad's rally point if it
//! has one; every other squad is only replenished wholesale through
//! reinforcement waves and force-strength maintenance.

use std::ops::RangeInclusive;
use std::time::Duration;

use bevy::prelude::*;

use super::constants::{ANCHOR_SPREAD, MAX_WAVE_SQUADS, RESPAWN_SCATTER};
use super::factory::SquadContext;
use super::forces::{frontline_anchors, Forces};
use crate::battlefield::Battlefield;
use crate::combat::components::{living_count, CombatantId, Faction, SquadId, SquadRole};
use crate::combat::log::SpawnLogEventType;

/// A casualty waiting to rejoin its squad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRespawn {
    pub squad_id: SquadId,
    pub original_id: CombatantId,
    /// Clock time at which the member may rejoin
    pub respawn_at: Duration,
}

#[derive(Debug)]
pub struct RespawnManager {
    pending: Vec<PendingRespawn>,
    respawn_delay: Duration,
}

impl RespawnManager {
    pub fn new(respawn_delay: Duration) -> Self {
        Self {
            pending: Vec::new(),
            respawn_delay,
        }
    }

    pub fn respawn_delay(&self) -> Duration {
        self.respawn_delay
    }

    pub fn set_respawn_delay(&mut self, delay: Duration) {
        self.respawn_delay = delay;
    }

    pub fn pending(&self) -> &[PendingRespawn] {
        &self.pending
    }

    pub fn is_queued(&self, original_id: CombatantId) -> bool {
        self.pending.iter().any(|p| p.original_id == original_id)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Schedule a respawn. At most one entry per original combatant.
    pub fn queue_respawn(
        &mut self,
        forces: &mut Forces,
        squad_id: SquadId,
        original_id: CombatantId,
        now: Duration,
    ) -> bool {
        if self.is_queued(original_id) {
            return false;
        }
        let respawn_at = now + self.respawn_delay;
        self.pending.push(PendingRespawn {
            squad_id,
            original_id,
            respawn_at,
        });
        forces.log.metrics.respawns_queued += 1;
        forces.log.log(
            SpawnLogEventType::RespawnQueued,
            format!(
                "{} of {} will rejoin in {:.1}s",
                original_id,
                squad_id,
                self.respawn_delay.as_secs_f32()
            ),
        );
        true
    }

    /// Take a combatant out of the world.
    ///
    /// Player-squad members get a respawn queued (once). Unknown ids only
    /// get scrubbed from the spatial index. Returns whether a record was
    /// actually removed.
    pub fn remove_combatant(
        &mut self,
        forces: &mut Forces,
        world: &mut Battlefield<'_>,
        id: CombatantId,
        now: Duration,
    ) -> bool {
        world.spatial.remove(id);
        let Some(combatant) = world.combatants.remove(&id) else {
            debug!("remove_combatant: {} already gone", id);
            return false;
        };

        if let Some(squad_id) = combatant.squad_id {
            let player_controlled = forces
                .squads
                .squad(squad_id)
                .is_some_and(|s| s.is_player_controlled);
            if player_controlled {
                self.queue_respawn(forces, squad_id, id, now);
            }

            if let Some(promoted) = forces.squads.remove_squad_member(squad_id, id) {
                if let Some(leader) = world.combatants.get_mut(&promoted) {
                    leader.squad_role = Some(SquadRole::Leader);
                }
            }
            if forces.squads.squad(squad_id).is_none() && forces.rally_points.remove(squad_id).is_some() {
                debug!("Rally point for dissolved {} removed", squad_id);
            }
        }

        forces.log.metrics.combatants_removed += 1;
        forces.log.log(
            SpawnLogEventType::CombatantRemoved,
            format!("{} ({}) removed", id, combatant.faction),
        );
        true
    }

    /// Drop every entry that has come due. Used while the match is inactive
    /// so nothing rejoins late once it resumes.
    pub fn discard_due_respawns(&mut self, forces: &mut Forces, now: Duration) -> usize {
        let before = self.pending.len();
        let mut dropped = Vec::new();
        self.pending.retain(|entry| {
            let due = entry.respawn_at <= now;
            if due {
                dropped.push(*entry);
            }
            !due
        });
        for entry in &dropped {
            forces.withhold(&format!(
                "Respawn for {} of {} dropped, match inactive",
                entry.original_id, entry.squad_id
            ));
        }
        before - self.pending.len()
    }

    /// Respawn every entry whose time has come, in the order they were
    /// queued. Entries that find the world full stay queued.
    pub fn handle_pending_respawns(
        &mut self,
        forces: &mut Forces,
        world: &mut Battlefield<'_>,
        now: Duration,
        max_combatants: usize,
    ) -> usize {
        let mut respawned = 0;
        let mut remaining = Vec::with_capacity(self.pending.len());

        for entry in std::mem::take(&mut self.pending) {
            if entry.respawn_at > now {
                remaining.push(entry);
                continue;
            }
            if world.combatants.len() >= max_combatants {
                remaining.push(entry);
                continue;
            }
            if self
                .respawn_squad_member(forces, world, entry.squad_id, now)
                .is_some()
            {
                respawned += 1;
            }
        }

        self.pending = remaining;
        respawned
    }

    /// Put a fresh member back into a squad.
    ///
    /// Does nothing if the squad has been wiped out in the meantime.
    pub fn respawn_squad_member(
        &self,
        forces: &mut Forces,
        world: &mut Battlefield<'_>,
        squad_id: SquadId,
        now: Duration,
    ) -> Option<CombatantId> {
        let Some(squad) = forces.squads.squad(squad_id) else {
            debug!("respawn_squad_member: {} no longer exists", squad_id);
            return None;
        };
        let faction = squad.faction;

        let (sum, alive) = squad
            .members
            .iter()
            .filter_map(|m| world.combatants.get(m))
            .fold((Vec3::ZERO, 0u32), |(sum, n), c| (sum + c.position, n + 1));
        if alive > 0 {
            trace!("{} centroid {:?} ({} members)", squad_id, sum / alive as f32, alive);
        }

        let rally = forces
            .rally_points
            .rally_point_position(squad_id)
            .filter(|_| forces.rally_points.consume_rally_point_use(squad_id, now));
        let anchor = match rally {
            Some(position) => {
                forces.log.metrics.rally_point_uses += 1;
                position
            }
            None => forces.fallback_position(world, faction.side()),
        };
        let position = world.ground(forces.scatter(anchor, RESPAWN_SCATTER));

        let mut combatant = forces.factory.create_combatant(
            &mut forces.rng,
            faction,
            position,
            Some(SquadContext::follower(squad_id)),
        );
        combatant.is_rejoining_squad = true;
        let id = combatant.id;

        forces.squads.add_member(squad_id, id);
        world.register(combatant);

        forces.log.metrics.respawns_completed += 1;
        forces.log.metrics.combatants_spawned += 1;
        forces.log.log(
            SpawnLogEventType::Respawned,
            format!(
                "{} rejoined {} at {}",
                id,
                squad_id,
                if rally.is_some() { "rally point" } else { "base" }
            ),
        );
        Some(id)
    }

    /// Top a faction's side up towards half of `max_combatants` with one to
    /// three squads, anchored at its forward zones.
    ///
    /// Returns the number of squads spawned.
    pub fn spawn_reinforcement_wave(
        &self,
        forces: &mut Forces,
        world: &mut Battlefield<'_>,
        faction: Faction,
        max_combatants: usize,
        squad_size: RangeInclusive<usize>,
    ) -> usize {
        let side = faction.side();
        let target = max_combatants / 2;
        let living = living_count(world.combatants, side);
        if target == 0 || living >= target {
            return 0;
        }

        let missing = target - living;
        let wanted = ((missing as f32 / target as f32) * MAX_WAVE_SQUADS as f32).ceil() as usize;
        let wanted = wanted.clamp(1, MAX_WAVE_SQUADS);
        let anchors = frontline_anchors(world.zones.zones(), side);

        let mut remaining = missing;
        let mut spawned = 0;
        for i in 0..wanted {
            let capacity = max_combatants.saturating_sub(world.combatants.len());
            if capacity == 0 {
                forces.withhold(&format!("{} wave squad skipped, world full", faction));
                break;
            }
            if remaining == 0 {
                break;
            }

            let size = forces
                .random_squad_size(*squad_size.start(), *squad_size.end())
                .min(remaining)
                .min(capacity);
            let anchor = if anchors.is_empty() {
                forces.fallback_position(world, side)
            } else {
                anchors[i % anchors.len()]
            };
            let position = world.ground(forces.scatter(anchor, ANCHOR_SPREAD));

            forces.spawn_squad(world, faction, position, size);
            remaining -= size;
            spawned += 1;
        }

        if spawned > 0 {
            forces.log.metrics.reinforcement_waves += 1;
            forces.log.log(
                SpawnLogEventType::ReinforcementWave,
                format!("{} reinforcement wave: {} squads for {} missing", faction, spawned, missing),
            );
            info!("{} reinforcement wave: {} squads ({} missing)", faction, spawned, missing);
        }
        spawned
    }
}

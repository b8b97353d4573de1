//! Spawn orchestration
//!
//! [`SpawnManager`] owns the spawn policy for a match:
//! - initial deployment (plus the optional player squad)
//! - the progressive early-contact queue
//! - reinforcement waves on their own timer
//! - periodic maintenance: dead pruning, ready respawns, force-strength refill
//! - the global combatant cap
//!
//! Squad creation goes through [`SquadManager`], per-member respawns through
//! [`RespawnManager`].

use std::collections::VecDeque;
use std::time::Duration;

use bevy::prelude::*;

use super::constants::*;
use super::forces::{base_position, headquarters, owned_anchors, Forces};
use super::rally::{RallyPointChange, RallyPointSystem};
use super::respawn::{PendingRespawn, RespawnManager};
use super::squads::{SquadCommand, SquadManager};
use crate::battlefield::{Battlefield, Clock, Zone};
use crate::combat::components::{living_count, CombatantId, Faction, GameRng, Side, SquadId};
use crate::combat::events::SquadDeployedEvent;
use crate::combat::log::{SpawnLog, SpawnLogEventType, SpawnMetrics};
use crate::settings::SpawnSettings;

/// One entry of the early-contact queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressiveSpawn {
    pub faction: Faction,
    pub position: Vec3,
    pub size: usize,
}

#[derive(Resource)]
pub struct SpawnManager {
    settings: SpawnSettings,
    clock: Box<dyn Clock>,
    forces: Forces,
    respawns: RespawnManager,
    progressive_queue: VecDeque<ProgressiveSpawn>,
    progressive_timer_ms: f32,
    wave_timer: f32,
    last_maintenance: Option<Duration>,
    player_squad_id: Option<SquadId>,
}

impl SpawnManager {
    pub fn new(mut settings: SpawnSettings, clock: Box<dyn Clock>, rng: GameRng, log: SpawnLog) -> Self {
        settings.validate();
        let rally_points = RallyPointSystem::from_settings(&settings);
        let respawns = RespawnManager::new(Duration::from_secs_f32(settings.respawn_delay));
        Self {
            forces: Forces::new(rng, log, rally_points),
            respawns,
            settings,
            clock,
            progressive_queue: VecDeque::new(),
            progressive_timer_ms: 0.0,
            wave_timer: 0.0,
            last_maintenance: None,
            player_squad_id: None,
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub fn set_max_combatants(&mut self, max: usize) {
        self.settings.max_combatants = max;
    }

    pub fn set_squad_size_range(&mut self, min: usize, max: usize) {
        self.settings.squad_size_min = min;
        self.settings.squad_size_max = max;
        self.settings.validate();
    }

    /// Seconds between reinforcement waves, never below
    /// [`MIN_REINFORCEMENT_INTERVAL`].
    pub fn set_reinforcement_interval(&mut self, secs: f32) {
        if secs < MIN_REINFORCEMENT_INTERVAL {
            warn!(
                "Reinforcement interval {:.1}s too short, using {:.1}s",
                secs, MIN_REINFORCEMENT_INTERVAL
            );
        }
        self.settings.reinforcement_interval = secs.max(MIN_REINFORCEMENT_INTERVAL);
    }

    pub fn settings(&self) -> &SpawnSettings {
        &self.settings
    }

    /// The cap in force: the game mode's, if it sets one.
    pub fn max_combatants(&self, world: &Battlefield<'_>) -> usize {
        world
            .mode_config()
            .and_then(|config| config.max_combatants)
            .unwrap_or(self.settings.max_combatants)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn squads(&self) -> &SquadManager {
        &self.forces.squads
    }

    pub fn rally_points(&self) -> &RallyPointSystem {
        &self.forces.rally_points
    }

    pub fn log(&self) -> &SpawnLog {
        &self.forces.log
    }

    pub fn metrics(&self) -> SpawnMetrics {
        self.forces.log.metrics
    }

    pub fn player_squad_id(&self) -> Option<SquadId> {
        self.player_squad_id
    }

    pub fn progressive_queue(&self) -> &VecDeque<ProgressiveSpawn> {
        &self.progressive_queue
    }

    pub fn pending_respawns(&self) -> &[PendingRespawn] {
        self.respawns.pending()
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Squads deployed since the last call, for event emission.
    pub fn drain_deployments(&mut self) -> Vec<SquadDeployedEvent> {
        self.forces.drain_deployments()
    }

    // ------------------------------------------------------------------
    // Deployment
    // ------------------------------------------------------------------

    /// Deploy the opening forces and seed the progressive queue.
    ///
    /// Returns the player squad's id when one was requested.
    pub fn spawn_initial_forces(
        &mut self,
        world: &mut Battlefield<'_>,
        create_player_squad: bool,
    ) -> Option<SquadId> {
        let max = self.max_combatants(world);
        let target = max / 2;
        let average = self.settings.average_squad_size().max(1.0);
        let initial_squads = if target == 0 {
            0
        } else {
            ((target as f32 * self.settings.initial_force_fraction) / average)
                .round()
                .max(1.0) as usize
        };

        info!(
            "Deploying initial forces: target {} per side, {} squads each",
            target, initial_squads
        );
        self.forces.log.log(
            SpawnLogEventType::MatchEvent,
            format!("Initial deployment ({} per side)", target),
        );

        let mut us_squads = initial_squads;
        let player_size = PLAYER_SQUAD_SIZE.min(max);
        if create_player_squad && player_size == 0 {
            self.forces.withhold("Player squad skipped, no capacity");
        } else if create_player_squad {
            let position = world.ground(base_position(world, Side::Blufor) + PLAYER_SQUAD_OFFSET);
            let size = player_size;
            let squad_id = self.forces.spawn_squad(world, Faction::Us, position, size);
            if let Some(squad) = self.forces.squads.squad_mut(squad_id) {
                squad.is_player_controlled = true;
            }
            self.player_squad_id = Some(squad_id);
            us_squads = us_squads.saturating_sub(1);
            info!("Player squad {} deployed with {} members", squad_id, size);
        }

        let zones = world.zones.zones();
        let blufor_hqs = headquarters(zones, Side::Blufor);
        let opfor_hqs = headquarters(zones, Side::Opfor);
        let use_hqs = !blufor_hqs.is_empty() && !opfor_hqs.is_empty();

        for side in Side::all() {
            let count = match side {
                Side::Blufor => us_squads,
                Side::Opfor => initial_squads,
            };
            let hqs = match side {
                Side::Blufor => &blufor_hqs,
                Side::Opfor => &opfor_hqs,
            };

            for i in 0..count {
                let side_room = target.saturating_sub(living_count(world.combatants, side));
                let capacity = max.saturating_sub(world.combatants.len());
                let size = self
                    .forces
                    .random_squad_size(self.settings.squad_size_min, self.settings.squad_size_max)
                    .min(side_room)
                    .min(capacity);
                if size == 0 {
                    self.forces.withhold(&format!("{} initial squad skipped, no room", side.name()));
                    break;
                }

                let position = if use_hqs {
                    self.forces.ring_offset(hqs[i % hqs.len()], HQ_JITTER_MIN, HQ_JITTER_MAX)
                } else {
                    self.forces.scatter(base_position(world, side), ANCHOR_SPREAD)
                };
                let position = world.ground(position);
                self.forces.spawn_squad(world, side.primary_faction(), position, size);
            }
        }

        self.seed_progressive_queue(world);
        self.player_squad_id
    }

    /// One squad per side, pushed forward from its base towards the enemy.
    fn seed_progressive_queue(&mut self, world: &Battlefield<'_>) {
        self.progressive_queue.clear();
        self.progressive_timer_ms = 0.0;

        let size = (self.settings.average_squad_size() * self.settings.progressive_squad_fraction)
            .round()
            .max(1.0) as usize;

        for side in Side::all() {
            let base = base_position(world, side);
            let enemy = base_position(world, side.opponent());
            let mut toward = enemy - base;
            toward.y = 0.0;
            let forward = toward.normalize_or_zero() * PROGRESSIVE_FORWARD_DISTANCE;

            self.progressive_queue.push_back(ProgressiveSpawn {
                faction: side.primary_faction(),
                position: base + forward,
                size,
            });
        }
    }

    /// Drop every combatant, squad and timer, then redeploy for a new mode.
    pub fn reseed_forces_for_mode(&mut self, world: &mut Battlefield<'_>) {
        world.combatants.clear();
        world.spatial.clear();
        self.forces.squads.clear();
        self.forces.rally_points.clear();
        self.respawns.clear();
        self.progressive_queue.clear();
        self.progressive_timer_ms = 0.0;
        self.wave_timer = 0.0;
        self.last_maintenance = None;
        self.player_squad_id = None;

        info!("Reseeding forces for new game mode");
        self.forces
            .log
            .log(SpawnLogEventType::MatchEvent, "Forces reseeded for game mode".to_string());
        self.spawn_initial_forces(world, false);
    }

    // ------------------------------------------------------------------
    // Per-frame update
    // ------------------------------------------------------------------

    /// Advance every spawn timer by `delta` seconds.
    pub fn update(&mut self, world: &mut Battlefield<'_>, delta: f32, combat_enabled: bool) {
        self.forces.log.advance(delta);
        let active = world.is_game_active();
        let max = self.max_combatants(world);

        self.update_progressive(world, delta, active, max);
        self.update_waves(world, delta, active, max);

        let now = self.clock.now();
        let interval = Duration::from_secs_f32(self.settings.maintenance_interval);
        let due = self
            .last_maintenance
            .map_or(true, |last| now.saturating_sub(last) >= interval);
        if due {
            self.last_maintenance = Some(now);
            self.run_maintenance(world, now, active, max, combat_enabled);
        }

        for change in self.forces.rally_points.update(now) {
            let message = match change {
                RallyPointChange::Expired(squad) => format!("Rally point for {} expired", squad),
                RallyPointChange::Regenerated(squad) => format!("Rally point for {} regenerated", squad),
            };
            debug!("{}", message);
            self.forces.log.log(SpawnLogEventType::RallyPoint, message);
        }
    }

    fn update_progressive(&mut self, world: &mut Battlefield<'_>, delta: f32, active: bool, max: usize) {
        if self.progressive_queue.is_empty() {
            return;
        }
        self.progressive_timer_ms += delta * 1000.0;
        if self.progressive_timer_ms < self.settings.progressive_spawn_interval_ms {
            return;
        }
        self.progressive_timer_ms = 0.0;

        let Some(entry) = self.progressive_queue.pop_front() else {
            return;
        };
        let capacity = max.saturating_sub(world.combatants.len());
        if !active || capacity == 0 {
            self.forces
                .withhold(&format!("Progressive {} squad dropped", entry.faction));
            return;
        }

        let position = world.ground(entry.position);
        let squad = self
            .forces
            .spawn_squad(world, entry.faction, position, entry.size.min(capacity));
        self.forces.log.metrics.progressive_spawns += 1;
        debug!("Progressive spawn {} ({} left)", squad, self.progressive_queue.len());
    }

    fn update_waves(&mut self, world: &mut Battlefield<'_>, delta: f32, active: bool, max: usize) {
        self.wave_timer += delta;
        if self.wave_timer < self.settings.reinforcement_interval {
            return;
        }
        self.wave_timer = 0.0;
        if !active {
            self.forces.withhold("Reinforcement wave skipped, match inactive");
            return;
        }

        let sizes = self.settings.squad_size_min..=self.settings.squad_size_max;
        for side in Side::all() {
            self.respawns.spawn_reinforcement_wave(
                &mut self.forces,
                world,
                side.primary_faction(),
                max,
                sizes.clone(),
            );
        }
    }

    fn run_maintenance(
        &mut self,
        world: &mut Battlefield<'_>,
        now: Duration,
        active: bool,
        max: usize,
        combat_enabled: bool,
    ) {
        let dead: Vec<CombatantId> = world
            .combatants
            .values()
            .filter(|c| c.is_dead())
            .map(|c| c.id)
            .collect();
        for id in &dead {
            self.respawns.remove_combatant(&mut self.forces, world, *id, now);
        }
        if !dead.is_empty() {
            debug!("Maintenance pruned {} dead combatants", dead.len());
        }

        if !active {
            let dropped = self.respawns.discard_due_respawns(&mut self.forces, now);
            if dropped > 0 {
                debug!("Dropped {} due respawns while the match is inactive", dropped);
            }
            return;
        }

        self.respawns
            .handle_pending_respawns(&mut self.forces, world, now, max);

        if world.in_combat_phase() || combat_enabled {
            for side in Side::all() {
                self.maintain_side_strength(world, side, max);
            }
        }
    }

    /// Refill a side towards its target with up to two squads, three when
    /// it has collapsed below the emergency threshold.
    fn maintain_side_strength(&mut self, world: &mut Battlefield<'_>, side: Side, max: usize) {
        let target = max / 2;
        let living = living_count(world.combatants, side);
        if living >= target {
            return;
        }
        let mut missing = target - living;

        let emergency =
            (living as f32) < target as f32 * self.settings.emergency_refill_living_fraction;
        let squads = if emergency {
            self.forces.log.metrics.emergency_refills += 1;
            info!(
                "{} emergency refill: {} living of {}",
                side.name(),
                living,
                target
            );
            self.settings.emergency_squads
        } else {
            self.settings.maintenance_squads
        };

        let anchors = owned_anchors(world.zones.zones(), side);
        let mut spawned = 0;
        for i in 0..squads {
            let capacity = max.saturating_sub(world.combatants.len());
            if missing == 0 {
                break;
            }
            if capacity == 0 {
                self.forces
                    .withhold(&format!("{} maintenance squad skipped, world full", side.name()));
                break;
            }

            let size = self
                .forces
                .random_squad_size(self.settings.squad_size_min, self.settings.squad_size_max)
                .min(missing)
                .min(capacity);
            let anchor = if anchors.is_empty() {
                self.forces.fallback_position(world, side)
            } else {
                anchors[i % anchors.len()]
            };
            let position = world.ground(self.forces.scatter(anchor, ANCHOR_SPREAD));

            self.forces
                .spawn_squad(world, side.primary_faction(), position, size);
            missing -= size;
            spawned += 1;
        }

        if spawned > 0 {
            self.forces.log.metrics.maintenance_squads += spawned as u32;
            self.forces.log.log(
                SpawnLogEventType::Maintenance,
                format!("{} topped up with {} squads ({} living)", side.name(), spawned, living),
            );
        }
    }

    // ------------------------------------------------------------------
    // Delegations
    // ------------------------------------------------------------------

    pub fn spawn_squad(
        &mut self,
        world: &mut Battlefield<'_>,
        faction: Faction,
        position: Vec3,
        size: usize,
    ) -> SquadId {
        self.forces.spawn_squad(world, faction, position, size)
    }

    pub fn remove_combatant(&mut self, world: &mut Battlefield<'_>, id: CombatantId) -> bool {
        let now = self.clock.now();
        self.respawns.remove_combatant(&mut self.forces, world, id, now)
    }

    pub fn respawn_squad_member(
        &mut self,
        world: &mut Battlefield<'_>,
        squad_id: SquadId,
    ) -> Option<CombatantId> {
        let now = self.clock.now();
        self.respawns
            .respawn_squad_member(&mut self.forces, world, squad_id, now)
    }

    pub fn queue_respawn(&mut self, squad_id: SquadId, original_id: CombatantId) -> bool {
        let now = self.clock.now();
        self.respawns
            .queue_respawn(&mut self.forces, squad_id, original_id, now)
    }

    /// Pick a squad's next objective and the point to approach it from.
    ///
    /// Without an influence map the approach point is the objective itself.
    pub fn plan_squad_advance(
        &mut self,
        world: &Battlefield<'_>,
        squad_id: SquadId,
    ) -> Option<(Zone, Vec3)> {
        let squad = self.forces.squads.squad(squad_id)?;
        let faction = squad.faction;
        let leader_position = squad
            .leader
            .and_then(|id| world.combatants.get(&id))
            .map(|c| c.position)?;

        let objective = self.forces.squads.assign_squad_objective(
            &mut self.forces.rng,
            squad_id,
            leader_position,
            world.zones.zones(),
            world.influence,
        )?;
        let approach = self
            .forces
            .squads
            .find_best_approach_position(
                leader_position,
                objective.position,
                faction,
                APPROACH_SEARCH_RADIUS,
                world.influence,
            )
            .unwrap_or(objective.position);
        Some((objective, approach))
    }

    pub fn issue_squad_command(
        &mut self,
        squad_id: SquadId,
        command: SquadCommand,
        position: Option<Vec3>,
    ) -> bool {
        self.forces.squads.issue_command(squad_id, command, position)
    }

    /// Place a rally point for one of the caller's squads.
    pub fn place_rally_point(
        &mut self,
        world: &Battlefield<'_>,
        position: Vec3,
        squad_id: SquadId,
    ) -> Result<(), String> {
        let faction = self
            .forces
            .squads
            .squad(squad_id)
            .map(|s| s.faction)
            .ok_or_else(|| format!("Unknown squad {}", squad_id))?;
        let now = self.clock.now();
        self.forces
            .rally_points
            .place_rally_point(position, squad_id, faction, world.zones.zones(), now)?;
        self.forces.log.metrics.rally_points_placed += 1;
        self.forces.log.log(
            SpawnLogEventType::RallyPoint,
            format!("Rally point placed for {}", squad_id),
        );
        Ok(())
    }
}

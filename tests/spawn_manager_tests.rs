//! Integration tests for the spawn orchestrator
//!
//! These tests verify that:
//! - The global combatant cap holds under sustained attrition
//! - The progressive queue drains exactly once
//! - Nothing spawns once the match is over
//! - Player-squad casualties respawn once, after the delay

use std::time::Duration;

use bevy::prelude::*;
use frontline::battlefield::{
    FlatTerrain, GameModeConfig, GamePhase, GridSpatialIndex, ManualClock, SpatialIndex,
    StaticTicketSystem, StaticZones, Zone,
};
use frontline::combat::components::living_count;
use frontline::{
    Battlefield, CombatantId, CombatantStore, Faction, GameRng, Side, SpawnLog, SpawnLogEventType,
    SpawnManager, SpawnSettings,
};

/// Owns everything a [`Battlefield`] borrows, plus the manager and its clock.
struct Harness {
    manager: SpawnManager,
    clock: ManualClock,
    store: CombatantStore,
    spatial: GridSpatialIndex,
    terrain: FlatTerrain,
    zones: StaticZones,
    tickets: Option<StaticTicketSystem>,
}

impl Harness {
    fn new(max_combatants: usize) -> Self {
        let settings = SpawnSettings {
            max_combatants,
            ..Default::default()
        };
        let clock = ManualClock::new();
        let manager = SpawnManager::new(
            settings,
            Box::new(clock.clone()),
            GameRng::from_seed(1234),
            SpawnLog::default(),
        );
        Self {
            manager,
            clock,
            store: CombatantStore::new(),
            spatial: GridSpatialIndex::default(),
            terrain: FlatTerrain(0.0),
            zones: StaticZones::default(),
            tickets: None,
        }
    }

    fn with_tickets(mut self, tickets: StaticTicketSystem) -> Self {
        self.tickets = Some(tickets);
        self
    }

    fn with_zones(mut self, zones: Vec<Zone>) -> Self {
        self.zones = StaticZones(zones);
        self
    }

    fn run<R>(&mut self, f: impl FnOnce(&mut SpawnManager, &mut Battlefield<'_>) -> R) -> R {
        let mut world = Battlefield::new(&mut self.store, &mut self.spatial, &self.terrain, &self.zones);
        if let Some(tickets) = &self.tickets {
            world = world.with_tickets(tickets);
        }
        f(&mut self.manager, &mut world)
    }

    fn kill_where(&mut self, mut pred: impl FnMut(&frontline::Combatant) -> bool) -> usize {
        let mut killed = 0;
        for combatant in self.store.values_mut() {
            if combatant.is_alive() && pred(combatant) {
                combatant.kill();
                killed += 1;
            }
        }
        killed
    }
}

fn combat_tickets() -> StaticTicketSystem {
    StaticTicketSystem::in_combat(GameModeConfig::default())
}

#[test]
fn test_combatant_cap_holds_under_attrition() {
    let mut h = Harness::new(10).with_tickets(combat_tickets());
    h.run(|m, w| m.spawn_initial_forces(w, false));
    assert!(h.store.len() <= 10);

    for round in 0..30 {
        h.clock.advance(Duration::from_secs(4));
        h.run(|m, w| m.update(w, 4.0, true));
        assert!(
            h.store.len() <= 10,
            "round {}: {} combatants exceeds cap of 10",
            round,
            h.store.len()
        );

        // Knock out every third combatant so maintenance keeps refilling
        let mut n = 0;
        h.kill_where(|_| {
            n += 1;
            n % 3 == 0
        });
    }

    assert!(h.manager.metrics().maintenance_squads > 0, "maintenance never refilled");
}

#[test]
fn test_progressive_queue_drains_exactly_twice() {
    let mut h = Harness::new(60);
    h.run(|m, w| m.spawn_initial_forces(w, false));
    assert_eq!(h.manager.progressive_queue().len(), 2);

    h.run(|m, w| m.update(w, 1.1, true));
    assert_eq!(h.manager.progressive_queue().len(), 1);
    h.run(|m, w| m.update(w, 1.1, true));
    assert!(h.manager.progressive_queue().is_empty());
    assert_eq!(h.manager.metrics().progressive_spawns, 2);

    h.run(|m, w| m.update(w, 1.1, true));
    assert_eq!(
        h.manager.metrics().progressive_spawns,
        2,
        "no further progressive spawns once the queue drains"
    );
}

#[test]
fn test_inactive_match_never_grows() {
    let ended = StaticTicketSystem {
        config: GameModeConfig::default(),
        phase: GamePhase::Ended,
        active: false,
    };
    let mut h = Harness::new(30).with_tickets(ended);
    h.run(|m, w| m.spawn_initial_forces(w, false));

    let mut previous = h.store.len();
    for _ in 0..10 {
        h.kill_where(|c| c.faction == Faction::Nva);
        h.clock.advance(Duration::from_secs(4));
        h.run(|m, w| m.update(w, 4.0, true));
        assert!(h.store.len() <= previous, "combatants grew in an inactive match");
        previous = h.store.len();
    }

    assert_eq!(living_count(&h.store, Side::Opfor), 0);
    assert!(h.manager.metrics().spawns_withheld > 0);
}

#[test]
fn test_player_squad_is_optional() {
    let mut h = Harness::new(30);
    let squad_id = h
        .run(|m, w| m.spawn_initial_forces(w, true))
        .expect("player squad requested");
    let squad = h.manager.squads().squad(squad_id).unwrap();
    assert!(squad.is_player_controlled);
    assert_eq!(squad.faction, Faction::Us);
    assert_eq!(squad.len(), 6);
    assert_eq!(h.manager.player_squad_id(), Some(squad_id));

    let mut h = Harness::new(30);
    assert_eq!(h.run(|m, w| m.spawn_initial_forces(w, false)), None);
    assert!(h.manager.squads().squads().all(|s| !s.is_player_controlled));
}

#[test]
fn test_duplicate_removal_queues_one_respawn() {
    let mut h = Harness::new(30);
    let squad_id = h.run(|m, w| m.spawn_initial_forces(w, true)).unwrap();
    let member = h.manager.squads().squad(squad_id).unwrap().members[2];

    assert!(h.run(|m, w| m.remove_combatant(w, member)));
    assert!(!h.run(|m, w| m.remove_combatant(w, member)));

    assert_eq!(h.manager.pending_respawns().len(), 1);
    assert_eq!(h.manager.metrics().respawns_queued, 1);
    assert!(!h.store.contains_key(&member));
    assert!(!h.manager.squads().squad(squad_id).unwrap().contains(member));
}

#[test]
fn test_player_casualty_rejoins_after_delay() {
    let mut h = Harness::new(30);
    let squad_id = h.run(|m, w| m.spawn_initial_forces(w, true)).unwrap();
    let casualty = h.manager.squads().squad(squad_id).unwrap().members[1];
    h.store.get_mut(&casualty).unwrap().kill();

    // First update prunes the casualty at t = 0 and queues it for t = 5
    h.run(|m, w| m.update(w, 0.0, false));
    assert_eq!(h.manager.pending_respawns().len(), 1);
    assert_eq!(h.manager.squads().squad(squad_id).unwrap().len(), 5);

    h.clock.advance(Duration::from_secs(3));
    h.run(|m, w| m.update(w, 0.0, false));
    assert_eq!(h.manager.pending_respawns().len(), 1, "respawned before the delay");

    h.clock.advance(Duration::from_secs(3));
    h.run(|m, w| m.update(w, 0.0, false));
    assert!(h.manager.pending_respawns().is_empty());

    let squad = h.manager.squads().squad(squad_id).unwrap();
    assert_eq!(squad.len(), 6);
    let newcomer = &h.store[squad.members.last().unwrap()];
    assert!(newcomer.is_rejoining_squad);
    assert_eq!(newcomer.squad_id, Some(squad_id));
    assert_eq!(h.manager.metrics().respawns_completed, 1);
}

#[test]
fn test_non_player_casualties_are_not_queued() {
    let mut h = Harness::new(30);
    h.run(|m, w| m.spawn_initial_forces(w, false));
    let killed = h.kill_where(|c| c.faction == Faction::Nva);
    assert!(killed > 0);

    h.run(|m, w| m.update(w, 0.0, false));
    assert!(h.manager.pending_respawns().is_empty());
    assert_eq!(h.manager.metrics().combatants_removed as usize, killed);
}

#[test]
fn test_emergency_refill_after_collapse() {
    let zones = vec![
        Zone::new("us_hq", Vec3::new(0.0, 0.0, -50.0), 20.0).owned_by(Side::Blufor).home_base(),
        Zone::new("nva_hq", Vec3::new(0.0, 0.0, 145.0), 20.0).owned_by(Side::Opfor).home_base(),
        Zone::new("hill", Vec3::new(30.0, 0.0, 100.0), 15.0).owned_by(Side::Opfor),
    ];
    let mut h = Harness::new(30).with_tickets(combat_tickets()).with_zones(zones);
    h.run(|m, w| m.spawn_initial_forces(w, false));
    h.kill_where(|c| c.side() == Side::Opfor);

    // Dead pruning runs before the refill in the same pass
    h.run(|m, w| m.update(w, 0.0, false));
    assert!(h.store.values().all(|c| c.is_alive()));
    assert!(h.manager.metrics().emergency_refills >= 1);
    assert!(living_count(&h.store, Side::Opfor) > 0);

    // Refills anchor at the owned forward zone
    let hill = Vec3::new(30.0, 0.0, 100.0);
    assert!(h
        .store
        .values()
        .filter(|c| c.side() == Side::Opfor)
        .all(|c| c.position.distance(hill) < 30.0));
}

#[test]
fn test_reseed_clears_in_flight_state() {
    let mut h = Harness::new(30);
    let squad_id = h.run(|m, w| m.spawn_initial_forces(w, true)).unwrap();
    let member = h.manager.squads().squad(squad_id).unwrap().members[0];
    h.run(|m, w| m.remove_combatant(w, member));
    assert_eq!(h.manager.pending_respawns().len(), 1);

    h.run(|m, w| m.reseed_forces_for_mode(w));

    assert!(h.manager.pending_respawns().is_empty());
    assert_eq!(h.manager.player_squad_id(), None);
    assert!(h.manager.squads().squad(squad_id).is_none());
    assert_eq!(h.manager.progressive_queue().len(), 2);
    assert_eq!(h.spatial.stats().entries, h.store.len());
    assert!(!h.store.is_empty());
}

#[test]
fn test_mode_cap_overrides_settings() {
    let config = GameModeConfig {
        max_combatants: Some(8),
        ..Default::default()
    };
    let mut h = Harness::new(30).with_tickets(StaticTicketSystem::in_combat(config));
    h.run(|m, w| m.spawn_initial_forces(w, false));
    for _ in 0..10 {
        h.clock.advance(Duration::from_secs(4));
        h.run(|m, w| m.update(w, 4.0, true));
        assert!(h.store.len() <= 8);
    }
}

#[test]
fn test_unknown_removal_is_harmless() {
    let mut h = Harness::new(30);
    h.run(|m, w| m.spawn_initial_forces(w, false));
    let before = h.store.len();
    assert!(!h.run(|m, w| m.remove_combatant(w, CombatantId(999_999))));
    assert_eq!(h.store.len(), before);
}

#[test]
fn test_advance_targets_non_friendly_zone() {
    let zones = vec![
        Zone::new("us_hq", Vec3::new(0.0, 0.0, -50.0), 20.0).owned_by(Side::Blufor).home_base(),
        Zone::new("village", Vec3::new(40.0, 0.0, 60.0), 15.0),
    ];
    let mut h = Harness::new(30).with_zones(zones);
    let squad_id = h.run(|m, w| m.spawn_initial_forces(w, true)).unwrap();

    let (objective, approach) = h
        .run(|m, w| m.plan_squad_advance(w, squad_id))
        .expect("village is a valid objective");
    assert_eq!(objective.id, "village");
    assert_eq!(approach, objective.position);
    assert_eq!(
        h.manager.squads().squad(squad_id).unwrap().objective,
        Some(Vec3::new(40.0, 0.0, 60.0))
    );
}

#[test]
fn test_only_player_squad_takes_commands() {
    use frontline::spawning::SquadCommand;

    let mut h = Harness::new(30);
    let player = h.run(|m, w| m.spawn_initial_forces(w, true)).unwrap();
    let hold = Some(Vec3::new(5.0, 0.0, 5.0));
    assert!(h.manager.issue_squad_command(player, SquadCommand::HoldPosition, hold));
    let squad = h.manager.squads().squad(player).unwrap();
    assert_eq!(squad.command, Some(SquadCommand::HoldPosition));
    assert_eq!(squad.command_position, hold);

    let ai_squad = h
        .manager
        .squads()
        .squads()
        .find(|s| !s.is_player_controlled)
        .map(|s| s.id)
        .unwrap();
    assert!(!h.manager.issue_squad_command(ai_squad, SquadCommand::Retreat, None));
}

#[test]
fn test_respawns_due_while_inactive_are_dropped() {
    let paused = StaticTicketSystem {
        config: GameModeConfig::default(),
        phase: GamePhase::Setup,
        active: false,
    };
    let mut h = Harness::new(30).with_tickets(paused);
    let squad_id = h.run(|m, w| m.spawn_initial_forces(w, true)).unwrap();
    let casualty = h.manager.squads().squad(squad_id).unwrap().members[1];
    h.store.get_mut(&casualty).unwrap().kill();

    h.run(|m, w| m.update(w, 0.0, false));
    assert_eq!(h.manager.pending_respawns().len(), 1);

    h.clock.advance(Duration::from_secs(16));
    h.run(|m, w| m.update(w, 0.0, false));
    assert!(h.manager.pending_respawns().is_empty(), "overdue respawn kept while inactive");

    // Match resumes: nothing comes back late
    if let Some(tickets) = h.tickets.as_mut() {
        tickets.active = true;
    }
    let before = h.store.len();
    h.clock.advance(Duration::from_secs(4));
    h.run(|m, w| m.update(w, 0.0, false));

    assert_eq!(h.store.len(), before);
    assert_eq!(h.manager.squads().squad(squad_id).unwrap().len(), 5);
    assert_eq!(h.manager.metrics().respawns_completed, 0);
    assert!(h.manager.metrics().spawns_withheld >= 1);
}

#[test]
fn test_reinforcement_wave_fires_once_per_interval() {
    let mut h = Harness::new(30);
    h.run(|m, w| m.spawn_initial_forces(w, false));

    for _ in 0..3 {
        h.run(|m, w| m.update(w, 4.0, false));
    }
    assert_eq!(h.manager.metrics().reinforcement_waves, 0, "wave before the interval");

    // 16s elapsed: one wave, one batch per side
    h.run(|m, w| m.update(w, 4.0, false));
    assert_eq!(h.manager.metrics().reinforcement_waves, 2);
    assert_eq!(h.manager.log().count(SpawnLogEventType::ReinforcementWave), 2);

    for _ in 0..3 {
        h.run(|m, w| m.update(w, 4.0, false));
    }
    assert_eq!(h.manager.metrics().reinforcement_waves, 2);
}

#[test]
fn test_short_wave_interval_is_clamped() {
    let mut h = Harness::new(30);
    h.manager.set_reinforcement_interval(1.0);
    assert_eq!(h.manager.settings().reinforcement_interval, 5.0);
    h.run(|m, w| m.spawn_initial_forces(w, false));

    h.run(|m, w| m.update(w, 4.0, false));
    assert_eq!(h.manager.metrics().reinforcement_waves, 0);
    h.run(|m, w| m.update(w, 4.0, false));
    assert!(h.manager.metrics().reinforcement_waves > 0);
}

#[test]
fn test_zero_cap_skips_player_squad() {
    let mut h = Harness::new(0);
    assert_eq!(h.run(|m, w| m.spawn_initial_forces(w, true)), None);
    assert!(h.store.is_empty());
    assert_eq!(h.manager.player_squad_id(), None);
}

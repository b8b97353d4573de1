//! Integration tests for rally points
//!
//! These tests verify that:
//! - Points run out after their last use and regenerate on time
//! - Respawns use a rally point when one is available

use std::time::Duration;

use bevy::prelude::*;
use frontline::battlefield::{FlatTerrain, GridSpatialIndex, ManualClock, StaticZones, Zone};
use frontline::spawning::RallyPointSystem;
use frontline::{
    Battlefield, CombatantStore, Faction, GameRng, Side, SpawnLog, SpawnManager, SpawnSettings,
    SquadId,
};

fn squad() -> SquadId {
    SquadId { faction: Faction::Us, index: 1 }
}

fn zones() -> Vec<Zone> {
    vec![Zone::new("firebase", Vec3::new(0.0, 0.0, 20.0), 25.0).owned_by(Side::Blufor)]
}

fn placed(settings: &SpawnSettings) -> RallyPointSystem {
    let mut system = RallyPointSystem::from_settings(settings);
    system
        .place_rally_point(Vec3::new(10.0, 0.0, 30.0), squad(), Faction::Us, &zones(), Duration::ZERO)
        .unwrap();
    system
}

#[test]
fn test_last_use_deactivates_point() {
    let settings = SpawnSettings {
        rally_point_max_uses: 1,
        ..Default::default()
    };
    let mut system = placed(&settings);

    assert!(system.consume_rally_point_use(squad(), Duration::from_secs(1)));
    assert_eq!(system.rally_point_position(squad()), None);
    assert!(!system.consume_rally_point_use(squad(), Duration::from_secs(2)));

    let point = system.rally_point(squad()).unwrap();
    assert!(!point.active);
    assert_eq!(point.depleted_at, Some(Duration::from_secs(1)));
}

#[test]
fn test_regeneration_happens_exactly_on_time() {
    let mut system = placed(&SpawnSettings::default());
    let depleted = Duration::from_secs(10);
    for _ in 0..3 {
        assert!(system.consume_rally_point_use(squad(), depleted));
    }
    assert_eq!(system.rally_point_position(squad()), None);

    assert!(system.update(depleted + Duration::from_millis(29_999)).is_empty());
    assert_eq!(system.rally_point_position(squad()), None, "regenerated early");

    system.update(depleted + Duration::from_secs(30));
    let point = system.rally_point(squad()).unwrap();
    assert!(point.active);
    assert_eq!(point.uses_remaining, point.max_uses);
    assert_eq!(system.rally_point_position(squad()), Some(Vec3::new(10.0, 0.0, 30.0)));
}

#[test]
fn test_depleted_point_does_not_expire() {
    let mut system = placed(&SpawnSettings::default());
    for _ in 0..3 {
        system.consume_rally_point_use(squad(), Duration::from_secs(50));
    }
    // Past the lifetime but inactive: waits for regeneration instead
    system.update(Duration::from_secs(70));
    assert!(system.rally_point(squad()).is_some());
}

#[test]
fn test_respawn_prefers_rally_point() {
    let clock = ManualClock::new();
    let mut manager = SpawnManager::new(
        SpawnSettings::default(),
        Box::new(clock.clone()),
        GameRng::from_seed(3),
        SpawnLog::default(),
    );
    let mut store = CombatantStore::new();
    let mut spatial = GridSpatialIndex::default();
    let terrain = FlatTerrain(1.5);
    let zones = StaticZones(zones());
    let mut world = Battlefield::new(&mut store, &mut spatial, &terrain, &zones);

    let squad_id = manager.spawn_initial_forces(&mut world, true).unwrap();
    let rally = Vec3::new(10.0, 0.0, 30.0);
    manager.place_rally_point(&world, rally, squad_id).unwrap();

    let id = manager.respawn_squad_member(&mut world, squad_id).unwrap();
    let newcomer = &world.combatants[&id];
    let offset = Vec2::new(newcomer.position.x - rally.x, newcomer.position.z - rally.z);
    assert!(offset.length() <= 3.0, "respawned {:?} away from rally point", offset);
    assert_eq!(newcomer.position.y, 1.5);

    let point = manager.rally_points().rally_point(squad_id).unwrap();
    assert_eq!(point.uses_remaining, point.max_uses - 1);
    assert_eq!(manager.metrics().rally_point_uses, 1);
}

#[test]
fn test_rally_point_rejected_far_from_friendly_zone() {
    let mut manager = SpawnManager::new(
        SpawnSettings::default(),
        Box::new(ManualClock::new()),
        GameRng::from_seed(4),
        SpawnLog::default(),
    );
    let mut store = CombatantStore::new();
    let mut spatial = GridSpatialIndex::default();
    let terrain = FlatTerrain(0.0);
    let zones = StaticZones(zones());
    let mut world = Battlefield::new(&mut store, &mut spatial, &terrain, &zones);

    let squad_id = manager.spawn_initial_forces(&mut world, true).unwrap();
    let err = manager
        .place_rally_point(&world, Vec3::new(400.0, 0.0, 400.0), squad_id)
        .unwrap_err();
    assert_eq!(err, "Rally point must be placed near a friendly zone");
    assert!(manager.rally_points().is_empty());
}

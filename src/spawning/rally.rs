//! Rally Points
//!
//! Player-placed respawn anchors. Each squad owns at most one; it has a
//! limited number of uses and a limited lifetime, and regenerates a while
//! after being used up.

use std::collections::BTreeMap;
use std::time::Duration;

use bevy::prelude::*;

use super::constants::RALLY_POINT_ZONE_MARGIN;
use crate::battlefield::Zone;
use crate::combat::components::{Faction, SquadId};
use crate::settings::SpawnSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct RallyPoint {
    pub position: Vec3,
    pub squad_id: SquadId,
    pub faction: Faction,
    pub active: bool,
    /// Start of the current lifetime window
    pub created_at: Duration,
    pub uses_remaining: u32,
    pub max_uses: u32,
    pub lifetime: Duration,
    pub regeneration_time: Duration,
    pub depleted_at: Option<Duration>,
}

impl RallyPoint {
    pub fn is_usable(&self) -> bool {
        self.active && self.uses_remaining > 0
    }
}

/// What changed during a [`RallyPointSystem::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RallyPointChange {
    Expired(SquadId),
    Regenerated(SquadId),
}

#[derive(Debug)]
pub struct RallyPointSystem {
    points: BTreeMap<SquadId, RallyPoint>,
    max_uses: u32,
    lifetime: Duration,
    regeneration_time: Duration,
}

impl Default for RallyPointSystem {
    fn default() -> Self {
        Self::from_settings(&SpawnSettings::default())
    }
}

impl RallyPointSystem {
    pub fn from_settings(settings: &SpawnSettings) -> Self {
        Self {
            points: BTreeMap::new(),
            max_uses: settings.rally_point_max_uses.max(1),
            lifetime: Duration::from_secs_f32(settings.rally_point_lifetime.max(0.0)),
            regeneration_time: Duration::from_secs_f32(settings.rally_point_regeneration.max(0.0)),
        }
    }

    /// Place (or replace) a squad's rally point.
    ///
    /// The position must lie within `radius + 50` of a zone held by the
    /// faction's side.
    pub fn place_rally_point(
        &mut self,
        position: Vec3,
        squad_id: SquadId,
        faction: Faction,
        zones: &[Zone],
        now: Duration,
    ) -> Result<(), String> {
        let side = faction.side();
        let near_friendly_zone = zones.iter().any(|zone| {
            zone.is_owned_by(side)
                && zone.flat_distance_to(position) <= zone.radius + RALLY_POINT_ZONE_MARGIN
        });
        if !near_friendly_zone {
            return Err("Rally point must be placed near a friendly zone".to_string());
        }

        if self.points.contains_key(&squad_id) {
            debug!("Replacing rally point for {}", squad_id);
        }
        self.points.insert(
            squad_id,
            RallyPoint {
                position,
                squad_id,
                faction,
                active: true,
                created_at: now,
                uses_remaining: self.max_uses,
                max_uses: self.max_uses,
                lifetime: self.lifetime,
                regeneration_time: self.regeneration_time,
                depleted_at: None,
            },
        );
        info!("Rally point placed for {} at {:?}", squad_id, position);
        Ok(())
    }

    pub fn rally_point(&self, squad_id: SquadId) -> Option<&RallyPoint> {
        self.points.get(&squad_id)
    }

    /// Position of a usable rally point.
    pub fn rally_point_position(&self, squad_id: SquadId) -> Option<Vec3> {
        self.points
            .get(&squad_id)
            .filter(|p| p.is_usable())
            .map(|p| p.position)
    }

    /// Spend one use. Spending the last use deactivates the point and starts
    /// its regeneration timer.
    pub fn consume_rally_point_use(&mut self, squad_id: SquadId, now: Duration) -> bool {
        let Some(point) = self.points.get_mut(&squad_id).filter(|p| p.is_usable()) else {
            return false;
        };
        point.uses_remaining -= 1;
        if point.uses_remaining == 0 {
            point.active = false;
            point.depleted_at = Some(now);
            debug!("Rally point for {} depleted", squad_id);
        }
        true
    }

    /// Expire old points and regenerate depleted ones.
    pub fn update(&mut self, now: Duration) -> Vec<RallyPointChange> {
        let mut changes = Vec::new();

        self.points.retain(|&squad_id, point| {
            if point.active && now.saturating_sub(point.created_at) > point.lifetime {
                changes.push(RallyPointChange::Expired(squad_id));
                return false;
            }
            true
        });

        for (&squad_id, point) in self.points.iter_mut() {
            let Some(depleted_at) = point.depleted_at else {
                continue;
            };
            if !point.active && now.saturating_sub(depleted_at) >= point.regeneration_time {
                point.active = true;
                point.uses_remaining = point.max_uses;
                point.created_at = now;
                point.depleted_at = None;
                changes.push(RallyPointChange::Regenerated(squad_id));
            }
        }

        changes
    }

    pub fn remove(&mut self, squad_id: SquadId) -> Option<RallyPoint> {
        self.points.remove(&squad_id)
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::components::Side;

    fn squad() -> SquadId {
        SquadId { faction: Faction::Us, index: 1 }
    }

    fn friendly_zones() -> Vec<Zone> {
        vec![
            Zone::new("us_hq", Vec3::ZERO, 20.0).owned_by(Side::Blufor).home_base(),
            Zone::new("bravo", Vec3::new(300.0, 0.0, 0.0), 15.0).owned_by(Side::Opfor),
        ]
    }

    #[test]
    fn test_placement_requires_friendly_zone() {
        let mut system = RallyPointSystem::default();
        let zones = friendly_zones();

        assert!(system
            .place_rally_point(Vec3::new(65.0, 0.0, 0.0), squad(), Faction::Us, &zones, Duration::ZERO)
            .is_ok());
        let err = system
            .place_rally_point(Vec3::new(300.0, 0.0, 0.0), squad(), Faction::Us, &zones, Duration::ZERO)
            .unwrap_err();
        assert!(err.contains("friendly zone"));
        // Failed placement leaves the old point in place
        assert_eq!(system.rally_point_position(squad()), Some(Vec3::new(65.0, 0.0, 0.0)));
    }

    #[test]
    fn test_replacement_resets_uses() {
        let mut system = RallyPointSystem::default();
        let zones = friendly_zones();
        system.place_rally_point(Vec3::ZERO, squad(), Faction::Us, &zones, Duration::ZERO).unwrap();
        assert!(system.consume_rally_point_use(squad(), Duration::ZERO));

        system
            .place_rally_point(Vec3::new(5.0, 0.0, 0.0), squad(), Faction::Us, &zones, Duration::from_secs(1))
            .unwrap();
        let point = system.rally_point(squad()).unwrap();
        assert_eq!(point.uses_remaining, 3);
        assert_eq!(system.len(), 1);
    }

    #[test]
    fn test_expiry_removes_unused_point() {
        let mut system = RallyPointSystem::default();
        system.place_rally_point(Vec3::ZERO, squad(), Faction::Us, &friendly_zones(), Duration::ZERO).unwrap();

        assert!(system.update(Duration::from_secs(60)).is_empty());
        let changes = system.update(Duration::from_secs(61));
        assert_eq!(changes, vec![RallyPointChange::Expired(squad())]);
        assert_eq!(system.rally_point_position(squad()), None);
    }

    #[test]
    fn test_missing_point_cannot_be_consumed() {
        let mut system = RallyPointSystem::default();
        assert!(!system.consume_rally_point_use(squad(), Duration::ZERO));
        assert_eq!(system.rally_point_position(squad()), None);
    }
}

//! Combatant Data Model
//!
//! Factions, combatant records, weapon and skill profiles, and the seeded
//! random number generator shared by every spawn decision.
//!
//! Combatants are plain records stored in a [`CombatantStore`] owned by the
//! host simulation. They are only ever built by
//! [`CombatantFactory`](crate::spawning::factory::CombatantFactory).

use std::collections::BTreeMap;
use std::fmt;

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

// ============================================================================
// Factions
// ============================================================================

/// Which side of the conflict a faction fights for.
///
/// `Opfor` is the umbrella grouping for every faction opposing the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Blufor,
    Opfor,
}

impl Side {
    /// Both sides, in the order spawn passes visit them.
    pub fn all() -> [Side; 2] {
        [Side::Blufor, Side::Opfor]
    }

    /// The faction that fields new squads for this side.
    pub fn primary_faction(&self) -> Faction {
        match self {
            Side::Blufor => Faction::Us,
            Side::Opfor => Faction::Nva,
        }
    }

    pub fn opponent(&self) -> Side {
        match self {
            Side::Blufor => Side::Opfor,
            Side::Opfor => Side::Blufor,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Side::Blufor => "BLUFOR",
            Side::Opfor => "OPFOR",
        }
    }
}

/// The fixed set of simulated forces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    Us,
    Arvn,
    Nva,
    Vc,
}

impl Faction {
    pub fn all() -> &'static [Faction] {
        &[Faction::Us, Faction::Arvn, Faction::Nva, Faction::Vc]
    }

    pub fn side(&self) -> Side {
        match self {
            Faction::Us | Faction::Arvn => Side::Blufor,
            Faction::Nva | Faction::Vc => Side::Opfor,
        }
    }

    pub fn is_opfor(&self) -> bool {
        self.side() == Side::Opfor
    }

    /// Short tag used in squad identifiers and log lines.
    pub fn tag(&self) -> &'static str {
        match self {
            Faction::Us => "US",
            Faction::Arvn => "ARVN",
            Faction::Nva => "NVA",
            Faction::Vc => "VC",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ============================================================================
// Identifiers
// ============================================================================

/// Handle of a combatant in the [`CombatantStore`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(pub u64);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "combatant_{}", self.0)
    }
}

/// Squad identifier: owning faction plus a per-faction running index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SquadId {
    pub faction: Faction,
    pub index: u32,
}

impl fmt::Display for SquadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "squad_{}_{}", self.faction.tag(), self.index)
    }
}

/// The host-owned combatant map. Ordered so seeded runs iterate identically.
pub type CombatantStore = BTreeMap<CombatantId, Combatant>;

// ============================================================================
// Combatant
// ============================================================================

/// Lifecycle / behaviour state of a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombatantState {
    #[default]
    Patrolling,
    Idle,
    Alert,
    Engaging,
    Suppressing,
    Advancing,
    SeekingCover,
    Defending,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SquadRole {
    Leader,
    Follower,
}

/// Role handed out by suppression planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TacticalRole {
    Suppressor,
    Flanker,
}

/// Non-owning reference to another combatant.
///
/// Dereferencing checks liveness: a missing or dead combatant resolves to no
/// target at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetHandle(pub CombatantId);

impl TargetHandle {
    pub fn resolve<'a>(&self, store: &'a CombatantStore) -> Option<&'a Combatant> {
        store.get(&self.0).filter(|c| c.is_alive())
    }
}

/// Firing characteristics of the weapon a combatant carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponSpec {
    pub name: String,
    /// Rounds per second
    pub rate_of_fire: f32,
    /// Base cone spread in radians
    pub spread: f32,
    /// Damage inside `falloff_start`
    pub damage_near: f32,
    /// Damage beyond `falloff_end`
    pub damage_far: f32,
    pub falloff_start: f32,
    pub falloff_end: f32,
    /// How much cover the round can punch through (0 = none)
    pub penetration: f32,
}

impl WeaponSpec {
    /// Damage at a given range, interpolated linearly across the falloff band.
    pub fn damage_at(&self, range: f32) -> f32 {
        if range <= self.falloff_start {
            return self.damage_near;
        }
        if range >= self.falloff_end {
            return self.damage_far;
        }
        let t = (range - self.falloff_start) / (self.falloff_end - self.falloff_start);
        self.damage_near + (self.damage_far - self.damage_near) * t
    }
}

/// AI skill values. Lower delays/jitter mean a more dangerous soldier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    /// Seconds between spotting a target and first reaction
    pub reaction_delay: f32,
    /// Radians of random aim error
    pub aim_jitter: f32,
    pub burst_length: u32,
    /// Seconds between bursts
    pub burst_pause: f32,
    pub leading_error: f32,
    /// 0..1, higher shrugs off incoming fire
    pub suppression_resistance: f32,
    pub vision_range: f32,
    /// Field of view in degrees
    pub field_of_view: f32,
    pub first_shot_accuracy: f32,
    /// Accuracy lost per shot within a burst
    pub burst_degradation: f32,
}

/// One soldier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub faction: Faction,
    pub squad_id: Option<SquadId>,
    pub squad_role: Option<SquadRole>,

    pub position: Vec3,
    pub velocity: Vec3,
    /// Yaw in radians
    pub rotation: f32,
    pub scale: Vec3,

    pub health: f32,
    pub max_health: f32,
    pub state: CombatantState,

    pub weapon: WeaponSpec,
    pub skill: SkillProfile,

    pub suppression_level: f32,
    pub panic_level: f32,
    /// Simulation seconds of the last hit taken, if ever hit
    pub last_hit_time: Option<f32>,
    pub miss_streak: u32,
    pub near_miss_count: u32,
    pub target: Option<TargetHandle>,

    pub tactical_role: Option<TacticalRole>,
    pub destination_point: Option<Vec3>,

    /// Stand-in for the human player, never owned by a squad
    pub is_player_proxy: bool,
    /// Set on combatants reinstated into an existing squad
    pub is_rejoining_squad: bool,
}

impl Combatant {
    pub fn is_alive(&self) -> bool {
        self.state != CombatantState::Dead && self.health > 0.0
    }

    pub fn is_dead(&self) -> bool {
        !self.is_alive()
    }

    pub fn side(&self) -> Side {
        self.faction.side()
    }

    /// Mark as dead. Removal from the store is a separate step.
    pub fn kill(&mut self) {
        self.health = 0.0;
        self.state = CombatantState::Dead;
        self.velocity = Vec3::ZERO;
        self.target = None;
    }

    pub fn is_leader(&self) -> bool {
        self.squad_role == Some(SquadRole::Leader)
    }
}

/// Count living combatants belonging to `side`.
pub fn living_count(store: &CombatantStore, side: Side) -> usize {
    store
        .values()
        .filter(|c| c.side() == side && c.is_alive() && !c.is_player_proxy)
        .count()
}

// ============================================================================
// Random numbers
// ============================================================================

/// Seeded random number generator for deterministic spawn decisions.
///
/// When a seed is provided (e.g., via headless config), the same seed will
/// always produce the same deployment. Without a seed, uses system entropy.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Generate a random f32 in the given range
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.random_f32() * (max - min)
    }

    /// Symmetric jitter in `[-amount, amount)`
    pub fn jitter(&mut self, amount: f32) -> f32 {
        self.random_range(-amount, amount)
    }

    /// Uniform integer in `[min, max]`. Returns `min` when the range is empty.
    pub fn random_inclusive(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Uniform index into a collection of `len` items.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.rng.gen_range(0..len))
        }
    }

    pub fn chance(&mut self, probability: f32) -> bool {
        self.random_f32() < probability
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opfor_grouping() {
        assert!(Faction::Nva.is_opfor());
        assert!(Faction::Vc.is_opfor());
        assert!(!Faction::Us.is_opfor());
        assert_eq!(Faction::Arvn.side(), Side::Blufor);
        assert_eq!(Side::Opfor.opponent(), Side::Blufor);
    }

    #[test]
    fn test_weapon_damage_falloff() {
        let weapon = WeaponSpec {
            name: "Test".to_string(),
            rate_of_fire: 10.0,
            spread: 0.01,
            damage_near: 40.0,
            damage_far: 20.0,
            falloff_start: 10.0,
            falloff_end: 30.0,
            penetration: 0.0,
        };
        assert_eq!(weapon.damage_at(5.0), 40.0);
        assert_eq!(weapon.damage_at(20.0), 30.0);
        assert_eq!(weapon.damage_at(100.0), 20.0);
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let mut a = GameRng::from_seed(7);
        let mut b = GameRng::from_seed(7);
        for _ in 0..16 {
            assert_eq!(a.random_inclusive(3, 6), b.random_inclusive(3, 6));
        }
        assert_eq!(a.index(0), None);
        assert_eq!(a.random_inclusive(4, 4), 4);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(CombatantId(12).to_string(), "combatant_12");
        let squad = SquadId { faction: Faction::Nva, index: 3 };
        assert_eq!(squad.to_string(), "squad_NVA_3");
    }
}

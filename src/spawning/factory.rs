//! Combatant construction
//!
//! The only place combatant records are built. Each faction carries its own
//! weapon and skill baseline; leaders get a tighter variant, and every
//! combatant gets a little independent jitter so no two squads behave alike.

use bevy::prelude::*;

use crate::combat::components::{
    Combatant, CombatantId, CombatantState, Faction, GameRng, SkillProfile, SquadId, SquadRole,
    WeaponSpec,
};

/// Health every combatant starts with.
pub const COMBATANT_MAX_HEALTH: f32 = 100.0;

/// Fractional jitter applied to skill values (±8%).
const SKILL_JITTER: f32 = 0.08;

/// Squad membership to stamp onto a new combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquadContext {
    pub squad_id: SquadId,
    pub role: SquadRole,
}

impl SquadContext {
    pub fn leader(squad_id: SquadId) -> Self {
        Self { squad_id, role: SquadRole::Leader }
    }

    pub fn follower(squad_id: SquadId) -> Self {
        Self { squad_id, role: SquadRole::Follower }
    }
}

/// Builds combatants and hands out their ids.
#[derive(Debug, Default)]
pub struct CombatantFactory {
    next_id: u64,
}

impl CombatantFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of combatants built so far.
    pub fn created(&self) -> u64 {
        self.next_id
    }

    fn allocate_id(&mut self) -> CombatantId {
        self.next_id += 1;
        CombatantId(self.next_id)
    }

    pub fn create_combatant(
        &mut self,
        rng: &mut GameRng,
        faction: Faction,
        position: Vec3,
        squad: Option<SquadContext>,
    ) -> Combatant {
        let is_leader = squad.is_some_and(|ctx| ctx.role == SquadRole::Leader);
        let skill = jittered(rng, base_skill(faction, is_leader));
        let rotation = rng.random_range(0.0, std::f32::consts::TAU);

        Combatant {
            id: self.allocate_id(),
            faction,
            squad_id: squad.map(|ctx| ctx.squad_id),
            squad_role: squad.map(|ctx| ctx.role),
            position,
            velocity: Vec3::ZERO,
            rotation,
            scale: Vec3::ONE,
            health: COMBATANT_MAX_HEALTH,
            max_health: COMBATANT_MAX_HEALTH,
            state: CombatantState::Patrolling,
            weapon: weapon_for(faction),
            skill,
            suppression_level: 0.0,
            panic_level: 0.0,
            last_hit_time: None,
            miss_streak: 0,
            near_miss_count: 0,
            target: None,
            tactical_role: None,
            destination_point: None,
            is_player_proxy: false,
            is_rejoining_squad: false,
        }
    }

    /// Synthetic combatant standing in for the human player, so AI targeting
    /// and avoidance treat the player like any other US soldier.
    pub fn create_player_proxy(&mut self, position: Vec3) -> Combatant {
        Combatant {
            id: self.allocate_id(),
            faction: Faction::Us,
            squad_id: None,
            squad_role: None,
            position,
            velocity: Vec3::ZERO,
            rotation: 0.0,
            scale: Vec3::ONE,
            health: COMBATANT_MAX_HEALTH,
            max_health: COMBATANT_MAX_HEALTH,
            state: CombatantState::Engaging,
            weapon: weapon_for(Faction::Us),
            skill: base_skill(Faction::Us, true),
            suppression_level: 0.0,
            panic_level: 0.0,
            last_hit_time: None,
            miss_streak: 0,
            near_miss_count: 0,
            target: None,
            tactical_role: None,
            destination_point: None,
            is_player_proxy: true,
            is_rejoining_squad: false,
        }
    }
}

fn weapon_for(faction: Faction) -> WeaponSpec {
    match faction {
        Faction::Us => WeaponSpec {
            name: "M16A1".to_string(),
            rate_of_fire: 12.0,
            spread: 0.008,
            damage_near: 34.0,
            damage_far: 22.0,
            falloff_start: 30.0,
            falloff_end: 90.0,
            penetration: 0.3,
        },
        Faction::Arvn => WeaponSpec {
            name: "M1 Carbine".to_string(),
            rate_of_fire: 8.0,
            spread: 0.010,
            damage_near: 30.0,
            damage_far: 18.0,
            falloff_start: 25.0,
            falloff_end: 75.0,
            penetration: 0.2,
        },
        Faction::Nva => WeaponSpec {
            name: "AK-47".to_string(),
            rate_of_fire: 10.0,
            spread: 0.012,
            damage_near: 38.0,
            damage_far: 24.0,
            falloff_start: 25.0,
            falloff_end: 80.0,
            penetration: 0.4,
        },
        Faction::Vc => WeaponSpec {
            name: "SKS".to_string(),
            rate_of_fire: 5.0,
            spread: 0.009,
            damage_near: 36.0,
            damage_far: 26.0,
            falloff_start: 35.0,
            falloff_end: 100.0,
            penetration: 0.35,
        },
    }
}

fn base_skill(faction: Faction, is_leader: bool) -> SkillProfile {
    // (reaction, jitter, burst, pause, leading, resist, vision, fov, first shot, degradation)
    let (reaction, aim, burst, pause, leading, resist, vision, fov, first, degrade) = match faction
    {
        Faction::Us => (0.45, 0.030, 4, 0.50, 0.15, 0.55, 130.0, 110.0, 0.80, 0.06),
        Faction::Arvn => (0.55, 0.038, 3, 0.60, 0.20, 0.45, 120.0, 110.0, 0.72, 0.08),
        Faction::Nva => (0.50, 0.034, 4, 0.55, 0.18, 0.60, 125.0, 120.0, 0.76, 0.07),
        Faction::Vc => (0.60, 0.040, 3, 0.70, 0.22, 0.50, 140.0, 120.0, 0.70, 0.09),
    };

    if is_leader {
        SkillProfile {
            reaction_delay: reaction * 0.8,
            aim_jitter: aim * 0.75,
            burst_length: burst + 1,
            burst_pause: pause * 0.85,
            leading_error: leading * 0.7,
            suppression_resistance: (resist + 0.15_f32).min(1.0),
            vision_range: vision * 1.1,
            field_of_view: fov,
            first_shot_accuracy: (first + 0.08_f32).min(1.0),
            burst_degradation: degrade * 0.8,
        }
    } else {
        SkillProfile {
            reaction_delay: reaction,
            aim_jitter: aim,
            burst_length: burst,
            burst_pause: pause,
            leading_error: leading,
            suppression_resistance: resist,
            vision_range: vision,
            field_of_view: fov,
            first_shot_accuracy: first,
            burst_degradation: degrade,
        }
    }
}

fn jittered(rng: &mut GameRng, base: SkillProfile) -> SkillProfile {
    let mut scale = |value: f32| value * (1.0 + rng.jitter(SKILL_JITTER));
    SkillProfile {
        reaction_delay: scale(base.reaction_delay),
        aim_jitter: scale(base.aim_jitter),
        burst_length: base.burst_length,
        burst_pause: scale(base.burst_pause),
        leading_error: scale(base.leading_error),
        suppression_resistance: scale(base.suppression_resistance).clamp(0.0, 1.0),
        vision_range: scale(base.vision_range),
        field_of_view: base.field_of_view,
        first_shot_accuracy: scale(base.first_shot_accuracy).clamp(0.0, 1.0),
        burst_degradation: scale(base.burst_degradation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squad_id() -> SquadId {
        SquadId { faction: Faction::Nva, index: 1 }
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut factory = CombatantFactory::new();
        let mut rng = GameRng::from_seed(1);
        let a = factory.create_combatant(&mut rng, Faction::Us, Vec3::ZERO, None);
        let b = factory.create_combatant(&mut rng, Faction::Us, Vec3::ZERO, None);
        let proxy = factory.create_player_proxy(Vec3::ZERO);
        assert!(a.id < b.id && b.id < proxy.id);
        assert_eq!(factory.created(), 3);
    }

    #[test]
    fn test_leaders_are_sharper_than_followers() {
        let leader = base_skill(Faction::Nva, true);
        let follower = base_skill(Faction::Nva, false);
        assert!(leader.reaction_delay < follower.reaction_delay);
        assert!(leader.aim_jitter < follower.aim_jitter);
        assert!(leader.first_shot_accuracy > follower.first_shot_accuracy);
    }

    #[test]
    fn test_squad_context_is_stamped() {
        let mut factory = CombatantFactory::new();
        let mut rng = GameRng::from_seed(2);
        let c = factory.create_combatant(
            &mut rng,
            Faction::Nva,
            Vec3::new(1.0, 2.0, 3.0),
            Some(SquadContext::follower(squad_id())),
        );
        assert_eq!(c.squad_id, Some(squad_id()));
        assert_eq!(c.squad_role, Some(SquadRole::Follower));
        assert_eq!(c.weapon.name, "AK-47");
        assert!(c.is_alive());
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let mut rng = GameRng::from_seed(3);
        let base = base_skill(Faction::Vc, false);
        for _ in 0..50 {
            let skill = jittered(&mut rng, base.clone());
            let ratio = skill.reaction_delay / base.reaction_delay;
            assert!((1.0 - SKILL_JITTER..=1.0 + SKILL_JITTER).contains(&ratio));
        }
    }

    #[test]
    fn test_player_proxy_is_engaging_us_leader() {
        let mut factory = CombatantFactory::new();
        let proxy = factory.create_player_proxy(Vec3::ZERO);
        assert!(proxy.is_player_proxy);
        assert_eq!(proxy.state, CombatantState::Engaging);
        assert_eq!(proxy.faction, Faction::Us);
        assert_eq!(proxy.skill, base_skill(Faction::Us, true));
    }
}

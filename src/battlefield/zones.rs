//! Zones and game mode data
//!
//! Capture zones, their ownership, and the game-mode description handed out
//! by the ticket system.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{TicketSystem, ZoneProvider};
use crate::combat::components::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZoneState {
    #[default]
    Neutral,
    Contested,
    Controlled,
}

/// A capture zone or headquarters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub position: Vec3,
    pub radius: f32,
    pub owner: Option<Side>,
    /// Headquarters / home base, never a valid objective
    #[serde(default)]
    pub is_home_base: bool,
    #[serde(default)]
    pub state: ZoneState,
}

impl Zone {
    pub fn new(id: &str, position: Vec3, radius: f32) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            position,
            radius,
            owner: None,
            is_home_base: false,
            state: ZoneState::Neutral,
        }
    }

    pub fn owned_by(mut self, side: Side) -> Self {
        self.owner = Some(side);
        self.state = ZoneState::Controlled;
        self
    }

    pub fn home_base(mut self) -> Self {
        self.is_home_base = true;
        self
    }

    pub fn contested(mut self) -> Self {
        self.state = ZoneState::Contested;
        self
    }

    pub fn is_owned_by(&self, side: Side) -> bool {
        self.owner == Some(side)
    }

    /// Horizontal distance from the zone centre, ignoring height.
    pub fn flat_distance_to(&self, position: Vec3) -> f32 {
        Vec2::new(self.position.x, self.position.z).distance(Vec2::new(position.x, position.z))
    }
}

/// Match phase reported by the ticket system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Setup,
    Combat,
    Overtime,
    Ended,
}

/// Game mode description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameModeConfig {
    pub world_size: f32,
    pub us_base_position: Vec3,
    pub opfor_base_position: Vec3,
    /// Mode-specific override of the global combatant cap
    #[serde(default)]
    pub max_combatants: Option<usize>,
}

impl Default for GameModeConfig {
    fn default() -> Self {
        Self {
            world_size: 400.0,
            us_base_position: Vec3::new(0.0, 0.0, -50.0),
            opfor_base_position: Vec3::new(0.0, 0.0, 145.0),
            max_combatants: None,
        }
    }
}

impl GameModeConfig {
    pub fn base_position(&self, side: Side) -> Vec3 {
        match side {
            Side::Blufor => self.us_base_position,
            Side::Opfor => self.opfor_base_position,
        }
    }
}

/// Fixed list of zones.
#[derive(Debug, Clone, Default)]
pub struct StaticZones(pub Vec<Zone>);

impl ZoneProvider for StaticZones {
    fn zones(&self) -> &[Zone] {
        &self.0
    }
}

/// Ticket system with externally set phase and activity.
#[derive(Debug, Clone, Default)]
pub struct StaticTicketSystem {
    pub config: GameModeConfig,
    pub phase: GamePhase,
    pub active: bool,
}

impl StaticTicketSystem {
    /// A running match in the combat phase.
    pub fn in_combat(config: GameModeConfig) -> Self {
        Self {
            config,
            phase: GamePhase::Combat,
            active: true,
        }
    }

    pub fn end_match(&mut self) {
        self.phase = GamePhase::Ended;
        self.active = false;
    }
}

impl TicketSystem for StaticTicketSystem {
    fn current_config(&self) -> GameModeConfig {
        self.config.clone()
    }

    fn game_phase(&self) -> GamePhase {
        self.phase
    }

    fn is_game_active(&self) -> bool {
        self.active
    }
}

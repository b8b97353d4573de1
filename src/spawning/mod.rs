//! Spawning
//!
//! Combatant lifecycle and squad coordination: building combatants, grouping
//! them into squads, replacing casualties and keeping both sides at strength.

pub mod constants;
pub mod factory;
pub mod forces;
pub mod manager;
pub mod plugin;
pub mod rally;
pub mod respawn;
pub mod squads;

pub use factory::{CombatantFactory, SquadContext};
pub use forces::Forces;
pub use manager::{ProgressiveSpawn, SpawnManager};
pub use plugin::{BattlefieldServices, CombatEnabled, DeploymentOrders, Roster, SpawnPlugin};
pub use rally::{RallyPoint, RallyPointChange, RallyPointSystem};
pub use respawn::{PendingRespawn, RespawnManager};
pub use squads::{Formation, Squad, SquadCommand, SquadManager, SuppressionRoles};

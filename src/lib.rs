//! Frontline - combatant lifecycle and squad coordination
//!
//! The spawn core of a real-time tactical combat simulation: when and where
//! soldiers enter the world, how they are grouped into squads, how casualties
//! are replaced and how each side is kept at strength over a match.
//!
//! This library exposes the core modules for testing and reuse.

pub mod battlefield;
pub mod cli;
pub mod combat;
pub mod headless;
pub mod settings;
pub mod spawning;

// Re-export commonly used types
pub use battlefield::{Battlefield, Clock, ManualClock, SystemClock};
pub use combat::components::{Combatant, CombatantId, CombatantStore, Faction, GameRng, Side, SquadId};
pub use combat::log::{SpawnLog, SpawnLogEventType, SpawnMetrics};
pub use headless::HeadlessSkirmishConfig;
pub use settings::SpawnSettings;
pub use spawning::{SpawnManager, SpawnPlugin};

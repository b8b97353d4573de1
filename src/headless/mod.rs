//! Headless mode for automated runs
//!
//! This module runs spawn-core skirmishes without any graphical output,
//! suitable for automated testing and tuning.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless skirmish
//! cargo run --release -- --headless skirmish.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "max_combatants": 30,
//!   "create_player_squad": true,
//!   "casualty_rate_per_sec": 0.5,
//!   "max_duration_secs": 120,
//!   "random_seed": 42
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::HeadlessSkirmishConfig;
pub use runner::{run_headless_skirmish, run_to_completion, skirmish_app, SkirmishResult};

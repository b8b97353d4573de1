//! Command-line interface for Frontline
//!
//! Headless skirmish runs driven by a JSON config.

use clap::Parser;
use std::path::PathBuf;

/// Combatant lifecycle and squad coordination simulator
#[derive(Parser, Debug)]
#[command(name = "frontline")]
#[command(about = "Combatant lifecycle and squad coordination simulator")]
#[command(version)]
pub struct Args {
    /// Run a headless skirmish with the specified JSON config file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub headless: Option<PathBuf>,

    /// Output path for the skirmish result
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum skirmish duration in seconds (overrides the config file)
    #[arg(long)]
    pub max_duration: Option<f32>,
}

pub fn parse_args() -> Args {
    Args::parse()
}

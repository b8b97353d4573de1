//! Frontline - headless skirmish runner
//!
//! Runs the spawn core against random attrition from a JSON config and
//! reports force strength and spawn metrics.

use std::path::Path;
use std::process::ExitCode;

use frontline::cli;
use frontline::headless::{run_headless_skirmish, HeadlessSkirmishConfig};

fn main() -> ExitCode {
    let args = cli::parse_args();

    let Some(config_path) = args.headless else {
        eprintln!("No configuration given. Run with --headless <CONFIG_FILE>.");
        return ExitCode::FAILURE;
    };

    let mut config = match HeadlessSkirmishConfig::load_from_file(Path::new(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Command-line values take precedence over the config file
    if let Some(output) = args.output {
        config.output_path = Some(output.to_string_lossy().into_owned());
    }
    if let Some(max_duration) = args.max_duration {
        config.max_duration_secs = max_duration;
    }

    match run_headless_skirmish(config) {
        Ok(result) => {
            println!(
                "Finished after {:.1}s: {} BLUFOR / {} OPFOR alive, peak {} combatants",
                result.elapsed_secs, result.final_blufor, result.final_opfor, result.peak_combatants
            );
            println!(
                "  {} squads deployed, {} respawns, {} reinforcement waves",
                result.metrics.squads_deployed,
                result.metrics.respawns_completed,
                result.metrics.reinforcement_waves
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

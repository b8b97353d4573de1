//! Headless skirmish execution
//!
//! Runs the spawn core in a windowless Bevy app against random attrition,
//! suitable for automated testing and tuning runs.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use serde::Serialize;
use smallvec::SmallVec;
use std::time::Duration;

use crate::battlefield::{GameModeConfig, ManualClock, StaticTicketSystem, StaticZones};
use crate::combat::components::{living_count, CombatantId, GameRng, Side};
use crate::combat::events::CasualtyEvent;
use crate::combat::log::{SpawnLog, SpawnMetrics};
use crate::combat::systems::apply_casualties;
use crate::combat::CombatPlugin;
use crate::settings::SpawnSettings;
use crate::spawning::constants::SPAWN_LOG_CAPACITY;
use crate::spawning::plugin::drive_spawn_manager;
use crate::spawning::{BattlefieldServices, CombatEnabled, Roster, SpawnManager, SpawnPlugin};

use super::config::HeadlessSkirmishConfig;

/// Fixed simulation step.
const TICK: f64 = 1.0 / 60.0;

/// Result of a completed headless skirmish
///
/// This struct provides programmatic access to skirmish results for testing
/// and analysis, and is what gets written to the output file.
#[derive(Debug, Clone, Serialize)]
pub struct SkirmishResult {
    /// Simulated seconds
    pub elapsed_secs: f32,
    /// Most combatant records in the world at once
    pub peak_combatants: usize,
    /// Living BLUFOR combatants at the end
    pub final_blufor: usize,
    /// Living OPFOR combatants at the end
    pub final_opfor: usize,
    pub squads_remaining: usize,
    /// Casualties inflicted by the attrition system
    pub casualties_inflicted: u32,
    pub metrics: SpawnMetrics,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
}

/// Resource to track headless skirmish state
#[derive(Resource)]
pub struct HeadlessSkirmishState {
    /// Skirmish length
    pub max_duration: f32,
    pub elapsed_time: f32,
    pub casualty_rate_per_sec: f32,
    /// Fractional casualties carried between ticks
    pub attrition_budget: f32,
    pub casualties_inflicted: u32,
    pub peak_combatants: usize,
    /// Custom output path for the result
    pub output_path: Option<String>,
    pub random_seed: Option<u64>,
    /// Skirmish result (populated when the skirmish completes)
    pub result: Option<SkirmishResult>,
}

/// Drives the spawn manager's clock in lockstep with simulated time.
#[derive(Resource, Clone)]
pub struct SkirmishClock(pub ManualClock);

/// Random source for attrition, kept apart from the spawn RNG.
#[derive(Resource)]
pub struct AttritionRng(pub GameRng);

/// Plugin for headless skirmish execution
pub struct HeadlessPlugin {
    pub config: HeadlessSkirmishConfig,
    pub settings: SpawnSettings,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        // Initialize RNGs with seed if provided (deterministic mode)
        let (spawn_rng, attrition_rng) = match self.config.random_seed {
            Some(seed) => {
                info!("Using deterministic RNG with seed: {}", seed);
                (GameRng::from_seed(seed), GameRng::from_seed(seed.wrapping_add(1)))
            }
            None => {
                info!("Using non-deterministic RNG (no seed provided)");
                (GameRng::from_entropy(), GameRng::from_entropy())
            }
        };

        let clock = ManualClock::new();
        let tickets = StaticTicketSystem::in_combat(GameModeConfig::default());

        app.insert_resource(SkirmishClock(clock.clone()))
            .insert_resource(AttritionRng(attrition_rng))
            .insert_resource(SpawnManager::new(
                self.settings.clone(),
                Box::new(clock),
                spawn_rng,
                SpawnLog::with_capacity(SPAWN_LOG_CAPACITY),
            ))
            .insert_resource(BattlefieldServices {
                zones: Box::new(StaticZones(self.config.zones.clone())),
                tickets: Some(Box::new(tickets)),
                ..Default::default()
            })
            .insert_resource(CombatEnabled(true))
            .insert_resource(HeadlessSkirmishState {
                max_duration: self.config.max_duration_secs,
                elapsed_time: 0.0,
                casualty_rate_per_sec: self.config.casualty_rate_per_sec,
                attrition_budget: 0.0,
                casualties_inflicted: 0,
                peak_combatants: 0,
                output_path: self.config.output_path.clone(),
                random_seed: self.config.random_seed,
                result: None,
            });

        app.add_plugins((
            CombatPlugin,
            SpawnPlugin {
                settings: self.settings.clone(),
                create_player_squad: self.config.create_player_squad,
            },
        ));

        app.add_systems(
            Update,
            (advance_skirmish_clock, inflict_attrition)
                .chain()
                .before(apply_casualties),
        )
        .add_systems(
            Update,
            headless_check_skirmish_end.after(drive_spawn_manager),
        )
        .add_systems(PostUpdate, headless_exit_on_complete);
    }
}

fn advance_skirmish_clock(time: Res<Time>, clock: Res<SkirmishClock>) {
    clock.0.advance(time.delta());
}

/// Kill random combatants at the configured average rate.
fn inflict_attrition(
    time: Res<Time>,
    roster: Res<Roster>,
    mut state: ResMut<HeadlessSkirmishState>,
    mut rng: ResMut<AttritionRng>,
    mut casualties: EventWriter<CasualtyEvent>,
) {
    if state.result.is_some() {
        return;
    }
    let mut living: SmallVec<[CombatantId; 64]> = roster
        .0
        .values()
        .filter(|c| c.is_alive() && !c.is_player_proxy)
        .map(|c| c.id)
        .collect();

    let rate = state.casualty_rate_per_sec;
    state.attrition_budget += rate * time.delta_secs();
    if living.is_empty() {
        state.attrition_budget = state.attrition_budget.min(1.0);
        return;
    }

    while state.attrition_budget >= 1.0 {
        let Some(i) = rng.0.index(living.len()) else {
            break;
        };
        let victim = living.swap_remove(i);
        casualties.send(CasualtyEvent { victim, killer: None });
        state.attrition_budget -= 1.0;
        state.casualties_inflicted += 1;
    }
}

/// Track elapsed time and the peak head count; finish at the time limit.
fn headless_check_skirmish_end(
    time: Res<Time>,
    roster: Res<Roster>,
    manager: Res<SpawnManager>,
    mut state: ResMut<HeadlessSkirmishState>,
) {
    if state.result.is_some() {
        return;
    }
    state.elapsed_time += time.delta_secs();
    state.peak_combatants = state.peak_combatants.max(roster.0.len());

    if state.elapsed_time < state.max_duration {
        return;
    }

    let result = SkirmishResult {
        elapsed_secs: state.elapsed_time,
        peak_combatants: state.peak_combatants,
        final_blufor: living_count(&roster.0, Side::Blufor),
        final_opfor: living_count(&roster.0, Side::Opfor),
        squads_remaining: manager.squads().len(),
        casualties_inflicted: state.casualties_inflicted,
        metrics: manager.metrics(),
        random_seed: state.random_seed,
    };
    info!(
        "Skirmish finished after {:.1}s: {} BLUFOR vs {} OPFOR",
        result.elapsed_secs, result.final_blufor, result.final_opfor
    );

    if let Some(path) = &state.output_path {
        match save_skirmish_result(&result, path) {
            Ok(()) => println!("Skirmish complete. Result saved to: {}", path),
            Err(e) => eprintln!("Failed to save skirmish result: {}", e),
        }
    }
    state.result = Some(result);
}

fn save_skirmish_result(result: &SkirmishResult, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Exit the app when the skirmish is complete
fn headless_exit_on_complete(state: Res<HeadlessSkirmishState>, mut exit: EventWriter<AppExit>) {
    if state.result.is_some() {
        exit.send(AppExit::Success);
    }
}

/// Build a windowless app for a skirmish. Does not install logging.
pub fn skirmish_app(config: &HeadlessSkirmishConfig, settings: SpawnSettings) -> App {
    build_app(config, settings, false)
}

fn build_app(config: &HeadlessSkirmishConfig, settings: SpawnSettings, logging: bool) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    if logging {
        app.add_plugins(LogPlugin::default());
    }
    app
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(TICK)))
        .add_plugins(HeadlessPlugin {
            config: config.clone(),
            settings,
        });
    app
}

/// Step an app built by [`skirmish_app`] until its result is ready.
pub fn run_to_completion(app: &mut App) -> Result<SkirmishResult, String> {
    app.finish();
    app.cleanup();

    let max_duration = app.world().resource::<HeadlessSkirmishState>().max_duration;
    // One extra second of ticks covers the zero-length first frame and f32 drift
    let max_ticks = ((max_duration as f64 + 1.0) / TICK).ceil() as usize;

    for _ in 0..max_ticks {
        app.update();
        if let Some(result) = &app.world().resource::<HeadlessSkirmishState>().result {
            return Ok(result.clone());
        }
    }
    Err(format!("Skirmish did not finish within {} ticks", max_ticks))
}

/// Run a headless skirmish with the given configuration
pub fn run_headless_skirmish(config: HeadlessSkirmishConfig) -> Result<SkirmishResult, String> {
    config.validate()?;
    let settings = config.to_spawn_settings()?;

    println!("Starting headless skirmish simulation...");
    println!("  Max combatants: {}", settings.max_combatants);
    println!(
        "  Squad size: {}-{}",
        settings.squad_size_min, settings.squad_size_max
    );
    println!("  Casualty rate: {:.2}/s", config.casualty_rate_per_sec);
    println!("  Zones: {}", config.zones.len());
    println!("  Max duration: {:.0}s", config.max_duration_secs);

    let mut app = build_app(&config, settings, true);
    run_to_completion(&mut app)
}

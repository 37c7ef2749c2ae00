//! Outpost engine binary.
//!
//! Runs the outpost simulation against an in-memory world for a fixed
//! number of ticks and logs what happened.
//!
//! # Usage
//!
//! ```text
//! outpost-engine [config.yaml] [ticks]
//! ```
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration (default `outposts-config.yaml`)
//! 3. Build the outpost registry
//! 4. Seed a world with a player home and a founding caravan
//! 5. Found an outpost
//! 6. Run the tick loop
//! 7. Log a summary

mod error;
mod seed;

use std::collections::BTreeMap;
use std::path::Path;

use outpost_core::{OutpostEvent, OutpostRegistry, SimulationConfig};
use outpost_ledger::ConservationResult;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::seed::SeedConfig;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG: &str = "outposts-config.yaml";

/// Default run length: ten in-game days.
const DEFAULT_TICKS: u64 = 600_000;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, seeding, or founding fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("outpost-engine starting");

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| String::from(DEFAULT_CONFIG));
    let ticks = match args.next() {
        Some(raw) => raw.parse::<u64>().map_err(|e| EngineError::Argument {
            arg: raw.clone(),
            message: e.to_string(),
        })?,
        None => DEFAULT_TICKS,
    };

    // 2. Load configuration.
    let config = load_config(Path::new(&config_path))?;
    let seed_config = load_seed_config(Path::new(&config_path))?;
    info!(
        path = %config_path,
        kinds = config.outpost_kinds.len(),
        items = config.items.len(),
        seed = config.settings.seed,
        "configuration loaded"
    );

    // 3. Build the registry.
    let mut registry = OutpostRegistry::new(config);
    let kind = match &seed_config.outpost_kind {
        Some(name) => registry.kind(name),
        None => registry.kinds().next(),
    }
    .cloned()
    .ok_or_else(|| EngineError::Seed {
        message: String::from("no matching outpost kind configured"),
    })?;

    // 4. Seed the world.
    let mut seeded = seed::seed_world(&seed_config, &kind)?;
    let report = registry.founding_report(&seeded.world, &kind.name, seeded.caravan)?;
    for line in report.lines() {
        info!(requirement = line, "founding check");
    }

    // 5. Found the outpost.
    let id = registry.found(&mut seeded.world, &kind.name, seeded.caravan, "Outpost")?;
    info!(outpost = %id, kind = %kind.name, "outpost founded, entering tick loop");

    // 6. Run.
    let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();
    let mut anomalies = 0u64;
    for _ in 0..ticks {
        let summary = registry.tick_all(&mut seeded.world);
        for event in &summary.events {
            let entry = counts.entry(event_name(event)).or_insert(0);
            *entry = entry.saturating_add(1);
        }
        if let ConservationResult::Anomaly(anomaly) = summary.conservation {
            anomalies = anomalies.saturating_add(1);
            error!(tick = summary.tick, detail = %anomaly.message, "ledger anomaly");
        }
        if registry.outposts().next().is_none() {
            warn!(tick = summary.tick, "no outposts left, stopping early");
            break;
        }
    }

    // 7. Summarize.
    for (event, count) in &counts {
        info!(event, count, "event total");
    }
    if let Ok(text) = registry.inspect(id) {
        for line in text.lines() {
            info!(line, "outpost");
        }
    }
    if let Some(post) = registry.outpost(id) {
        info!(
            kind = post.kind_name(),
            stacks = post.inventory().len(),
            stored_value = %post.inventory().total_value(registry.catalog()),
            "outpost stores"
        );
    }
    if let Some(map) = seeded.world.map(seeded.home) {
        info!(
            ground_stacks = map.ground.len(),
            pods = map.pods.len(),
            "home map"
        );
    }
    info!(
        ticks = registry.tick(),
        ledger_entries = registry.ledger().len(),
        anomalies,
        letters = seeded.world.letters().len(),
        "outpost-engine shutdown complete"
    );
    Ok(())
}

/// Load the simulation configuration, falling back to defaults when the
/// file is missing.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() {
        Ok(SimulationConfig::from_file(path)?)
    } else {
        info!(path = %path.display(), "config file not found, using defaults");
        Ok(SimulationConfig::default())
    }
}

/// Load seeding options from the `seed` section of the config file.
fn load_seed_config(path: &Path) -> Result<SeedConfig, EngineError> {
    if !path.exists() {
        return Ok(SeedConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Seed {
        message: format!("failed to read config file: {e}"),
    })?;
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| EngineError::Seed {
        message: format!("failed to parse config YAML: {e}"),
    })?;
    match raw.get("seed") {
        Some(value) => serde_yml::from_value(value.clone()).map_err(|e| EngineError::Seed {
            message: format!("failed to parse seed config: {e}"),
        }),
        None => Ok(SeedConfig::default()),
    }
}

/// Short name of an event for the run summary.
const fn event_name(event: &OutpostEvent) -> &'static str {
    match event {
        OutpostEvent::Produced { .. } => "produced",
        OutpostEvent::Delivered { .. } => "delivered",
        OutpostEvent::Converted { .. } => "converted",
        OutpostEvent::Abandoned { .. } => "abandoned",
        OutpostEvent::Lost { .. } => "lost",
        OutpostEvent::AgentDied { .. } => "agent_died",
        OutpostEvent::RaidStarted { .. } => "raid_started",
        OutpostEvent::RaidWon { .. } => "raid_won",
    }
}

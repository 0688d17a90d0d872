//! Command-line driver for the Skirmish simulation.

mod telemetry;

use anyhow::{Context, Result};
use skirmish_core::{LogFormat, RunnerConfig};
use skirmish_world::Simulation;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

fn main() -> Result<()> {
    // Load configuration
    let config = load_config()?;

    telemetry::init_telemetry(config.log_format)?;

    let mut sim = Simulation::new(config.simulation.clone())
        .context("failed to build simulation")?;

    println!("Starting simulation...");
    println!(
        "Simulation will run for {} seconds.",
        config.simulation.duration_secs
    );
    info!(run_id = %sim.run_id(), "Starting Skirmish runner");

    sim.start()?;

    // The renderer ends the run at its deadline; the grace period only
    // bounds how long we wait for that.
    let limit = config.simulation.duration() + Duration::from_millis(config.grace_period_ms);
    let started = Instant::now();
    while sim.is_running() && started.elapsed() < limit {
        thread::sleep(Duration::from_millis(100));
    }
    if sim.is_running() {
        warn!("Deadline passed without renderer shutdown, stopping");
    }

    let report = sim.stop();
    info!(
        workers_joined = report.workers_joined,
        worker_panics = report.worker_panics,
        "Workers joined"
    );

    sim.print_survivors();
    if config.log_format == LogFormat::Json {
        let survivors = serde_json::to_string(&sim.survivors())?;
        info!(event = "survivors", survivors = %survivors, "Final survivors");
    }

    Ok(())
}

/// Config path from the first argument or `SKIRMISH_CONFIG`; defaults otherwise.
fn load_config() -> Result<RunnerConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SKIRMISH_CONFIG").ok());

    match path {
        Some(path) => RunnerConfig::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path)),
        None => Ok(RunnerConfig::default()),
    }
}

// src/lib.rs

pub mod cli;
pub mod config;
pub mod cursor;
pub mod detect;
pub mod emit;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod sensor;
pub mod sink;
pub mod source;
pub mod trigger;
pub mod types;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate};
use crate::config::model::ConfigFile;
use crate::cursor::open_store;
use crate::errors::Result;
use crate::fs::RealFileSystem;
use crate::sensor::{PollLoop, Sensor, SensorOptions};
use crate::sink::JsonLinesSink;
use crate::source::DirectorySource;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the directory source (also the payload loader)
/// - the cursor store
/// - the stdout trigger sink
/// - the poll loop, or a single tick with `--once`
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let sensor = build_sensor(&cfg)?;
    let mut poll = PollLoop::new(sensor, JsonLinesSink::stdout(), cfg.timing.interval);

    if args.once {
        let report = poll.run_once().await?;
        info!(
            requests = report.requests,
            failures = report.failures.len(),
            version = report.version,
            "single tick finished"
        );
        return Ok(());
    }

    poll.run_until(shutdown_signal()).await
}

/// Build a sensor over the real filesystem from a validated config.
pub fn build_sensor(cfg: &ConfigFile) -> Result<Sensor> {
    let source = Arc::new(DirectorySource::from_config(cfg, Arc::new(RealFileSystem))?);
    let store = open_store(cfg);

    debug!(dir = ?source.dir(), storage = ?cfg.cursor.storage, "building sensor");

    Ok(Sensor::new(
        SensorOptions::from_config(cfg),
        source.clone(),
        source,
        store,
    ))
}

/// Resolves on Ctrl-C. If the handler cannot be installed the sensor keeps
/// running until killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConfigFile) {
    println!("reqsensor dry-run");
    println!("  sensor.name = {}", cfg.sensor.name);
    println!("  sensor.job = {}", cfg.sensor.job);
    println!("  sensor.interval = {:?}", cfg.timing.interval);
    println!("  sensor.source_timeout = {:?}", cfg.timing.source_timeout);
    println!("  sensor.payload_timeout = {:?}", cfg.timing.payload_timeout);
    println!(
        "  sensor.max_concurrent_loads = {}",
        cfg.sensor.max_concurrent_loads
    );
    println!();

    println!("source:");
    println!("  dir: {}", cfg.source.dir.display());
    println!("  include: {:?}", cfg.source.include);
    if !cfg.source.exclude.is_empty() {
        println!("  exclude: {:?}", cfg.source.exclude);
    }
    println!("  fingerprint: {:?}", cfg.source.fingerprint);
    println!();

    println!("cursor:");
    println!("  storage: {:?}", cfg.cursor.storage);
    println!("  path: {}", cfg.cursor.path.display());

    debug!("dry-run complete (no polling)");
}

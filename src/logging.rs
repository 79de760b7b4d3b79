// src/logging.rs

//! `tracing` subscriber for the `reqsensor` binary.
//!
//! The level comes from `--log-level`, else `REQSENSOR_LOG`, else `info`.
//! Events go to stderr; stdout carries only trigger requests.

use anyhow::{anyhow, Result};
use tracing::{warn, Level};
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV_VAR: &str = "REQSENSOR_LOG";

pub const DEFAULT_LEVEL: Level = Level::INFO;

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let level = resolve_level(cli_level, env_value.as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))?;

    if let (None, Some(raw)) = (cli_level, env_value.as_deref()) {
        if raw.trim().parse::<Level>().is_err() {
            warn!(value = raw, "ignoring unrecognised {LOG_ENV_VAR}; using {level}");
        }
    }
    Ok(())
}

/// Effective level for a CLI flag and an optional `REQSENSOR_LOG` value.
///
/// Env values are case-insensitive (`"debug"`, `"WARN"`); anything
/// unrecognised falls back to [`DEFAULT_LEVEL`].
pub fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    cli_level
        .map(Level::from)
        .or_else(|| env_value.and_then(|raw| raw.trim().parse().ok()))
        .unwrap_or(DEFAULT_LEVEL)
}

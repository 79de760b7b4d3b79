// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile, SensorTiming};
use crate::errors::{Result, SensorError};
use crate::source::patterns::FilePatterns;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SensorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let timing = validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw, timing))
    }
}

/// Upper bound for every `[sensor]` duration. Timer deadlines are computed
/// as `now + duration` and must stay representable.
const MAX_DURATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

fn validate_raw_config(cfg: &RawConfigFile) -> Result<SensorTiming> {
    validate_sensor_section(cfg)?;
    validate_source_section(cfg)?;
    validate_timing(cfg)
}

fn validate_sensor_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.sensor.job.trim().is_empty() {
        return Err(SensorError::ConfigError(
            "[sensor].job must not be empty".to_string(),
        ));
    }

    if cfg.sensor.max_concurrent_loads == 0 {
        return Err(SensorError::ConfigError(
            "[sensor].max_concurrent_loads must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_source_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.source.dir.as_os_str().is_empty() {
        return Err(SensorError::ConfigError(
            "[source].dir must not be empty".to_string(),
        ));
    }

    if cfg.source.include.is_empty() {
        return Err(SensorError::ConfigError(
            "[source].include must contain at least one pattern".to_string(),
        ));
    }

    FilePatterns::compile(&cfg.source.include, &cfg.source.exclude)
        .map_err(|e| SensorError::ConfigError(format!("[source] patterns: {e:#}")))?;

    Ok(())
}

fn validate_timing(cfg: &RawConfigFile) -> Result<SensorTiming> {
    let field = |name: &str, value: &str| -> Result<Duration> {
        let d = parse_duration(value)
            .map_err(|e| SensorError::ConfigError(format!("[sensor].{name}: {e}")))?;
        if d.is_zero() {
            return Err(SensorError::ConfigError(format!(
                "[sensor].{name} must be greater than zero"
            )));
        }
        if d > MAX_DURATION {
            return Err(SensorError::ConfigError(format!(
                "[sensor].{name} must be at most {}",
                humantime::format_duration(MAX_DURATION)
            )));
        }
        Ok(d)
    };

    Ok(SensorTiming {
        interval: field("interval", &cfg.sensor.interval)?,
        source_timeout: field("source_timeout", &cfg.sensor.source_timeout)?,
        payload_timeout: field("payload_timeout", &cfg.sensor.payload_timeout)?,
    })
}

/// Parse a duration such as `"500ms"`, `"30s"`, `"5m"`, `"1h"` or `"1h 30m"`.
///
/// Numbers too large to represent are rejected rather than wrapped.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    humantime::parse_duration(s.trim()).map_err(|e| e.to_string())
}

// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::types::{CursorStorageMode, FingerprintMode};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [sensor]
/// name = "adhoc_sensor"
/// job = "adhoc_job"
/// interval = "30s"
/// source_timeout = "10s"
/// payload_timeout = "5s"
/// max_concurrent_loads = 8
///
/// [source]
/// dir = "datalake_example"
/// include = ["*.json"]
/// exclude = ["*.tmp.json"]
/// fingerprint = "mtime"
///
/// [cursor]
/// storage = "file"
/// path = ".reqsensor/cursor.json"
/// ```
///
/// All sections are optional and have reasonable defaults. This is the raw,
/// unvalidated form; use [`ConfigFile`] everywhere else.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub sensor: SensorSection,

    #[serde(default)]
    pub source: SourceSection,

    #[serde(default)]
    pub cursor: CursorSection,
}

/// `[sensor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorSection {
    /// Name used in logs.
    #[serde(default = "default_sensor_name")]
    pub name: String,

    /// Downstream job every trigger request targets. Also namespaces the
    /// idempotency keys.
    #[serde(default = "default_job")]
    pub job: String,

    /// Time between ticks, e.g. `"30s"`.
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Upper bound on a single enumeration of the source.
    #[serde(default = "default_source_timeout")]
    pub source_timeout: String,

    /// Upper bound on loading one item's payload.
    #[serde(default = "default_payload_timeout")]
    pub payload_timeout: String,

    /// How many payloads may be loaded in parallel within one tick.
    #[serde(default = "default_max_concurrent_loads")]
    pub max_concurrent_loads: usize,
}

fn default_sensor_name() -> String {
    "adhoc_sensor".to_string()
}

fn default_job() -> String {
    "adhoc_job".to_string()
}

fn default_interval() -> String {
    "30s".to_string()
}

fn default_source_timeout() -> String {
    "10s".to_string()
}

fn default_payload_timeout() -> String {
    "5s".to_string()
}

fn default_max_concurrent_loads() -> usize {
    8
}

impl Default for SensorSection {
    fn default() -> Self {
        Self {
            name: default_sensor_name(),
            job: default_job(),
            interval: default_interval(),
            source_timeout: default_source_timeout(),
            payload_timeout: default_payload_timeout(),
            max_concurrent_loads: default_max_concurrent_loads(),
        }
    }
}

/// `[source]` section: the watched directory.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSection {
    /// Directory holding the request files. Relative paths are resolved
    /// against the config file's directory.
    #[serde(default = "default_source_dir")]
    pub dir: PathBuf,

    /// Glob patterns a file name must match to be watched.
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Glob patterns that remove otherwise included files.
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub fingerprint: FingerprintMode,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("datalake_example")
}

fn default_include() -> Vec<String> {
    vec!["*.json".to_string()]
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            dir: default_source_dir(),
            include: default_include(),
            exclude: Vec::new(),
            fingerprint: FingerprintMode::default(),
        }
    }
}

/// `[cursor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CursorSection {
    #[serde(default)]
    pub storage: CursorStorageMode,

    /// Cursor file location (only used with `storage = "file"`).
    #[serde(default = "default_cursor_path")]
    pub path: PathBuf,
}

fn default_cursor_path() -> PathBuf {
    PathBuf::from(".reqsensor/cursor.json")
}

impl Default for CursorSection {
    fn default() -> Self {
        Self {
            storage: CursorStorageMode::default(),
            path: default_cursor_path(),
        }
    }
}

/// Parsed durations from `[sensor]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorTiming {
    pub interval: Duration,
    pub source_timeout: Duration,
    pub payload_timeout: Duration,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// durations are known to parse and glob patterns are known to compile.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub sensor: SensorSection,
    pub source: SourceSection,
    pub cursor: CursorSection,
    pub timing: SensorTiming,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile, timing: SensorTiming) -> Self {
        Self {
            sensor: raw.sensor,
            source: raw.source,
            cursor: raw.cursor,
            timing,
        }
    }

    /// Resolve relative `source.dir` and `cursor.path` against `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        if self.source.dir.is_relative() {
            self.source.dir = base.join(&self.source.dir);
        }
        if self.cursor.path.is_relative() {
            self.cursor.path = base.join(&self.cursor.path);
        }
        self
    }
}

// src/source/directory.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use anyhow::Context;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::config::ConfigFile;
use crate::errors::{Result, SensorError};
use crate::fs::FileSystem;
use crate::source::hash::compute_file_hash;
use crate::source::patterns::FilePatterns;
use crate::source::{ChangeSource, PayloadLoader};
use crate::trigger::Payload;
use crate::types::{Enumeration, Fingerprint, FingerprintMode, ItemId, Observation};

/// Payload field carrying the request file's name.
pub const FILENAME_FIELD: &str = "filename";

/// Watches the regular files directly inside one directory.
///
/// Identity is the file name, fingerprint is either the modification time or
/// a content hash, and the payload is the file's JSON object.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
    patterns: FilePatterns,
    mode: FingerprintMode,
}

impl DirectorySource {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        dir: impl Into<PathBuf>,
        patterns: FilePatterns,
        mode: FingerprintMode,
    ) -> Self {
        Self {
            fs,
            dir: dir.into(),
            patterns,
            mode,
        }
    }

    /// Build from the `[source]` section of a validated config.
    pub fn from_config(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let patterns = FilePatterns::compile(&cfg.source.include, &cfg.source.exclude)?;
        Ok(Self::new(
            fs,
            cfg.source.dir.clone(),
            patterns,
            cfg.source.fingerprint,
        ))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn fingerprint(&self, path: &Path) -> anyhow::Result<Fingerprint> {
        match self.mode {
            FingerprintMode::Mtime => {
                let modified = self.fs.modified(path)?;
                let nanos = modified
                    .duration_since(UNIX_EPOCH)
                    .with_context(|| format!("modification time of {:?} predates epoch", path))?
                    .as_nanos();
                Ok(Fingerprint::new(nanos.to_string()))
            }
            FingerprintMode::Hash => Ok(Fingerprint::new(compute_file_hash(
                self.fs.as_ref(),
                path,
            )?)),
        }
    }
}

impl ChangeSource for DirectorySource {
    fn enumerate(&self) -> Result<Enumeration> {
        let entries = self
            .fs
            .read_dir(&self.dir)
            .map_err(|e| SensorError::SourceUnavailable(format!("{e:#}")))?;

        let mut enumeration = Enumeration::default();
        for path in entries {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                trace!(?path, "skipping entry with non-UTF-8 name");
                continue;
            };
            if !self.patterns.matches(name) || !self.fs.is_file(&path) {
                continue;
            }

            match self.fingerprint(&path) {
                Ok(fingerprint) => enumeration
                    .observations
                    .push(Observation::new(name, fingerprint)),
                Err(e) => {
                    warn!(
                        id = name,
                        error = %format!("{e:#}"),
                        "cannot fingerprint item; keeping its previous state"
                    );
                    enumeration.unreadable.push(ItemId::from(name));
                }
            }
        }

        debug!(
            dir = ?self.dir,
            observed = enumeration.observations.len(),
            unreadable = enumeration.unreadable.len(),
            "enumerated source"
        );
        Ok(enumeration)
    }
}

impl PayloadLoader for DirectorySource {
    fn load(&self, id: &ItemId) -> Result<Payload> {
        let path = self.dir.join(id.as_str());

        let contents = self
            .fs
            .read_to_string(&path)
            .map_err(|e| SensorError::payload(id, format!("{e:#}")))?;

        let document: Value = serde_json::from_str(&contents)
            .map_err(|e| SensorError::payload(id, format!("invalid JSON: {e}")))?;

        let fields = match document {
            Value::Object(fields) => fields,
            other => {
                return Err(SensorError::payload(
                    id,
                    format!("expected a JSON object, found {}", json_kind(&other)),
                ));
            }
        };

        // Fields from the document win over the injected file name.
        let mut payload = Payload::new();
        payload.insert(FILENAME_FIELD.to_string(), Value::String(id.to_string()));
        payload.extend(fields);
        Ok(payload)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

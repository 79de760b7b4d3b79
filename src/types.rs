// src/types.rs

//! Core data model shared by every stage of a tick.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Stable identity of a watched item (a file name relative to the watched
/// directory). Unique within one namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        ItemId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

/// Opaque observed state of an item (modification time or content hash).
///
/// Only equality is meaningful. Persisted cursors may carry numeric
/// fingerprints (e.g. float modification times); those decode to their
/// decimal text so that they compare equal to themselves across reloads.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(fp: impl Into<String>) -> Self {
        Fingerprint(fp.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Fingerprint(s.to_string())
    }
}

impl From<u64> for Fingerprint {
    fn from(n: u64) -> Self {
        Fingerprint(n.to_string())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Fingerprint(s),
            Raw::Number(n) => Fingerprint(n.to_string()),
        })
    }
}

/// One enumerated item: identity plus its current fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub id: ItemId,
    pub fingerprint: Fingerprint,
}

impl Observation {
    pub fn new(id: impl Into<ItemId>, fingerprint: impl Into<Fingerprint>) -> Self {
        Self {
            id: id.into(),
            fingerprint: fingerprint.into(),
        }
    }
}

/// One pass over the watched namespace.
///
/// `unreadable` lists items that were present but could not be fingerprinted
/// this tick. They are neither new nor removed; the tick keeps whatever
/// fingerprint the snapshot already holds for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enumeration {
    pub observations: Vec<Observation>,
    pub unreadable: Vec<ItemId>,
}

impl From<Vec<Observation>> for Enumeration {
    fn from(observations: Vec<Observation>) -> Self {
        Self {
            observations,
            unreadable: Vec::new(),
        }
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId(s)
    }
}

impl From<String> for Fingerprint {
    fn from(s: String) -> Self {
        Fingerprint(s)
    }
}

/// What the sensor has already accounted for.
///
/// Replaced wholesale at the end of every successful tick; never patched.
pub type Snapshot = BTreeMap<ItemId, Fingerprint>;

/// How the directory source fingerprints a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintMode {
    /// Last-modified time, integer nanoseconds since the Unix epoch.
    Mtime,
    /// BLAKE3 hash of the file contents.
    Hash,
}

impl Default for FingerprintMode {
    fn default() -> Self {
        FingerprintMode::Mtime
    }
}

impl FromStr for FingerprintMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mtime" => Ok(FingerprintMode::Mtime),
            "hash" => Ok(FingerprintMode::Hash),
            other => Err(format!(
                "invalid fingerprint mode: {other} (expected \"mtime\" or \"hash\")"
            )),
        }
    }
}

/// Where the cursor lives between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorStorageMode {
    /// Store the cursor in a JSON file (default `.reqsensor/cursor.json`).
    File,
    /// Keep the cursor in memory only (lost on restart).
    Memory,
}

impl Default for CursorStorageMode {
    fn default() -> Self {
        CursorStorageMode::File
    }
}

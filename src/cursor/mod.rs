// src/cursor/mod.rs

//! Cursor persistence: the snapshot the sensor has already accounted for.
//!
//! Every store implements optimistic concurrency: [`CursorStore::commit`]
//! names the version it loaded, and the commit is rejected with
//! [`SensorError::StoreConflict`](crate::errors::SensorError) if another
//! commit landed in between. Commits are all-or-nothing; a reader sees either
//! the old cursor or the new one.

pub mod file;
pub mod memory;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::types::{CursorStorageMode, Snapshot};

pub use file::FileCursorStore;
pub use memory::MemoryCursorStore;

/// Persisted snapshot plus the version used for optimistic concurrency.
///
/// A store that has never been committed to loads as version 0 with an empty
/// snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub version: u64,
    pub snapshot: Snapshot,
}

/// Abstract storage for the sensor cursor.
pub trait CursorStore: Send + Sync {
    /// Current cursor, or version 0 / empty snapshot on first run.
    fn load(&self) -> Result<Cursor>;

    /// Replace the stored snapshot if the stored version still equals
    /// `expected_version`. Returns the new version (`expected_version + 1`).
    fn commit(&self, expected_version: u64, snapshot: Snapshot) -> Result<u64>;
}

/// Build the store selected by `[cursor].storage`.
pub fn open_store(cfg: &ConfigFile) -> Arc<dyn CursorStore> {
    match cfg.cursor.storage {
        CursorStorageMode::File => Arc::new(FileCursorStore::new(cfg.cursor.path.clone())),
        CursorStorageMode::Memory => Arc::new(MemoryCursorStore::new()),
    }
}

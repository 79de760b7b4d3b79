// src/cursor/memory.rs

use std::sync::Mutex;

use tracing::info;

use crate::cursor::{Cursor, CursorStore};
use crate::errors::{Result, SensorError};
use crate::types::Snapshot;

/// Keeps the cursor in memory only.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    cursor: Mutex<Cursor>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CursorStore for MemoryCursorStore {
    fn load(&self) -> Result<Cursor> {
        let cursor = self
            .cursor
            .lock()
            .map_err(|_| SensorError::Store("memory cursor lock poisoned".to_string()))?;
        Ok(cursor.clone())
    }

    fn commit(&self, expected_version: u64, snapshot: Snapshot) -> Result<u64> {
        let mut cursor = self
            .cursor
            .lock()
            .map_err(|_| SensorError::Store("memory cursor lock poisoned".to_string()))?;

        if cursor.version != expected_version {
            return Err(SensorError::StoreConflict(format!(
                "expected version {expected_version}, found {}",
                cursor.version
            )));
        }

        let version = expected_version + 1;
        *cursor = Cursor { version, snapshot };
        info!(version, items = cursor.snapshot.len(), "committed cursor (memory)");
        Ok(version)
    }
}

// src/cursor/file.rs

//! JSON-file cursor store.
//!
//! # Layout
//!
//! ```text
//! <path>          # {"version": 3, "snapshot": {"a.json": "1712..."}}
//! <path>.lock     # advisory lock held for the duration of a commit
//! <path>.tmp      # scratch file, renamed over <path> on commit
//! ```
//!
//! A bare mapping `{"a.json": 1712345678.25}` (the legacy cursor format,
//! where fingerprints were float modification times) is accepted on load and
//! treated as version 0.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::cursor::{Cursor, CursorStore};
use crate::errors::{Result, SensorError};
use crate::types::Snapshot;

/// Stores the cursor in a single JSON file, replaced atomically on commit.
#[derive(Debug, Clone)]
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("cursor"));
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn ensure_parent(&self) -> Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
                .map_err(|e| store_io("creating cursor directory", parent, e)),
            _ => Ok(()),
        }
    }

    fn read_cursor(&self) -> Result<Cursor> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Cursor::default()),
            Err(e) => return Err(store_io("reading cursor", &self.path, e)),
        };

        decode_cursor(&content).map_err(|e| {
            SensorError::Store(format!("decoding cursor at {:?}: {e}", self.path))
        })
    }

    /// Write to the scratch file, fsync, rename over the cursor, fsync the
    /// directory.
    fn write_atomic(&self, cursor: &Cursor) -> Result<()> {
        let temp_path = self.sibling("tmp");

        let content = serde_json::to_vec_pretty(cursor)
            .map_err(|e| SensorError::Store(format!("encoding cursor: {e}")))?;

        let mut file =
            File::create(&temp_path).map_err(|e| store_io("creating", &temp_path, e))?;
        file.write_all(&content)
            .and_then(|_| file.sync_all())
            .map_err(|e| store_io("writing", &temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &self.path)
            .map_err(|e| store_io("renaming cursor into place at", &self.path, e))?;

        sync_parent_dir(&self.path).map_err(|e| store_io("syncing directory of", &self.path, e))
    }
}

impl CursorStore for FileCursorStore {
    fn load(&self) -> Result<Cursor> {
        let cursor = self.read_cursor()?;
        debug!(
            path = ?self.path,
            version = cursor.version,
            items = cursor.snapshot.len(),
            "loaded cursor (file)"
        );
        Ok(cursor)
    }

    fn commit(&self, expected_version: u64, snapshot: Snapshot) -> Result<u64> {
        self.ensure_parent()?;
        let _lock = CommitLock::acquire(&self.sibling("lock"))?;

        let current = self.read_cursor()?;
        if current.version != expected_version {
            return Err(SensorError::StoreConflict(format!(
                "expected version {expected_version}, found {} in {:?}",
                current.version, self.path
            )));
        }

        let cursor = Cursor {
            version: expected_version + 1,
            snapshot,
        };
        self.write_atomic(&cursor)?;

        info!(
            path = ?self.path,
            version = cursor.version,
            items = cursor.snapshot.len(),
            "committed cursor (file)"
        );
        Ok(cursor.version)
    }
}

/// Decode either the versioned document or a legacy bare mapping.
fn decode_cursor(content: &str) -> serde_json::Result<Cursor> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Versioned(Cursor),
        Legacy(Snapshot),
    }

    Ok(match serde_json::from_str(content)? {
        Stored::Versioned(cursor) => cursor,
        Stored::Legacy(snapshot) => Cursor {
            version: 0,
            snapshot,
        },
    })
}

fn store_io(action: &str, path: &Path, e: io::Error) -> SensorError {
    SensorError::Store(format!("{action} {:?}: {e}", path))
}

/// Exclusive advisory lock on `<path>.lock`, released on drop.
struct CommitLock {
    _file: File,
}

impl CommitLock {
    fn acquire(lock_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .map_err(|e| store_io("opening lock file", lock_path, e))?;

        if let Err(err) = try_lock_exclusive(&file) {
            if err.kind() == io::ErrorKind::WouldBlock {
                return Err(SensorError::StoreConflict(format!(
                    "cursor is being committed by another process ({:?} is locked)",
                    lock_path
                )));
            }
            return Err(store_io("locking", lock_path, err));
        }

        Ok(Self { _file: file })
    }
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
    use rustix::fs::{flock, FlockOperation};
    use std::os::unix::io::AsFd;

    flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive)
        .map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

// Without flock the version check still catches stale commits from
// sequential writers; only truly simultaneous cross-process commits are
// unguarded.
#[cfg(not(unix))]
fn try_lock_exclusive(_file: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    OpenOptions::new().read(true).open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

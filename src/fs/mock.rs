// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File {
        content: Vec<u8>,
        modified: SystemTime,
    },
    Dir(Vec<String>), // List of child names
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    /// Logical clock; every write advances it by one second so that
    /// rewriting a file always changes its modification time.
    clock: u64,
    /// Files that are listed but refuse to be read or stat'ed.
    denied: HashSet<PathBuf>,
}

/// In-memory filesystem for tests.
///
/// Clones share the same underlying state, so a test can keep a handle and
/// mutate files between ticks while the source holds another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut state = MockState::default();
        // Ensure root exists
        state
            .entries
            .insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Create or overwrite a file, bumping its modification time.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.state.lock().unwrap();
        state.clock += 1;
        let modified = UNIX_EPOCH + Duration::from_secs(state.clock);
        state.entries.insert(
            path.clone(),
            MockEntry::File {
                content: content.into(),
                modified,
            },
        );
        Self::link_into_parent(&mut state.entries, &path);
    }

    /// Create an (empty) directory.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.state.lock().unwrap();
        Self::ensure_dir_entry(&mut state.entries, &path);
    }

    /// Replace a file's content without touching its modification time.
    pub fn overwrite_preserving_mtime(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut state = self.state.lock().unwrap();
        if let Some(MockEntry::File { content: c, .. }) = state.entries.get_mut(path.as_ref()) {
            *c = content.into();
        }
    }

    /// Make a file unreadable (permission denied) until [`Self::allow`].
    pub fn deny(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.denied.insert(path.as_ref().to_path_buf());
    }

    pub fn allow(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.denied.remove(path.as_ref());
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.state.lock().unwrap();
        state.entries.remove(path);
        let parent = parent_or_root(path);
        if let (Some(MockEntry::Dir(children)), Some(name)) = (
            state.entries.get_mut(parent),
            path.file_name().and_then(|n| n.to_str()),
        ) {
            children.retain(|c| c != name);
        }
    }

    fn link_into_parent(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let parent = parent_or_root(path);
        if parent == path {
            return;
        }
        Self::ensure_dir_entry(entries, parent);
        if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !children.contains(&name.to_string()) {
                    children.push(name.to_string());
                }
            }
        }
    }

    fn ensure_dir_entry(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if entries.contains_key(path) {
            return;
        }
        entries.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        Self::link_into_parent(entries, path);
    }
}

fn parent_or_root(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => path,
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let state = self.state.lock().unwrap();
        if state.denied.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        match state.entries.get(path) {
            Some(MockEntry::File { content, .. }) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let state = self.state.lock().unwrap();
        if state.denied.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        match state.entries.get(path) {
            Some(MockEntry::File { content, .. }) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn is_file(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.entries.get(path), Some(MockEntry::File { .. }))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        let state = self.state.lock().unwrap();
        if state.denied.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        match state.entries.get(path) {
            Some(MockEntry::File { modified, .. }) => Ok(*modified),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state.lock().unwrap();
        match state.entries.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}

// src/source/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled include/exclude glob patterns for item names.
///
/// Patterns are matched against the file name relative to the watched
/// directory (e.g. `"request_01.json"`), never against absolute paths.
#[derive(Clone)]
pub struct FilePatterns {
    include_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for FilePatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePatterns")
            .field("include", &self.include_set.len())
            .field("exclude", &self.exclude_set.as_ref().map(GlobSet::len))
            .finish()
    }
}

impl FilePatterns {
    pub fn compile(include: &[String], exclude: &[String]) -> Result<Self> {
        let include_set = build_globset(include).context("building include globset")?;

        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };

        Ok(Self {
            include_set,
            exclude_set,
        })
    }

    /// Returns true if an item with this name should be watched.
    pub fn matches(&self, name: &str) -> bool {
        if !self.include_set.is_match(name) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(name) {
                return false;
            }
        }
        true
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

// src/detect.rs

//! Change detection: classify the current enumeration against the previous
//! snapshot.
//!
//! This is a pure function with no IO, so it can be exercised directly in
//! tests without a source or a store.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, warn};

use crate::types::{Enumeration, Fingerprint, ItemId, Observation, Snapshot};

/// How an item changed since the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Identity absent from the previous snapshot.
    New,
    /// Identity present with a different fingerprint.
    Modified,
    /// Identity present with an equal fingerprint.
    Unchanged,
    /// Identity in the previous snapshot but no longer enumerated.
    Removed,
}

impl Classification {
    /// Only new and modified items cause downstream work.
    pub fn triggers(self) -> bool {
        matches!(self, Classification::New | Classification::Modified)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Classification::New => "new",
            Classification::Modified => "modified",
            Classification::Unchanged => "unchanged",
            Classification::Removed => "removed",
        };
        f.write_str(s)
    }
}

/// One classified item. For `Removed` records the fingerprint is the one
/// last recorded in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub id: ItemId,
    pub fingerprint: Fingerprint,
    pub classification: Classification,
}

/// Per-classification totals, mostly for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeCounts {
    pub new: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub removed: usize,
}

impl ChangeCounts {
    pub fn from_records(records: &[ChangeRecord]) -> Self {
        let mut counts = Self::default();
        for record in records {
            match record.classification {
                Classification::New => counts.new += 1,
                Classification::Modified => counts.modified += 1,
                Classification::Unchanged => counts.unchanged += 1,
                Classification::Removed => counts.removed += 1,
            }
        }
        counts
    }
}

/// Classify `current` against `previous`.
///
/// Every identity in either input appears exactly once in the output. If the
/// enumeration repeats an identity, the first occurrence wins.
/// Record order is unspecified.
pub fn diff<I>(previous: &Snapshot, current: I) -> Vec<ChangeRecord>
where
    I: IntoIterator<Item = Observation>,
{
    let mut remaining = previous.clone();
    let mut seen: HashSet<ItemId> = HashSet::new();
    let mut records = Vec::new();

    for Observation { id, fingerprint } in current {
        if !seen.insert(id.clone()) {
            warn!(id = %id, "identity enumerated twice; ignoring repeat");
            continue;
        }

        let classification = match remaining.remove(&id) {
            None => Classification::New,
            Some(prev) if prev == fingerprint => Classification::Unchanged,
            Some(_) => Classification::Modified,
        };

        records.push(ChangeRecord {
            id,
            fingerprint,
            classification,
        });
    }

    records.extend(remaining.into_iter().map(|(id, fingerprint)| ChangeRecord {
        id,
        fingerprint,
        classification: Classification::Removed,
    }));

    records
}

/// Flatten an enumeration into observations for [`diff`].
///
/// Unreadable items are pinned to their fingerprint in `previous`, so they
/// classify as unchanged. An unreadable item with no previous fingerprint is
/// left out and picked up once it can be read.
pub fn observe(previous: &Snapshot, enumeration: Enumeration) -> Vec<Observation> {
    let Enumeration {
        mut observations,
        unreadable,
    } = enumeration;

    for id in unreadable {
        match previous.get(&id) {
            Some(fingerprint) => {
                let fingerprint = fingerprint.clone();
                observations.push(Observation { id, fingerprint });
            }
            None => debug!(id = %id, "unreadable item not yet in snapshot; skipping"),
        }
    }
    observations
}

// src/emit.rs

//! Trigger emission: turn classified changes into trigger requests and the
//! snapshot to commit.
//!
//! Payload failures are isolated per item. A failed item produces no request
//! and is left out of the returned snapshot, so the next tick sees it as
//! new/modified again and retries it.

use tracing::{debug, warn};

use crate::detect::{ChangeRecord, Classification};
use crate::errors::{Result, SensorError};
use crate::trigger::{Payload, TriggerRequest};
use crate::types::{Fingerprint, ItemId, Snapshot};

/// An item whose payload could not be loaded this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadFailure {
    pub id: ItemId,
    pub fingerprint: Fingerprint,
    pub reason: String,
}

/// Result of one emission pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Emission {
    pub requests: Vec<TriggerRequest>,
    /// Snapshot to commit: unchanged items plus successfully emitted items.
    pub snapshot: Snapshot,
    pub failures: Vec<PayloadFailure>,
}

/// Build trigger requests for `job` from `records`.
///
/// `load` is called once per new or modified identity and never for
/// unchanged or removed ones.
pub fn emit<F>(job: &str, records: &[ChangeRecord], mut load: F) -> Emission
where
    F: FnMut(&ItemId) -> Result<Payload>,
{
    let mut emission = Emission::default();

    for record in records {
        match record.classification {
            Classification::Unchanged => {
                emission
                    .snapshot
                    .insert(record.id.clone(), record.fingerprint.clone());
            }
            Classification::Removed => {
                debug!(id = %record.id, "item removed; dropping from snapshot");
            }
            Classification::New | Classification::Modified => match load(&record.id) {
                Ok(payload) => {
                    let request = TriggerRequest::new(
                        job,
                        record.id.clone(),
                        record.fingerprint.clone(),
                        payload,
                    );
                    debug!(
                        id = %record.id,
                        change = %record.classification,
                        key = %request.idempotency_key,
                        "emitting trigger request"
                    );
                    emission
                        .snapshot
                        .insert(record.id.clone(), record.fingerprint.clone());
                    emission.requests.push(request);
                }
                Err(err) => {
                    let reason = match err {
                        SensorError::PayloadError { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    warn!(
                        id = %record.id,
                        fingerprint = %record.fingerprint,
                        %reason,
                        "payload failed to load; will retry next tick"
                    );
                    emission.failures.push(PayloadFailure {
                        id: record.id.clone(),
                        fingerprint: record.fingerprint.clone(),
                        reason,
                    });
                }
            },
        }
    }

    emission
}

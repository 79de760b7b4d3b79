// src/trigger.rs

//! Trigger requests and their idempotency keys.
//!
//! # Key format
//!
//! `<job>:<identity>:<fingerprint>`
//!
//! Each component has `\` escaped as `\\` and `:` escaped as `\:` before
//! joining, so two different (job, identity, fingerprint) triples can never
//! render to the same key. For example a file named `a:b` with fingerprint
//! `1` yields `adhoc_job:a\:b:1`, which is distinct from file `a` with
//! fingerprint `b:1` (`adhoc_job:a:b\:1`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Fingerprint, ItemId};

/// Structured data handed downstream with a trigger request.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Deduplication key for a trigger request.
///
/// Derived only from (job, identity, fingerprint), so it is stable across
/// process restarts and repeated evaluations of the same tick.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn derive(job: &str, id: &ItemId, fingerprint: &Fingerprint) -> Self {
        IdempotencyKey(format!(
            "{}:{}:{}",
            escape(job),
            escape(id.as_str()),
            escape(fingerprint.as_str())
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Backslashes first, then colons.
fn escape(component: &str) -> String {
    component.replace('\\', "\\\\").replace(':', "\\:")
}

/// A request for the downstream job to run once for one observed change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerRequest {
    pub idempotency_key: IdempotencyKey,
    pub job: String,
    pub payload: Payload,
    #[serde(skip)]
    pub id: ItemId,
    #[serde(skip)]
    pub fingerprint: Fingerprint,
}

impl TriggerRequest {
    pub fn new(job: &str, id: ItemId, fingerprint: Fingerprint, payload: Payload) -> Self {
        Self {
            idempotency_key: IdempotencyKey::derive(job, &id, &fingerprint),
            job: job.to_string(),
            payload,
            id,
            fingerprint,
        }
    }
}

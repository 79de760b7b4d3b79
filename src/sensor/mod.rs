// src/sensor/mod.rs

//! The sensor: one tick of change detection, plus the loop that repeats it.
//!
//! A tick is:
//!
//! 1. load the cursor,
//! 2. enumerate the source (bounded by `source_timeout`),
//! 3. [`diff`](crate::detect::diff) against the cursor's snapshot, with
//!    unreadable items held at their previous fingerprint,
//! 4. load payloads for new/modified items in parallel, each bounded by
//!    `payload_timeout`,
//! 5. [`emit`](crate::emit::emit) requests and the next snapshot,
//! 6. deliver the requests to a [`TriggerSink`],
//! 7. commit the snapshot against the version loaded in step 1.
//!
//! Steps 1-5 make up [`Sensor::evaluate`], which has no side effects, so
//! evaluating twice without committing yields the same idempotency keys.
//! The pure parts live in [`detect`](crate::detect) and
//! [`emit`](crate::emit); this module only adds IO, timeouts and
//! concurrency around them.

pub mod runtime;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::cursor::CursorStore;
use crate::detect::{diff, observe, ChangeCounts, ChangeRecord};
use crate::emit::{emit, Emission, PayloadFailure};
use crate::errors::{Result, SensorError};
use crate::sink::TriggerSink;
use crate::source::{ChangeSource, PayloadLoader};
use crate::trigger::Payload;
use crate::types::{Enumeration, ItemId, Snapshot};

pub use runtime::PollLoop;

/// Knobs for a single sensor, usually taken from `[sensor]`.
#[derive(Debug, Clone)]
pub struct SensorOptions {
    pub name: String,
    pub job: String,
    pub source_timeout: Duration,
    pub payload_timeout: Duration,
    pub max_concurrent_loads: usize,
}

impl SensorOptions {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            name: cfg.sensor.name.clone(),
            job: cfg.sensor.job.clone(),
            source_timeout: cfg.timing.source_timeout,
            payload_timeout: cfg.timing.payload_timeout,
            max_concurrent_loads: cfg.sensor.max_concurrent_loads.max(1),
        }
    }
}

/// Everything a tick decided, before anything was delivered or committed.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Cursor version the evaluation was based on.
    pub base_version: u64,
    pub previous: Snapshot,
    pub records: Vec<ChangeRecord>,
    pub emission: Emission,
}

impl Evaluation {
    /// True when committing would not change the stored cursor.
    pub fn is_noop(&self) -> bool {
        self.emission.requests.is_empty() && self.emission.snapshot == self.previous
    }
}

/// Outcome of a successful tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub counts: ChangeCounts,
    pub requests: usize,
    pub failures: Vec<PayloadFailure>,
    /// Cursor version after the tick.
    pub version: u64,
    /// False when nothing changed and the commit was skipped.
    pub committed: bool,
}

/// Async shell around the pure detector/emitter.
pub struct Sensor {
    options: SensorOptions,
    source: Arc<dyn ChangeSource>,
    loader: Arc<dyn PayloadLoader>,
    store: Arc<dyn CursorStore>,
}

impl std::fmt::Debug for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sensor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Sensor {
    pub fn new(
        options: SensorOptions,
        source: Arc<dyn ChangeSource>,
        loader: Arc<dyn PayloadLoader>,
        store: Arc<dyn CursorStore>,
    ) -> Self {
        Self {
            options,
            source,
            loader,
            store,
        }
    }

    pub fn options(&self) -> &SensorOptions {
        &self.options
    }

    /// Load, enumerate, diff, load payloads and emit. Writes nothing.
    pub async fn evaluate(&self) -> Result<Evaluation> {
        let base = self.load_cursor().await?;
        let current = self.enumerate().await?;

        let records = diff(&base.snapshot, observe(&base.snapshot, current));
        let mut payloads = self.load_payloads(&records).await;

        let emission = emit(&self.options.job, &records, |id| {
            payloads
                .remove(id)
                .unwrap_or_else(|| Err(SensorError::payload(id, "payload load did not complete")))
        });

        Ok(Evaluation {
            base_version: base.version,
            previous: base.snapshot,
            records,
            emission,
        })
    }

    /// Commit the evaluation's snapshot against the version it was based on.
    pub async fn commit(&self, evaluation: &Evaluation) -> Result<u64> {
        let store = Arc::clone(&self.store);
        let expected = evaluation.base_version;
        let snapshot = evaluation.emission.snapshot.clone();

        tokio::task::spawn_blocking(move || store.commit(expected, snapshot))
            .await
            .map_err(|e| SensorError::Other(anyhow!("cursor commit task failed: {e}")))?
    }

    /// Run one full tick: evaluate, deliver, commit.
    ///
    /// On any error the cursor is left as it was.
    pub async fn tick<S>(&self, sink: &mut S) -> Result<TickReport>
    where
        S: TriggerSink + ?Sized,
    {
        let evaluation = self.evaluate().await?;
        let requests = evaluation.emission.requests.clone();
        let request_count = requests.len();

        if !requests.is_empty() {
            sink.deliver(requests).await?;
        }

        let (version, committed) = if evaluation.is_noop() {
            debug!(version = evaluation.base_version, "nothing changed; skipping commit");
            (evaluation.base_version, false)
        } else {
            (self.commit(&evaluation).await?, true)
        };

        let counts = ChangeCounts::from_records(&evaluation.records);
        info!(
            sensor = %self.options.name,
            new = counts.new,
            modified = counts.modified,
            unchanged = counts.unchanged,
            removed = counts.removed,
            requests = request_count,
            failures = evaluation.emission.failures.len(),
            version,
            "tick complete"
        );

        Ok(TickReport {
            counts,
            requests: request_count,
            failures: evaluation.emission.failures,
            version,
            committed,
        })
    }

    async fn load_cursor(&self) -> Result<crate::cursor::Cursor> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.load())
            .await
            .map_err(|e| SensorError::Other(anyhow!("cursor load task failed: {e}")))?
    }

    async fn enumerate(&self) -> Result<Enumeration> {
        let source = Arc::clone(&self.source);
        let limit = self.options.source_timeout;
        let task = tokio::task::spawn_blocking(move || source.enumerate());

        match timeout(limit, task).await {
            Err(_) => Err(SensorError::SourceUnavailable(format!(
                "enumeration timed out after {limit:?}"
            ))),
            Ok(Err(join)) => Err(SensorError::SourceUnavailable(format!(
                "enumeration task failed: {join}"
            ))),
            Ok(Ok(result)) => result,
        }
    }

    /// Load payloads for every new/modified record concurrently.
    ///
    /// Each load gets its own timeout; one slow or failing item never affects
    /// its siblings. Results are collected at a single join point.
    async fn load_payloads(&self, records: &[ChangeRecord]) -> HashMap<ItemId, Result<Payload>> {
        let permits = Arc::new(Semaphore::new(self.options.max_concurrent_loads));
        let limit = self.options.payload_timeout;
        let mut tasks = JoinSet::new();

        for record in records.iter().filter(|r| r.classification.triggers()) {
            let id = record.id.clone();
            let loader = Arc::clone(&self.loader);
            let permits = Arc::clone(&permits);

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;

                let load_id = id.clone();
                let load = tokio::task::spawn_blocking(move || loader.load(&load_id));
                let result = match timeout(limit, load).await {
                    Err(_) => Err(SensorError::payload(&id, format!("timed out after {limit:?}"))),
                    Ok(Err(join)) => {
                        Err(SensorError::payload(&id, format!("loader task failed: {join}")))
                    }
                    Ok(Ok(result)) => result,
                };
                (id, result)
            });
        }

        let mut results = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, result)) => {
                    results.insert(id, result);
                }
                Err(e) => warn!(error = %e, "payload task aborted"),
            }
        }
        results
    }
}

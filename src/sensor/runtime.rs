// src/sensor/runtime.rs

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::errors::{Result, SensorError};
use crate::sink::TriggerSink;

use super::{Sensor, TickReport};

/// Drives a [`Sensor`] on a fixed interval.
///
/// Ticks never overlap: the next tick is only started once the previous one
/// has finished, and ticks that fall behind are delayed rather than bursted.
pub struct PollLoop<S: TriggerSink> {
    sensor: Sensor,
    sink: S,
    interval: Duration,
}

impl<S: TriggerSink> std::fmt::Debug for PollLoop<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollLoop")
            .field("sensor", &self.sensor)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl<S: TriggerSink> PollLoop<S> {
    pub fn new(sensor: Sensor, sink: S, interval: Duration) -> Self {
        Self {
            sensor,
            sink,
            interval,
        }
    }

    /// Run exactly one tick (used for `--once`).
    pub async fn run_once(&mut self) -> Result<TickReport> {
        self.sensor.tick(&mut self.sink).await
    }

    /// Tick every `interval` until `shutdown` resolves.
    ///
    /// A failed tick is logged and the loop carries on; the next tick starts
    /// again from whatever cursor is stored.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(
            sensor = %self.sensor.options().name,
            interval = ?self.interval,
            "sensor loop started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested; stopping sensor loop");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.sensor.tick(&mut self.sink).await {
                        log_tick_failure(&err);
                    }
                }
            }
        }

        info!("sensor loop exiting");
        Ok(())
    }
}

fn log_tick_failure(err: &SensorError) {
    match err {
        SensorError::StoreConflict(_) => {
            warn!(error = %err, "cursor moved underneath this tick; retrying next interval")
        }
        SensorError::SourceUnavailable(_) => {
            warn!(error = %err, "source unavailable; cursor unchanged")
        }
        _ => error!(error = %err, "tick failed; cursor unchanged"),
    }
}

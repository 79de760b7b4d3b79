// src/sink.rs

//! Pluggable trigger sink abstraction.
//!
//! The sensor hands its requests to a `TriggerSink` instead of writing them
//! anywhere itself. The consumer behind a sink must be idempotent on
//! `idempotency_key`: the same key may be delivered more than once (for
//! example when a commit fails after delivery and the tick is retried).
//!
//! - [`JsonLinesSink`] is the default implementation used by `reqsensor`. It
//!   writes one JSON object per request, one per line.
//! - Tests can provide their own `TriggerSink` that records what it received.

use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::errors::{Result, SensorError};
use crate::trigger::TriggerRequest;

/// Trait abstracting where trigger requests go.
pub trait TriggerSink: Send {
    /// Hand the given requests to the downstream consumer.
    ///
    /// An error aborts the tick before the cursor is committed.
    fn deliver(
        &mut self,
        requests: Vec<TriggerRequest>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Writes `{"idempotency_key": .., "job": .., "payload": {..}}` lines.
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W> JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<tokio::io::Stdout> {
    /// Sink writing to the process's stdout (logs go to stderr).
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> TriggerSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn deliver(
        &mut self,
        requests: Vec<TriggerRequest>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut buf = Vec::new();
            for request in &requests {
                serde_json::to_writer(&mut buf, request)
                    .map_err(|e| SensorError::Delivery(format!("encoding request: {e}")))?;
                buf.push(b'\n');
            }

            self.writer
                .write_all(&buf)
                .await
                .map_err(|e| SensorError::Delivery(format!("writing requests: {e}")))?;
            self.writer
                .flush()
                .await
                .map_err(|e| SensorError::Delivery(format!("flushing requests: {e}")))?;
            Ok(())
        })
    }
}

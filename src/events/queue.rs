//! Bounded event delivery
//!
//! [`QueuedSink`] puts events on a bounded channel drained by one delivery
//! worker, so a slow collector costs at most `capacity` buffered events and a
//! single in-flight request. When the queue is full the event is dropped.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{EventSink, ProgressEvent};
use crate::types::{GateError, Result};

/// Default number of events buffered ahead of the delivery worker
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

pub struct QueuedSink {
    queue: mpsc::Sender<ProgressEvent>,
    worker: JoinHandle<()>,
}

impl QueuedSink {
    /// Start the delivery worker for `inner`. Must be called inside a tokio runtime.
    pub fn new(inner: Arc<dyn EventSink>, capacity: usize) -> Self {
        let (queue, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(delivery_loop(inner, rx));
        Self { queue, worker }
    }

    /// Events waiting for the worker
    pub fn pending(&self) -> usize {
        self.queue.max_capacity() - self.queue.capacity()
    }
}

impl Drop for QueuedSink {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn delivery_loop(inner: Arc<dyn EventSink>, mut rx: mpsc::Receiver<ProgressEvent>) {
    while let Some(event) = rx.recv().await {
        let session_id = event.session_id.clone();
        match inner.emit(event).await {
            Ok(()) => debug!(session_id = %session_id, "Progress event delivered"),
            Err(e) => warn!(session_id = %session_id, error = %e, "Failed to deliver progress event"),
        }
    }
    info!("Event delivery worker stopped");
}

#[async_trait]
impl EventSink for QueuedSink {
    async fn emit(&self, event: ProgressEvent) -> Result<()> {
        self.queue.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => GateError::Analytics("event queue full, event dropped".into()),
            TrySendError::Closed(_) => GateError::Analytics("event delivery worker stopped".into()),
        })
    }
}

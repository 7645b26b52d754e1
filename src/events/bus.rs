//! In-process event bus

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::{EventSink, ProgressEvent};
use crate::types::Result;

pub struct EventBus {
    sender: broadcast::Sender<ProgressEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: ProgressEvent) {
        trace!(event = ?event, "Publishing progress event");
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for EventBus {
    async fn emit(&self, event: ProgressEvent) -> Result<()> {
        self.publish(event);
        Ok(())
    }
}

/// Spawn a background task that logs every progress event
pub fn spawn_logging_listener(bus: Arc<EventBus>) -> tokio::task::JoinHandle<()> {
    let mut receiver = bus.subscribe();

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    debug!(
                        learner_id = %event.learner_id,
                        session_id = %event.session_id,
                        watched_seconds = event.watched_seconds,
                        completed = event.completed,
                        percentage = event.progress_percentage,
                        "{}", event.event
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!(skipped = n, "Event listener lagged, skipped events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed, stopping listener");
                    break;
                }
            }
        }
    })
}

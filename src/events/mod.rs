//! Progress analytics events
//!
//! Delivery is best-effort. The recorder hands events to an [`EventSink`] and
//! only logs failures. Sinks that talk to the network sit behind a
//! [`QueuedSink`] so the request path never waits on them.

pub mod bus;
pub mod http;
pub mod queue;

pub use bus::{spawn_logging_listener, EventBus};
pub use http::HttpEventSink;
pub use queue::{QueuedSink, DEFAULT_QUEUE_CAPACITY};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Result;

/// Event name for watch progress updates
pub const VIDEO_PROGRESS_UPDATED: &str = "video_progress_updated";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub learner_id: String,
    pub session_id: String,
    pub event: String,
    pub watched_seconds: f64,
    pub completed: bool,
    pub progress_percentage: f64,
    pub occurred_at: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn progress_updated(
        learner_id: &str,
        session_id: &str,
        watched_seconds: f64,
        completed: bool,
        duration_seconds: u32,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            session_id: session_id.to_string(),
            event: VIDEO_PROGRESS_UPDATED.to_string(),
            watched_seconds,
            completed,
            progress_percentage: watch_percentage(watched_seconds, completed, duration_seconds),
            occurred_at,
        }
    }
}

/// Share of the video watched, capped at 100 and rounded to two decimals
pub fn watch_percentage(watched_seconds: f64, completed: bool, duration_seconds: u32) -> f64 {
    if duration_seconds == 0 {
        return if completed { 100.0 } else { 0.0 };
    }
    let raw = (watched_seconds / duration_seconds as f64 * 100.0).min(100.0);
    (raw * 100.0).round() / 100.0
}

/// Receiver of progress events. `emit` runs on the request path and should
/// return promptly.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: ProgressEvent) -> Result<()>;
}

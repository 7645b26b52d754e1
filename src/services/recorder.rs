//! Progress recorder
//!
//! Merges watch telemetry into the progress store and derives the completed
//! flag. The analytics event is handed to the sink after the write; a sink
//! failure is logged and never fails the report.

use std::sync::Arc;
use tracing::{debug, warn};

use super::{validate_id, Collaborators};
use crate::catalog::CurriculumDirectory;
use crate::clock::Clock;
use crate::events::{EventSink, ProgressEvent};
use crate::policy::ProgressPolicy;
use crate::store::ProgressRepository;
use crate::types::{GateError, ProgressRecord, ProgressUpdate, Result};

pub struct ProgressRecorder {
    curriculum: Arc<dyn CurriculumDirectory>,
    store: Arc<dyn ProgressRepository>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    policy: ProgressPolicy,
}

impl ProgressRecorder {
    pub fn new(collaborators: &Collaborators, policy: ProgressPolicy) -> Self {
        Self {
            curriculum: collaborators.curriculum.clone(),
            store: collaborators.store.clone(),
            events: collaborators.events.clone(),
            clock: collaborators.clock.clone(),
            policy,
        }
    }

    /// Record a watch position; returns the stored record after the merge
    ///
    /// `completed_override = Some(true)` marks the session completed regardless
    /// of position. `Some(false)` and `None` leave completion to the threshold.
    pub async fn record_progress(
        &self,
        learner_id: &str,
        session_id: &str,
        watched_seconds: f64,
        completed_override: Option<bool>,
    ) -> Result<ProgressRecord> {
        validate_id("learnerId", learner_id)?;
        validate_id("sessionId", session_id)?;
        if !watched_seconds.is_finite() || watched_seconds < 0.0 {
            return Err(GateError::Validation(
                "watchedSeconds must be a non-negative number".into(),
            ));
        }

        let session = self
            .curriculum
            .session(session_id)
            .await?
            .ok_or_else(|| GateError::SessionNotFound(session_id.to_string()))?;

        let completed = completed_override.unwrap_or(false)
            || self
                .policy
                .completion
                .session_completed(watched_seconds, session.duration_seconds);

        let update = ProgressUpdate {
            learner_id: learner_id.to_string(),
            session_id: session_id.to_string(),
            watched_seconds,
            completed,
            reported_at: self.clock.now(),
        };

        let record = self.store.upsert(&update, self.policy.merge).await?;
        debug!(
            learner_id = %learner_id,
            session_id = %session_id,
            reported = watched_seconds,
            stored = record.watched_seconds,
            completed = record.completed,
            policy = %self.policy.merge,
            "Progress recorded"
        );

        let event = ProgressEvent::progress_updated(
            learner_id,
            session_id,
            record.watched_seconds,
            record.completed,
            session.duration_seconds,
            update.reported_at,
        );
        if let Err(e) = self.events.emit(event).await {
            warn!(session_id = %session_id, error = %e, "Failed to emit progress event");
        }

        Ok(record)
    }
}

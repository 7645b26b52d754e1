//! Service layer for course-gate
//!
//! Services hold the access and progression rules between HTTP handlers and
//! the collaborators they read from or write to.
//!
//! ```text
//! HTTP Handlers (thin)
//!     ↓
//! Services (AccessGateway, ProgressRecorder, ProgressAggregator, ProgressionGate)
//!     ↓
//! Collaborators (curriculum, enrollments, progress store, credentials, events)
//! ```

pub mod access;
pub mod aggregate;
pub mod gate;
pub mod recorder;

pub use access::AccessGateway;
pub use aggregate::ProgressAggregator;
pub use gate::ProgressionGate;
pub use recorder::ProgressRecorder;

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::catalog::{CurriculumDirectory, EnrollmentOracle};
use crate::clock::Clock;
use crate::credentials::CredentialIssuer;
use crate::events::EventSink;
use crate::policy::ProgressPolicy;
use crate::store::ProgressRepository;
use crate::types::{Enrollment, GateError, Result};

/// Longest identifier accepted from callers
const MAX_ID_LEN: usize = 256;

/// Everything the services read from or write to
#[derive(Clone)]
pub struct Collaborators {
    pub curriculum: Arc<dyn CurriculumDirectory>,
    pub enrollments: Arc<dyn EnrollmentOracle>,
    pub store: Arc<dyn ProgressRepository>,
    pub credentials: Arc<dyn CredentialIssuer>,
    pub events: Arc<dyn EventSink>,
    pub clock: Arc<dyn Clock>,
}

/// Service container
///
/// All services share the one store instance from [`Collaborators`].
pub struct Services {
    pub access: Arc<AccessGateway>,
    pub recorder: Arc<ProgressRecorder>,
    pub aggregator: Arc<ProgressAggregator>,
    pub gate: Arc<ProgressionGate>,
    pub store: Arc<dyn ProgressRepository>,
    pub policy: ProgressPolicy,
}

impl Services {
    pub fn new(collaborators: Collaborators, policy: ProgressPolicy) -> Self {
        let aggregator = Arc::new(ProgressAggregator::new(&collaborators));

        Self {
            access: Arc::new(AccessGateway::new(&collaborators, policy)),
            recorder: Arc::new(ProgressRecorder::new(&collaborators, policy)),
            gate: Arc::new(ProgressionGate::new(
                collaborators.curriculum.clone(),
                aggregator.clone(),
                policy.completion,
            )),
            aggregator,
            store: collaborators.store,
            policy,
        }
    }
}

/// Reject empty, oversized or control-character identifiers
pub(crate) fn validate_id(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GateError::Validation(format!("{} is required", field)));
    }
    if value.len() > MAX_ID_LEN {
        return Err(GateError::Validation(format!(
            "{} exceeds {} bytes",
            field, MAX_ID_LEN
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(GateError::Validation(format!("{} contains control characters", field)));
    }
    Ok(())
}

/// Enrollments that currently grant access
pub(crate) async fn usable_enrollments(
    oracle: &dyn EnrollmentOracle,
    learner_id: &str,
    now: DateTime<Utc>,
) -> Result<(usize, Vec<Enrollment>)> {
    let all = oracle.enrollments_for(learner_id).await?;
    let held = all.len();
    let usable = all.into_iter().filter(|e| e.is_usable(now)).collect();
    Ok((held, usable))
}

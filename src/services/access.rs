//! Access gateway
//!
//! Checks enrollment, curriculum membership and content before asking the
//! credential issuer for a short-lived fetch URL. Also makes sure a progress
//! record exists for the pair so the player can resume.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use super::{validate_id, Collaborators};
use crate::catalog::{CurriculumDirectory, EnrollmentOracle};
use crate::clock::Clock;
use crate::credentials::CredentialIssuer;
use crate::policy::ProgressPolicy;
use crate::store::ProgressRepository;
use crate::types::{AccessGrant, Credential, GateError, Result};

pub struct AccessGateway {
    curriculum: Arc<dyn CurriculumDirectory>,
    enrollments: Arc<dyn EnrollmentOracle>,
    store: Arc<dyn ProgressRepository>,
    credentials: Arc<dyn CredentialIssuer>,
    clock: Arc<dyn Clock>,
    policy: ProgressPolicy,
}

impl AccessGateway {
    pub fn new(collaborators: &Collaborators, policy: ProgressPolicy) -> Self {
        Self {
            curriculum: collaborators.curriculum.clone(),
            enrollments: collaborators.enrollments.clone(),
            store: collaborators.store.clone(),
            credentials: collaborators.credentials.clone(),
            clock: collaborators.clock.clone(),
            policy,
        }
    }

    /// Issue a viewing credential for `session_id`, with the learner's progress
    pub async fn request_access(&self, learner_id: &str, session_id: &str) -> Result<AccessGrant> {
        validate_id("learnerId", learner_id)?;
        validate_id("sessionId", session_id)?;

        let result = self.authorize_and_issue(learner_id, session_id).await;
        match &result {
            Ok(grant) => info!(
                learner_id = %learner_id,
                session_id = %session_id,
                expires_at = %grant.credential.expires_at,
                "Access granted"
            ),
            Err(e) => info!(
                learner_id = %learner_id,
                session_id = %session_id,
                reason = e.reason_code(),
                "Access denied"
            ),
        }
        result
    }

    async fn authorize_and_issue(&self, learner_id: &str, session_id: &str) -> Result<AccessGrant> {
        let now = self.clock.now();

        let enrollments = self.enrollments.enrollments_for(learner_id).await?;
        if enrollments.is_empty() {
            return Err(GateError::NotEnrolled);
        }
        let usable: HashSet<&str> = enrollments
            .iter()
            .filter(|e| e.is_usable(now))
            .map(|e| e.program_id.as_str())
            .collect();
        if usable.is_empty() {
            return Err(GateError::EnrollmentExpired);
        }

        let session = self
            .curriculum
            .session(session_id)
            .await?
            .ok_or_else(|| GateError::SessionNotFound(session_id.to_string()))?;

        match self.owning_program(&session.module_id).await? {
            Some(program_id) if usable.contains(program_id.as_str()) => {}
            // Held, but lapsed or inactive for this program
            Some(program_id) if enrollments.iter().any(|e| e.program_id == program_id) => {
                return Err(GateError::EnrollmentExpired);
            }
            _ => return Err(GateError::SessionNotInProgram),
        }

        let locator = session
            .content_locator()
            .ok_or_else(|| GateError::ContentUnavailable(session_id.to_string()))?;

        let record = self.store.get_or_create(learner_id, session_id, now).await?;
        debug!(
            learner_id = %learner_id,
            session_id = %session_id,
            watched_seconds = record.watched_seconds,
            "Progress record ready"
        );

        let fetch = self
            .credentials
            .issue(locator, self.policy.credential_ttl)
            .await?;

        Ok(AccessGrant {
            credential: Credential {
                fetch_url: fetch.fetch_url,
                expires_at: fetch.expires_at,
                duration_seconds: session.duration_seconds,
            },
            progress: record.snapshot(),
        })
    }

    /// Program whose module tree contains `module_id`
    async fn owning_program(&self, module_id: &str) -> Result<Option<String>> {
        let Some(module) = self.curriculum.module(module_id).await? else {
            return Ok(None);
        };
        let listed = self
            .curriculum
            .program(&module.program_id)
            .await?
            .is_some_and(|p| p.module_ids.iter().any(|id| id == module_id));
        Ok(listed.then_some(module.program_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::clock::ManualClock;
    use crate::credentials::SignedUrlIssuer;
    use crate::events::EventBus;
    use crate::store::MemoryProgressStore;
    use crate::types::{Enrollment, EnrollmentStatus};
    use chrono::{Duration, TimeZone, Utc};

    const CATALOG: &str = r#"
[[programs]]
id = "program-a"

[[programs.modules]]
id = "a-1"
order = 1

[[programs.modules.sessions]]
id = "a-1-1"
order_index = 1
duration_seconds = 600
locator = "videos/a-1-1.mp4"

[[programs.modules.sessions]]
id = "a-1-2"
order_index = 2

[[programs]]
id = "program-b"

[[programs.modules]]
id = "b-1"
order = 1

[[programs.modules.sessions]]
id = "b-1-1"
order_index = 1
duration_seconds = 300
locator = "videos/b-1-1.mp4"

[[programs.modules.sessions]]
id = "b-1-2"
order_index = 2
duration_seconds = 300
locator = "   "
"#;

    struct Fixture {
        gateway: AccessGateway,
        catalog: Arc<Catalog>,
        store: Arc<MemoryProgressStore>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(Catalog::from_toml_str(CATALOG).unwrap());
        let store = Arc::new(MemoryProgressStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()));
        let collaborators = Collaborators {
            curriculum: catalog.clone(),
            enrollments: catalog.clone(),
            store: store.clone(),
            credentials: Arc::new(SignedUrlIssuer::generate("https://media.test", clock.clone())),
            events: Arc::new(EventBus::new()),
            clock: clock.clone(),
        };

        Fixture {
            gateway: AccessGateway::new(&collaborators, ProgressPolicy::default()),
            catalog,
            store,
            clock,
        }
    }

    fn enroll(f: &Fixture, program: &str, status: EnrollmentStatus, days: i64) {
        f.catalog.upsert_enrollment(Enrollment {
            learner_id: "learner-1".into(),
            program_id: program.into(),
            status,
            valid_until: f.clock.now() + Duration::days(days),
        });
    }

    #[tokio::test]
    async fn test_grant_creates_zeroed_record() {
        let f = fixture();
        enroll(&f, "program-a", EnrollmentStatus::Active, 30);

        let grant = f.gateway.request_access("learner-1", "a-1-1").await.unwrap();

        assert_eq!(grant.credential.duration_seconds, 600);
        assert_eq!(grant.credential.expires_at, f.clock.now() + Duration::seconds(3600));
        assert!(grant.credential.fetch_url.contains("videos/a-1-1.mp4"));
        assert_eq!(grant.progress.watched_seconds, 0.0);
        assert!(!grant.progress.completed);
        assert_eq!(f.store.count().await.unwrap(), 1);

        // Second request reuses the record
        f.gateway.request_access("learner-1", "a-1-1").await.unwrap();
        assert_eq!(f.store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_not_enrolled() {
        let f = fixture();
        let err = f.gateway.request_access("learner-1", "a-1-1").await.unwrap_err();
        assert!(matches!(err, GateError::NotEnrolled));
    }

    #[tokio::test]
    async fn test_inactive_or_lapsed_enrollment() {
        let f = fixture();
        enroll(&f, "program-a", EnrollmentStatus::Suspended, 30);
        let err = f.gateway.request_access("learner-1", "a-1-1").await.unwrap_err();
        assert!(matches!(err, GateError::EnrollmentExpired));

        enroll(&f, "program-a", EnrollmentStatus::Active, -1);
        let err = f.gateway.request_access("learner-1", "a-1-1").await.unwrap_err();
        assert!(matches!(err, GateError::EnrollmentExpired));
    }

    #[tokio::test]
    async fn test_unenrolled_caller_cannot_discover_sessions() {
        let f = fixture();
        let err = f.gateway.request_access("learner-1", "missing").await.unwrap_err();
        assert!(matches!(err, GateError::NotEnrolled));
    }

    #[tokio::test]
    async fn test_cross_program_isolation() {
        let f = fixture();
        enroll(&f, "program-a", EnrollmentStatus::Active, 30);

        let err = f.gateway.request_access("learner-1", "b-1-1").await.unwrap_err();
        assert!(matches!(err, GateError::SessionNotInProgram));
        assert_eq!(f.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_session_without_content() {
        let f = fixture();
        enroll(&f, "program-a", EnrollmentStatus::Active, 30);

        let err = f.gateway.request_access("learner-1", "a-1-2").await.unwrap_err();
        assert!(matches!(err, GateError::ContentUnavailable(_)));
        assert_eq!(f.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_session_for_enrolled_learner() {
        let f = fixture();
        enroll(&f, "program-a", EnrollmentStatus::Active, 30);

        let err = f.gateway.request_access("learner-1", "nope").await.unwrap_err();
        assert!(matches!(err, GateError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_malformed_ids_rejected() {
        let f = fixture();
        let err = f.gateway.request_access("", "a-1-1").await.unwrap_err();
        assert!(matches!(err, GateError::Validation(_)));
    }

    #[tokio::test]
    async fn test_blank_locator_is_content_unavailable() {
        let f = fixture();
        enroll(&f, "program-b", EnrollmentStatus::Active, 30);

        let err = f.gateway.request_access("learner-1", "b-1-2").await.unwrap_err();
        assert!(matches!(err, GateError::ContentUnavailable(_)));
        assert_eq!(f.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lapsed_enrollment_in_session_program() {
        let f = fixture();
        enroll(&f, "program-a", EnrollmentStatus::Active, -1);
        enroll(&f, "program-b", EnrollmentStatus::Active, 30);

        let err = f.gateway.request_access("learner-1", "a-1-1").await.unwrap_err();
        assert!(matches!(err, GateError::EnrollmentExpired));
        assert_eq!(f.store.count().await.unwrap(), 0);

        // The active program is unaffected
        f.gateway.request_access("learner-1", "b-1-1").await.unwrap();
    }
}

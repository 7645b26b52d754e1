//! Shared fixtures for integration tests
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use course_gate::auth::JwtValidator;
use course_gate::catalog::Catalog;
use course_gate::clock::{Clock, ManualClock};
use course_gate::credentials::SignedUrlIssuer;
use course_gate::events::EventBus;
use course_gate::policy::ProgressPolicy;
use course_gate::server::AppState;
use course_gate::store::{MemoryProgressStore, ProgressRepository};
use course_gate::types::{Enrollment, EnrollmentStatus};
use course_gate::{Collaborators, Services};
use ed25519_dalek::VerifyingKey;
use std::fmt::Write;
use std::sync::Arc;

pub const LEARNER: &str = "learner-1";

/// Program A: module 1 with ten 100s sessions plus a draft, module 2 with two
/// sessions, module 3 with one. Program B: one module with one session.
pub fn catalog_toml() -> String {
    let mut toml = String::from(
        "[[programs]]\nid = \"program-a\"\ntitle = \"Foundations\"\n\n\
         [[programs.modules]]\nid = \"a-m1\"\ntitle = \"Basics\"\norder = 1\n",
    );
    for i in 1..=10 {
        write!(
            toml,
            "\n[[programs.modules.sessions]]\nid = \"a-m1-s{i}\"\ntitle = \"Lesson {i}\"\n\
             order_index = {i}\nduration_seconds = 100\nlocator = \"a/m1/s{i}.mp4\"\n"
        )
        .unwrap();
    }
    toml.push_str(
        "\n[[programs.modules.sessions]]\nid = \"a-m1-draft\"\ntitle = \"Coming soon\"\norder_index = 11\n\
         \n[[programs.modules]]\nid = \"a-m2\"\ntitle = \"Next steps\"\norder = 2\n\
         \n[[programs.modules.sessions]]\nid = \"a-m2-s1\"\norder_index = 1\nduration_seconds = 300\nlocator = \"a/m2/s1.mp4\"\n\
         \n[[programs.modules.sessions]]\nid = \"a-m2-s2\"\norder_index = 2\nduration_seconds = 300\nlocator = \"a/m2/s2.mp4\"\n\
         \n[[programs.modules]]\nid = \"a-m3\"\ntitle = \"Wrap up\"\norder = 3\n\
         \n[[programs.modules.sessions]]\nid = \"a-m3-s1\"\norder_index = 1\nduration_seconds = 60\nlocator = \"a/m3/s1.mp4\"\n\
         \n[[programs]]\nid = \"program-b\"\ntitle = \"Advanced\"\n\
         \n[[programs.modules]]\nid = \"b-m1\"\norder = 1\n\
         \n[[programs.modules.sessions]]\nid = \"b-m1-s1\"\norder_index = 1\nduration_seconds = 500\nlocator = \"b/m1/s1.mp4\"\n",
    );
    toml
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap()
}

pub struct Harness {
    pub services: Services,
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn ProgressRepository>,
    pub clock: Arc<ManualClock>,
    pub events: Arc<EventBus>,
    pub content_key: VerifyingKey,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryProgressStore::new()), ProgressPolicy::default())
    }

    pub fn with_policy(policy: ProgressPolicy) -> Self {
        Self::with_store(Arc::new(MemoryProgressStore::new()), policy)
    }

    pub fn with_store(store: Arc<dyn ProgressRepository>, policy: ProgressPolicy) -> Self {
        let catalog = Arc::new(Catalog::from_toml_str(&catalog_toml()).unwrap());
        let clock = Arc::new(ManualClock::new(start_time()));
        let events = Arc::new(EventBus::new());
        let issuer = SignedUrlIssuer::generate("https://media.test", clock.clone());
        let content_key = issuer.verifying_key();

        let services = Services::new(
            Collaborators {
                curriculum: catalog.clone(),
                enrollments: catalog.clone(),
                store: store.clone(),
                credentials: Arc::new(issuer),
                events: events.clone(),
                clock: clock.clone(),
            },
            policy,
        );

        Self {
            services,
            catalog,
            store,
            clock,
            events,
            content_key,
        }
    }

    pub fn enroll(&self, learner: &str, program: &str, status: EnrollmentStatus, valid_for: Duration) {
        self.catalog.upsert_enrollment(Enrollment {
            learner_id: learner.into(),
            program_id: program.into(),
            status,
            valid_until: self.clock.now() + valid_for,
        });
    }

    pub fn enroll_active(&self, learner: &str, program: &str) {
        self.enroll(learner, program, EnrollmentStatus::Active, Duration::days(90));
    }

    /// Mark the first `count` sessions of program A module 1 completed
    pub async fn complete_module_one(&self, learner: &str, count: usize) {
        for i in 1..=count {
            self.services
                .recorder
                .record_progress(learner, &format!("a-m1-s{}", i), 100.0, None)
                .await
                .unwrap();
        }
    }

    pub fn into_app_state(self, dev_mode: bool) -> (Arc<AppState>, Arc<Catalog>, Arc<ManualClock>) {
        let state = AppState::new(self.services, JwtValidator::new_dev(), dev_mode, self.content_key);
        (Arc::new(state), self.catalog, self.clock)
    }
}

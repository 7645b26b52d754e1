//! Services over the sled-backed progress store

mod common;

use common::{Harness, LEARNER};
use course_gate::policy::ProgressPolicy;
use course_gate::store::{ProgressRepository, SledProgressStore};
use std::sync::Arc;
use tempfile::TempDir;

fn harness(dir: &TempDir) -> (Harness, Arc<SledProgressStore>) {
    let store = Arc::new(SledProgressStore::open(dir.path().join("progress.sled")).unwrap());
    let harness = Harness::with_store(store.clone(), ProgressPolicy::default());
    (harness, store)
}

#[tokio::test]
async fn test_progress_survives_restart() {
    let dir = TempDir::new().unwrap();

    {
        let (h, store) = harness(&dir);
        h.enroll_active(LEARNER, "program-a");
        h.complete_module_one(LEARNER, 9).await;
        store.flush().await.unwrap();
    }

    let (h, _) = harness(&dir);
    h.enroll_active(LEARNER, "program-a");
    assert!(h.services.gate.can_access_module(LEARNER, "a-m2").await.unwrap());

    let course = h.services.aggregator.course_progress(LEARNER).await.unwrap().unwrap();
    assert_eq!(course.modules[0].completed_sessions, 9);
}

#[tokio::test]
async fn test_concurrent_reports_keep_highest_position() {
    let dir = TempDir::new().unwrap();
    let (h, store) = harness(&dir);
    let h = Arc::new(h);

    let mut handles = Vec::new();
    for position in [10.0, 250.0, 40.0, 280.0, 5.0, 120.0] {
        let h = Arc::clone(&h);
        handles.push(tokio::spawn(async move {
            h.services
                .recorder
                .record_progress(LEARNER, "a-m2-s1", position, None)
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let record = store.get(LEARNER, "a-m2-s1").await.unwrap().unwrap();
    assert_eq!(record.watched_seconds, 280.0);
    assert!(record.completed);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_access_creates_single_durable_record() {
    let dir = TempDir::new().unwrap();
    let (h, store) = harness(&dir);
    h.enroll_active(LEARNER, "program-a");

    h.services.access.request_access(LEARNER, "a-m1-s1").await.unwrap();
    h.services.access.request_access(LEARNER, "a-m1-s1").await.unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
}

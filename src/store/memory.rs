//! In-memory progress store
//!
//! DashMap's entry API holds the shard lock for the whole read-merge-write,
//! which is what makes get-or-create and upsert atomic per key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::ProgressRepository;
use crate::policy::MergePolicy;
use crate::types::{ProgressRecord, ProgressUpdate, Result};

type RecordKey = (String, String);

#[derive(Default)]
pub struct MemoryProgressStore {
    records: DashMap<RecordKey, ProgressRecord>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(learner_id: &str, session_id: &str) -> RecordKey {
    (learner_id.to_string(), session_id.to_string())
}

#[async_trait]
impl ProgressRepository for MemoryProgressStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, learner_id: &str, session_id: &str) -> Result<Option<ProgressRecord>> {
        Ok(self
            .records
            .get(&key(learner_id, session_id))
            .map(|r| r.value().clone()))
    }

    async fn get_or_create(
        &self,
        learner_id: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord> {
        let record = self
            .records
            .entry(key(learner_id, session_id))
            .or_insert_with(|| ProgressRecord::zeroed(learner_id, session_id, now));
        Ok(record.value().clone())
    }

    async fn upsert(&self, update: &ProgressUpdate, policy: MergePolicy) -> Result<ProgressRecord> {
        match self.records.entry(key(&update.learner_id, &update.session_id)) {
            Entry::Occupied(mut occupied) => {
                let merged = policy.merge(Some(occupied.get()), update);
                occupied.insert(merged.clone());
                Ok(merged)
            }
            Entry::Vacant(vacant) => {
                let created = policy.merge(None, update);
                vacant.insert(created.clone());
                Ok(created)
            }
        }
    }

    async fn get_many(&self, learner_id: &str, session_ids: &[String]) -> Result<Vec<ProgressRecord>> {
        Ok(session_ids
            .iter()
            .filter_map(|session_id| {
                self.records
                    .get(&key(learner_id, session_id))
                    .map(|r| r.value().clone())
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn update(watched: f64, completed: bool) -> ProgressUpdate {
        ProgressUpdate {
            learner_id: "learner-1".into(),
            session_id: "session-1".into(),
            watched_seconds: watched,
            completed,
            reported_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = MemoryProgressStore::new();
        let now = Utc::now();

        let first = store.get_or_create("learner-1", "session-1", now).await.unwrap();
        assert_eq!(first.watched_seconds, 0.0);
        assert!(!first.completed);

        store.upsert(&update(42.0, false), MergePolicy::KeepMax).await.unwrap();

        let second = store.get_or_create("learner-1", "session-1", now).await.unwrap();
        assert_eq!(second.watched_seconds, 42.0);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_many_skips_missing() {
        let store = MemoryProgressStore::new();
        store.upsert(&update(10.0, false), MergePolicy::KeepMax).await.unwrap();

        let found = store
            .get_many("learner-1", &["session-1".to_string(), "session-2".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].session_id, "session-1");
    }

    #[tokio::test]
    async fn test_concurrent_upserts_keep_single_record() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut handles = Vec::new();

        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .upsert(&update(i as f64, false), MergePolicy::KeepMax)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 1);
        let record = store.get("learner-1", "session-1").await.unwrap().unwrap();
        assert_eq!(record.watched_seconds, 31.0);
    }
}

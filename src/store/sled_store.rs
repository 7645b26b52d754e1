//! Durable progress store backed by sled
//!
//! Records live in the `progress` tree keyed by `learner_id \0 session_id`,
//! encoded with MessagePack. Both write paths are compare-and-swap loops, so
//! concurrent reporters for the same key retry instead of clobbering each other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sled::{Db, Tree};
use std::path::Path;
use tracing::{debug, info};

use super::ProgressRepository;
use crate::policy::MergePolicy;
use crate::types::{ProgressRecord, ProgressUpdate, Result};

const PROGRESS_TREE: &str = "progress";

pub struct SledProgressStore {
    db: Db,
    tree: Tree,
}

impl SledProgressStore {
    /// Open or create the store under `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref())?;
        let tree = db.open_tree(PROGRESS_TREE)?;
        info!(path = %path.as_ref().display(), records = tree.len(), "Opened progress store");
        Ok(Self { db, tree })
    }

    /// Flush dirty pages to disk
    pub async fn flush(&self) -> Result<usize> {
        Ok(self.db.flush_async().await?)
    }
}

fn record_key(learner_id: &str, session_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(learner_id.len() + session_id.len() + 1);
    key.extend_from_slice(learner_id.as_bytes());
    key.push(0);
    key.extend_from_slice(session_id.as_bytes());
    key
}

fn encode(record: &ProgressRecord) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec(record)?)
}

fn decode(bytes: &[u8]) -> Result<ProgressRecord> {
    Ok(rmp_serde::from_slice(bytes)?)
}

#[async_trait]
impl ProgressRepository for SledProgressStore {
    fn backend(&self) -> &'static str {
        "sled"
    }

    async fn get(&self, learner_id: &str, session_id: &str) -> Result<Option<ProgressRecord>> {
        match self.tree.get(record_key(learner_id, session_id))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn get_or_create(
        &self,
        learner_id: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord> {
        let key = record_key(learner_id, session_id);
        let fresh = ProgressRecord::zeroed(learner_id, session_id, now);
        let encoded = encode(&fresh)?;

        loop {
            match self
                .tree
                .compare_and_swap(&key, None as Option<&[u8]>, Some(encoded.clone()))?
            {
                Ok(()) => return Ok(fresh),
                Err(conflict) => {
                    if let Some(current) = conflict.current {
                        return decode(&current);
                    }
                    // Removed between the read and the swap; try again
                }
            }
        }
    }

    async fn upsert(&self, update: &ProgressUpdate, policy: MergePolicy) -> Result<ProgressRecord> {
        let key = record_key(&update.learner_id, &update.session_id);

        loop {
            let current = self.tree.get(&key)?;
            let existing = match current.as_deref() {
                Some(bytes) => Some(decode(bytes)?),
                None => None,
            };

            let merged = policy.merge(existing.as_ref(), update);
            let encoded = encode(&merged)?;

            match self.tree.compare_and_swap(&key, current, Some(encoded))? {
                Ok(()) => return Ok(merged),
                Err(_) => {
                    debug!(
                        learner_id = %update.learner_id,
                        session_id = %update.session_id,
                        "Concurrent progress write, retrying merge"
                    );
                }
            }
        }
    }

    async fn get_many(&self, learner_id: &str, session_ids: &[String]) -> Result<Vec<ProgressRecord>> {
        let mut records = Vec::with_capacity(session_ids.len());
        for session_id in session_ids {
            if let Some(bytes) = self.tree.get(record_key(learner_id, session_id))? {
                records.push(decode(&bytes)?);
            }
        }
        Ok(records)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.tree.len())
    }
}

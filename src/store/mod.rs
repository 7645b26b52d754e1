//! Progress store
//!
//! Exactly one [`ProgressRecord`] exists per (learner, session). Stores must
//! provide two single-key atomic primitives: get-or-create and upsert-merge.
//! No operation spans more than one key.

pub mod memory;
pub mod sled_store;

pub use memory::MemoryProgressStore;
pub use sled_store::SledProgressStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::policy::MergePolicy;
use crate::types::{ProgressRecord, ProgressUpdate, Result};

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Backend name for health reporting
    fn backend(&self) -> &'static str;

    async fn get(&self, learner_id: &str, session_id: &str) -> Result<Option<ProgressRecord>>;

    /// Return the existing record, or atomically insert a zeroed one
    async fn get_or_create(
        &self,
        learner_id: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord>;

    /// Atomically create the record, or merge `update` into it with `policy`
    async fn upsert(&self, update: &ProgressUpdate, policy: MergePolicy) -> Result<ProgressRecord>;

    /// Records that exist for the given sessions; missing ones are omitted
    async fn get_many(&self, learner_id: &str, session_ids: &[String]) -> Result<Vec<ProgressRecord>>;

    async fn count(&self) -> Result<usize>;
}

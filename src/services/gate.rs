//! Progression gate
//!
//! A module opens once the module before it (by order) reaches the completion
//! threshold over its content-bearing sessions. Curriculum gaps fail open.

use std::sync::Arc;
use tracing::{debug, warn};

use super::{validate_id, ProgressAggregator};
use crate::catalog::CurriculumDirectory;
use crate::policy::CompletionThreshold;
use crate::types::{GateError, Result};

pub struct ProgressionGate {
    curriculum: Arc<dyn CurriculumDirectory>,
    aggregator: Arc<ProgressAggregator>,
    threshold: CompletionThreshold,
}

impl ProgressionGate {
    pub fn new(
        curriculum: Arc<dyn CurriculumDirectory>,
        aggregator: Arc<ProgressAggregator>,
        threshold: CompletionThreshold,
    ) -> Self {
        Self {
            curriculum,
            aggregator,
            threshold,
        }
    }

    /// Whether the learner may enter `module_id`. Read-only.
    pub async fn can_access_module(&self, learner_id: &str, module_id: &str) -> Result<bool> {
        validate_id("learnerId", learner_id)?;
        validate_id("moduleId", module_id)?;

        let module = self
            .curriculum
            .module(module_id)
            .await?
            .ok_or_else(|| GateError::ModuleNotFound(module_id.to_string()))?;

        if module.order <= 1 {
            return Ok(true);
        }

        let previous_order = module.order - 1;
        let previous = self
            .curriculum
            .modules_in_program(&module.program_id)
            .await?
            .into_iter()
            .find(|m| m.order == previous_order);

        let Some(previous) = previous else {
            warn!(
                module_id = %module_id,
                program_id = %module.program_id,
                missing_order = previous_order,
                "Previous module missing from curriculum, allowing access"
            );
            return Ok(true);
        };

        let summary = self.aggregator.module_summary(learner_id, &previous).await?;
        let allowed = self
            .threshold
            .ratio_met(summary.completed_sessions, summary.total_sessions);

        debug!(
            learner_id = %learner_id,
            module_id = %module_id,
            previous = %previous.id,
            completed = summary.completed_sessions,
            total = summary.total_sessions,
            allowed = allowed,
            "Gate decision"
        );
        Ok(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::clock::ManualClock;
    use crate::credentials::SignedUrlIssuer;
    use crate::events::EventBus;
    use crate::policy::MergePolicy;
    use crate::services::Collaborators;
    use crate::store::{MemoryProgressStore, ProgressRepository};
    use crate::types::ProgressUpdate;
    use chrono::Utc;
    use std::fmt::Write;

    /// Module 1 has ten content sessions plus a draft, module 2 is empty, and
    /// module 5 has no order-4 predecessor
    fn catalog_toml() -> String {
        let mut toml = String::from(
            "[[programs]]\nid = \"p\"\n\n[[programs.modules]]\nid = \"m1\"\norder = 1\n",
        );
        for i in 1..=10 {
            write!(
                toml,
                "\n[[programs.modules.sessions]]\nid = \"m1-s{i}\"\norder_index = {i}\nduration_seconds = 60\nlocator = \"v/{i}.mp4\"\n"
            )
            .unwrap();
        }
        toml.push_str("\n[[programs.modules.sessions]]\nid = \"m1-draft\"\norder_index = 11\n");
        toml.push_str("\n[[programs.modules]]\nid = \"m2\"\norder = 2\n");
        toml.push_str("\n[[programs.modules]]\nid = \"m3\"\norder = 3\n");
        toml.push_str("\n[[programs.modules]]\nid = \"m5\"\norder = 5\n");
        toml
    }

    fn gate() -> (ProgressionGate, Arc<MemoryProgressStore>) {
        let catalog = Arc::new(Catalog::from_toml_str(&catalog_toml()).unwrap());
        let store = Arc::new(MemoryProgressStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let collaborators = Collaborators {
            curriculum: catalog.clone(),
            enrollments: catalog.clone(),
            store: store.clone(),
            credentials: Arc::new(SignedUrlIssuer::generate("https://media.test", clock.clone())),
            events: Arc::new(EventBus::new()),
            clock,
        };
        let aggregator = Arc::new(ProgressAggregator::new(&collaborators));
        (
            ProgressionGate::new(catalog, aggregator, CompletionThreshold::default()),
            store,
        )
    }

    async fn complete_sessions(store: &MemoryProgressStore, count: usize) {
        for i in 1..=count {
            store
                .upsert(
                    &ProgressUpdate {
                        learner_id: "l1".into(),
                        session_id: format!("m1-s{}", i),
                        watched_seconds: 60.0,
                        completed: true,
                        reported_at: Utc::now(),
                    },
                    MergePolicy::KeepMax,
                )
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_first_module_always_open() {
        let (gate, _) = gate();
        assert!(gate.can_access_module("l1", "m1").await.unwrap());
        assert!(gate.can_access_module("someone-else", "m1").await.unwrap());
    }

    #[tokio::test]
    async fn test_nine_of_ten_opens_next() {
        let (gate, store) = gate();
        complete_sessions(&store, 9).await;
        assert!(gate.can_access_module("l1", "m2").await.unwrap());
    }

    #[tokio::test]
    async fn test_eight_of_ten_keeps_next_closed() {
        let (gate, store) = gate();
        complete_sessions(&store, 8).await;
        assert!(!gate.can_access_module("l1", "m2").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_previous_module_is_vacuously_complete() {
        let (gate, _) = gate();
        assert!(gate.can_access_module("l1", "m3").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_previous_module_fails_open() {
        let (gate, _) = gate();
        assert!(gate.can_access_module("l1", "m5").await.unwrap());
    }

    #[tokio::test]
    async fn test_gate_does_not_create_records() {
        let (gate, store) = gate();
        gate.can_access_module("l1", "m2").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_module() {
        let (gate, _) = gate();
        let err = gate.can_access_module("l1", "nope").await.unwrap_err();
        assert!(matches!(err, GateError::ModuleNotFound(_)));
    }
}

//! Module and course roll-ups
//!
//! Only sessions with a content locator count toward totals; sessions without
//! content are still listed so the player can show them as upcoming.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::{usable_enrollments, validate_id, Collaborators};
use crate::catalog::{CurriculumDirectory, EnrollmentOracle};
use crate::clock::Clock;
use crate::store::ProgressRepository;
use crate::types::{
    completion_percentage, CourseProgress, GateError, Module, ModuleProgress, Result,
    SessionProgress,
};

pub struct ProgressAggregator {
    curriculum: Arc<dyn CurriculumDirectory>,
    enrollments: Arc<dyn EnrollmentOracle>,
    store: Arc<dyn ProgressRepository>,
    clock: Arc<dyn Clock>,
}

impl ProgressAggregator {
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            curriculum: collaborators.curriculum.clone(),
            enrollments: collaborators.enrollments.clone(),
            store: collaborators.store.clone(),
            clock: collaborators.clock.clone(),
        }
    }

    /// Per-session progress for a module, in session order
    pub async fn module_progress(&self, learner_id: &str, module_id: &str) -> Result<Vec<SessionProgress>> {
        Ok(self.module_summary_by_id(learner_id, module_id).await?.sessions)
    }

    pub async fn module_summary_by_id(&self, learner_id: &str, module_id: &str) -> Result<ModuleProgress> {
        validate_id("learnerId", learner_id)?;
        validate_id("moduleId", module_id)?;

        let module = self
            .curriculum
            .module(module_id)
            .await?
            .ok_or_else(|| GateError::ModuleNotFound(module_id.to_string()))?;
        self.module_summary(learner_id, &module).await
    }

    /// Roll up one module for a learner
    pub async fn module_summary(&self, learner_id: &str, module: &Module) -> Result<ModuleProgress> {
        let sessions = self.curriculum.sessions_in_module(&module.id).await?;
        let ids: Vec<String> = sessions.iter().map(|s| s.id.clone()).collect();

        let records: HashMap<String, _> = self
            .store
            .get_many(learner_id, &ids)
            .await?
            .into_iter()
            .map(|r| (r.session_id.clone(), r))
            .collect();

        let mut total_sessions = 0;
        let mut completed_sessions = 0;
        let mut breakdown = Vec::with_capacity(sessions.len());

        for session in sessions {
            let record = records.get(&session.id);
            let has_content = session.has_content();
            let completed = record.is_some_and(|r| r.completed);

            if has_content {
                total_sessions += 1;
                if completed {
                    completed_sessions += 1;
                }
            }

            breakdown.push(SessionProgress {
                session_id: session.id,
                title: session.title,
                order_index: session.order_index,
                duration_seconds: session.duration_seconds,
                has_content,
                watched_seconds: record.map_or(0.0, |r| r.watched_seconds),
                completed,
                last_watched: record.map(|r| r.last_watched),
            });
        }

        Ok(ModuleProgress {
            module_id: module.id.clone(),
            title: module.title.clone(),
            order: module.order,
            total_sessions,
            completed_sessions,
            percentage: completion_percentage(completed_sessions, total_sessions),
            sessions: breakdown,
        })
    }

    /// Course roll-up for the learner's current enrollment
    ///
    /// `None` when the learner holds no usable enrollment. With several, the
    /// one valid the longest wins.
    pub async fn course_progress(&self, learner_id: &str) -> Result<Option<CourseProgress>> {
        validate_id("learnerId", learner_id)?;

        let now = self.clock.now();
        let (_, usable) = usable_enrollments(self.enrollments.as_ref(), learner_id, now).await?;
        let Some(enrollment) = usable.into_iter().max_by_key(|e| e.valid_until) else {
            debug!(learner_id = %learner_id, "No active enrollment for course progress");
            return Ok(None);
        };

        let modules = self.curriculum.modules_in_program(&enrollment.program_id).await?;
        let mut summaries = Vec::with_capacity(modules.len());
        for module in &modules {
            summaries.push(self.module_summary(learner_id, module).await?);
        }

        let total_sessions = summaries.iter().map(|m| m.total_sessions).sum();
        let completed_sessions = summaries.iter().map(|m| m.completed_sessions).sum();

        Ok(Some(CourseProgress {
            program_id: enrollment.program_id,
            modules: summaries,
            total_sessions,
            completed_sessions,
            overall_percentage: completion_percentage(completed_sessions, total_sessions),
        }))
    }
}

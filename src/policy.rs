//! Completion threshold and progress merge policy
//!
//! The same threshold decides when a session counts as completed and when a
//! module's completion ratio unlocks the next module.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{GateError, ProgressRecord, ProgressUpdate};

/// Default completion threshold, in percent
pub const DEFAULT_COMPLETION_PERCENT: u32 = 90;

/// Default lifetime of an issued viewing credential
pub const DEFAULT_CREDENTIAL_TTL_SECONDS: u64 = 3600;

/// Longest credential lifetime accepted from configuration (7 days)
pub const MAX_CREDENTIAL_TTL_SECONDS: u64 = 7 * 24 * 3600;

/// Fraction of a session watched, or of a module's sessions completed,
/// that counts as "done". Comparisons are exact integer-scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionThreshold {
    percent: u32,
}

impl CompletionThreshold {
    pub fn new(percent: u32) -> Result<Self, GateError> {
        if percent == 0 || percent > 100 {
            return Err(GateError::Config(format!(
                "completion threshold must be within 1..=100, got {}",
                percent
            )));
        }
        Ok(Self { percent })
    }

    pub fn percent(&self) -> u32 {
        self.percent
    }

    /// `watched >= threshold * duration`, false for unset durations
    pub fn session_completed(&self, watched_seconds: f64, duration_seconds: u32) -> bool {
        duration_seconds > 0
            && watched_seconds * 100.0 >= f64::from(duration_seconds) * f64::from(self.percent)
    }

    /// `completed / total >= threshold`; an empty module is vacuously met
    pub fn ratio_met(&self, completed: usize, total: usize) -> bool {
        if total == 0 {
            return true;
        }
        (completed as u64) * 100 >= (total as u64) * u64::from(self.percent)
    }
}

impl Default for CompletionThreshold {
    fn default() -> Self {
        Self {
            percent: DEFAULT_COMPLETION_PERCENT,
        }
    }
}

/// How an incoming report is merged into an existing record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Keep the highest watched position; completion never regresses
    #[default]
    KeepMax,
    /// The latest report overwrites position and completion
    LastWriteWins,
}

impl MergePolicy {
    /// Merge `update` into `existing`. `lastWatched` never moves backwards.
    pub fn merge(&self, existing: Option<&ProgressRecord>, update: &ProgressUpdate) -> ProgressRecord {
        let Some(existing) = existing else {
            return ProgressRecord {
                learner_id: update.learner_id.clone(),
                session_id: update.session_id.clone(),
                watched_seconds: update.watched_seconds.max(0.0),
                completed: update.completed,
                last_watched: update.reported_at,
            };
        };

        let (watched_seconds, completed) = match self {
            MergePolicy::KeepMax => (
                existing.watched_seconds.max(update.watched_seconds),
                existing.completed || update.completed,
            ),
            MergePolicy::LastWriteWins => (update.watched_seconds, update.completed),
        };

        ProgressRecord {
            learner_id: existing.learner_id.clone(),
            session_id: existing.session_id.clone(),
            watched_seconds: watched_seconds.max(0.0),
            completed,
            last_watched: existing.last_watched.max(update.reported_at),
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::KeepMax => write!(f, "keep-max"),
            MergePolicy::LastWriteWins => write!(f, "last-write-wins"),
        }
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep-max" | "max" => Ok(MergePolicy::KeepMax),
            "last-write-wins" | "lww" => Ok(MergePolicy::LastWriteWins),
            other => Err(format!(
                "unknown merge policy '{}', expected keep-max or last-write-wins",
                other
            )),
        }
    }
}

/// Tunables shared by all services
#[derive(Debug, Clone, Copy)]
pub struct ProgressPolicy {
    pub completion: CompletionThreshold,
    pub merge: MergePolicy,
    pub credential_ttl: Duration,
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self {
            completion: CompletionThreshold::default(),
            merge: MergePolicy::default(),
            credential_ttl: Duration::seconds(DEFAULT_CREDENTIAL_TTL_SECONDS as i64),
        }
    }
}

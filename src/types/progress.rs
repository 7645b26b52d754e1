//! Watch progress records and the values derived from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable per-(learner, session) watch state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub learner_id: String,
    pub session_id: String,
    pub watched_seconds: f64,
    pub completed: bool,
    pub last_watched: DateTime<Utc>,
}

impl ProgressRecord {
    /// Zeroed record created on first access
    pub fn zeroed(learner_id: &str, session_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            session_id: session_id.to_string(),
            watched_seconds: 0.0,
            completed: false,
            last_watched: now,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            watched_seconds: self.watched_seconds,
            completed: self.completed,
            last_watched: self.last_watched,
        }
    }
}

/// Progress view returned alongside a credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub watched_seconds: f64,
    pub completed: bool,
    pub last_watched: DateTime<Utc>,
}

/// Incoming watch report after completion has been derived
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub learner_id: String,
    pub session_id: String,
    pub watched_seconds: f64,
    pub completed: bool,
    pub reported_at: DateTime<Utc>,
}

/// Signed, time-limited fetch descriptor produced by a credential issuer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedFetch {
    pub fetch_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Ephemeral viewing credential; never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub fetch_url: String,
    pub expires_at: DateTime<Utc>,
    /// Duration of the video the credential unlocks
    pub duration_seconds: u32,
}

/// Successful result of an access request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    #[serde(flatten)]
    pub credential: Credential,
    pub progress: ProgressSnapshot,
}

/// Per-session line of a module breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub session_id: String,
    pub title: String,
    pub order_index: u32,
    pub duration_seconds: u32,
    pub has_content: bool,
    pub watched_seconds: f64,
    pub completed: bool,
    pub last_watched: Option<DateTime<Utc>>,
}

/// Module-level rollup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleProgress {
    pub module_id: String,
    pub title: String,
    pub order: u32,
    /// Content-bearing sessions only
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub percentage: f64,
    pub sessions: Vec<SessionProgress>,
}

/// Course-level rollup across every module of the enrolled program
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub program_id: String,
    pub modules: Vec<ModuleProgress>,
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub overall_percentage: f64,
}

/// Share of completed sessions as a percentage, rounded to two decimals.
/// An empty set is vacuously complete.
pub fn completion_percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let raw = completed as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

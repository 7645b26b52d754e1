//! Curriculum and enrollment records owned by external collaborators

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Enrollment status as reported by the enrollment oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnrollmentStatus {
    Active,
    Inactive,
    Suspended,
    Pending,
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollmentStatus::Active => write!(f, "ACTIVE"),
            EnrollmentStatus::Inactive => write!(f, "INACTIVE"),
            EnrollmentStatus::Suspended => write!(f, "SUSPENDED"),
            EnrollmentStatus::Pending => write!(f, "PENDING"),
        }
    }
}

/// A learner's enrollment in a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub learner_id: String,
    pub program_id: String,
    pub status: EnrollmentStatus,
    /// End of the validity window (inclusive)
    pub valid_until: DateTime<Utc>,
}

impl Enrollment {
    /// Access is permitted only while ACTIVE and `now <= valid_until`
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == EnrollmentStatus::Active && now <= self.valid_until
    }
}

/// A program: the root of the curriculum tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub title: String,
    /// Module ids in program order
    pub module_ids: Vec<String>,
}

/// An ordered unit of curriculum within a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub program_id: String,
    pub title: String,
    /// 1-based, unique within the program
    pub order: u32,
    /// Session ids in module order
    pub session_ids: Vec<String>,
}

/// The smallest content unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub module_id: String,
    pub title: String,
    pub order_index: u32,
    /// Video duration; 0 while no content is assigned
    pub duration_seconds: u32,
    /// Locator of the video asset, if one is assigned
    pub locator: Option<String>,
}

impl Session {
    /// Assigned locator, ignoring blank values
    pub fn content_locator(&self) -> Option<&str> {
        self.locator
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }

    /// Whether the session can be watched and counts toward module completion
    pub fn has_content(&self) -> bool {
        self.content_locator().is_some()
    }
}

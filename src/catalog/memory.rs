//! In-process catalog loaded from a TOML file
//!
//! ```toml
//! [[programs]]
//! id = "program-a"
//! title = "Foundations"
//!
//! [[programs.modules]]
//! id = "module-1"
//! title = "Getting started"
//! order = 1
//!
//! [[programs.modules.sessions]]
//! id = "session-1"
//! title = "Welcome"
//! order_index = 1
//! duration_seconds = 600
//! locator = "videos/welcome.mp4"
//!
//! [[enrollments]]
//! learner_id = "learner-1"
//! program_id = "program-a"
//! status = "ACTIVE"
//! valid_until = "2027-01-01T00:00:00Z"
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

use super::{CurriculumDirectory, EnrollmentOracle};
use crate::types::{Enrollment, EnrollmentStatus, GateError, Module, Program, Result, Session};

/// On-disk catalog layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub programs: Vec<ProgramEntry>,
    #[serde(default)]
    pub enrollments: Vec<EnrollmentEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramEntry {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub order: u32,
    #[serde(default)]
    pub sessions: Vec<SessionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub order_index: u32,
    #[serde(default)]
    pub duration_seconds: u32,
    #[serde(default)]
    pub locator: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentEntry {
    pub learner_id: String,
    pub program_id: String,
    pub status: EnrollmentStatus,
    pub valid_until: DateTime<Utc>,
}

impl From<EnrollmentEntry> for Enrollment {
    fn from(entry: EnrollmentEntry) -> Self {
        Self {
            learner_id: entry.learner_id,
            program_id: entry.program_id,
            status: entry.status,
            valid_until: entry.valid_until,
        }
    }
}

/// Indexed curriculum tree plus enrollments
pub struct Catalog {
    programs: HashMap<String, Program>,
    modules: HashMap<String, Module>,
    sessions: HashMap<String, Session>,
    /// Keyed by learner id
    enrollments: DashMap<String, Vec<Enrollment>>,
}

impl Catalog {
    /// Load and validate a catalog file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_toml_str(&content)?;
        info!(
            path = %path.as_ref().display(),
            programs = catalog.programs.len(),
            modules = catalog.modules.len(),
            sessions = catalog.sessions.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| GateError::Config(format!("Invalid catalog: {}", e)))?;
        Self::from_file(file)
    }

    /// Build the indexes, rejecting duplicate ids and module orders
    pub fn from_file(file: CatalogFile) -> Result<Self> {
        let mut programs = HashMap::new();
        let mut modules = HashMap::new();
        let mut sessions = HashMap::new();

        for program in file.programs {
            if programs.contains_key(&program.id) {
                return Err(GateError::Config(format!("duplicate program id '{}'", program.id)));
            }

            let mut entries = program.modules;
            entries.sort_by_key(|m| m.order);

            let mut seen_orders = HashSet::new();
            let mut module_ids = Vec::with_capacity(entries.len());

            for module in entries {
                if module.order == 0 {
                    return Err(GateError::Config(format!(
                        "module '{}' has order 0; orders are 1-based",
                        module.id
                    )));
                }
                if !seen_orders.insert(module.order) {
                    return Err(GateError::Config(format!(
                        "program '{}' has two modules with order {}",
                        program.id, module.order
                    )));
                }
                if modules.contains_key(&module.id) {
                    return Err(GateError::Config(format!("duplicate module id '{}'", module.id)));
                }

                let mut session_entries = module.sessions;
                session_entries.sort_by_key(|s| s.order_index);

                let mut session_ids = Vec::with_capacity(session_entries.len());
                for session in session_entries {
                    if sessions.contains_key(&session.id) {
                        return Err(GateError::Config(format!(
                            "duplicate session id '{}'",
                            session.id
                        )));
                    }
                    session_ids.push(session.id.clone());
                    sessions.insert(
                        session.id.clone(),
                        Session {
                            id: session.id,
                            module_id: module.id.clone(),
                            title: session.title,
                            order_index: session.order_index,
                            duration_seconds: session.duration_seconds,
                            locator: session.locator,
                        },
                    );
                }

                module_ids.push(module.id.clone());
                modules.insert(
                    module.id.clone(),
                    Module {
                        id: module.id,
                        program_id: program.id.clone(),
                        title: module.title,
                        order: module.order,
                        session_ids,
                    },
                );
            }

            programs.insert(
                program.id.clone(),
                Program {
                    id: program.id,
                    title: program.title,
                    module_ids,
                },
            );
        }

        let enrollments: DashMap<String, Vec<Enrollment>> = DashMap::new();
        for entry in file.enrollments {
            enrollments
                .entry(entry.learner_id.clone())
                .or_default()
                .push(entry.into());
        }

        Ok(Self {
            programs,
            modules,
            sessions,
            enrollments,
        })
    }

    /// Insert or replace the learner's enrollment in `enrollment.program_id`
    pub fn upsert_enrollment(&self, enrollment: Enrollment) {
        let mut entry = self
            .enrollments
            .entry(enrollment.learner_id.clone())
            .or_default();
        entry.retain(|e| e.program_id != enrollment.program_id);
        entry.push(enrollment);
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl CurriculumDirectory for Catalog {
    async fn session(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(session_id).cloned())
    }

    async fn module(&self, module_id: &str) -> Result<Option<Module>> {
        Ok(self.modules.get(module_id).cloned())
    }

    async fn program(&self, program_id: &str) -> Result<Option<Program>> {
        Ok(self.programs.get(program_id).cloned())
    }

    async fn modules_in_program(&self, program_id: &str) -> Result<Vec<Module>> {
        let Some(program) = self.programs.get(program_id) else {
            return Ok(Vec::new());
        };
        Ok(program
            .module_ids
            .iter()
            .filter_map(|id| self.modules.get(id).cloned())
            .collect())
    }

    async fn sessions_in_module(&self, module_id: &str) -> Result<Vec<Session>> {
        let Some(module) = self.modules.get(module_id) else {
            return Ok(Vec::new());
        };
        Ok(module
            .session_ids
            .iter()
            .filter_map(|id| self.sessions.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl EnrollmentOracle for Catalog {
    async fn enrollments_for(&self, learner_id: &str) -> Result<Vec<Enrollment>> {
        Ok(self
            .enrollments
            .get(learner_id)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }
}

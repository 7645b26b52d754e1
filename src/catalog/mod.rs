//! Read-only collaborators: curriculum directory and enrollment oracle
//!
//! Both are owned by surrounding systems. The core only reads through these
//! traits; [`Catalog`] is the in-process implementation loaded from TOML.

pub mod memory;

pub use memory::{Catalog, CatalogFile, EnrollmentEntry, ModuleEntry, ProgramEntry, SessionEntry};

use async_trait::async_trait;

use crate::types::{Enrollment, Module, Program, Result, Session};

/// Program → ordered modules → ordered sessions
#[async_trait]
pub trait CurriculumDirectory: Send + Sync {
    async fn session(&self, session_id: &str) -> Result<Option<Session>>;

    async fn module(&self, module_id: &str) -> Result<Option<Module>>;

    async fn program(&self, program_id: &str) -> Result<Option<Program>>;

    /// Modules of a program sorted by `order`
    async fn modules_in_program(&self, program_id: &str) -> Result<Vec<Module>>;

    /// Sessions of a module sorted by `order_index`
    async fn sessions_in_module(&self, module_id: &str) -> Result<Vec<Session>>;
}

/// Answers "which enrollments does this learner hold"
#[async_trait]
pub trait EnrollmentOracle: Send + Sync {
    async fn enrollments_for(&self, learner_id: &str) -> Result<Vec<Enrollment>>;
}

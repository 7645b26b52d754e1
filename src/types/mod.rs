//! Shared types for course-gate

pub mod curriculum;
pub mod error;
pub mod progress;

pub use curriculum::{Enrollment, EnrollmentStatus, Module, Program, Session};
pub use error::{ErrorKind, GateError, Result};
pub use progress::{
    completion_percentage, AccessGrant, CourseProgress, Credential, ModuleProgress,
    ProgressRecord, ProgressSnapshot, ProgressUpdate, SessionProgress, SignedFetch,
};

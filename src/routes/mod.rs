//! HTTP route handlers
//!
//! Handlers receive an already-resolved learner id and delegate to the
//! services; they never make access decisions themselves.

pub mod access;
pub mod health;
pub mod keys;
pub mod modules;
pub mod progress;
pub mod response;

pub use access::handle_access;
pub use health::health_check;
pub use keys::handle_content_keys;
pub use modules::{handle_module_access, handle_module_progress};
pub use progress::{handle_course_progress, handle_record_progress};

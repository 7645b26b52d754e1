//! course-gate - video access and progression control
//!
//! Issues short-lived signed fetch URLs to learners with a usable enrollment,
//! records per-session watch progress, and decides whether a learner may
//! enter the next module of a program.

pub mod auth;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod events;
pub mod policy;
pub mod routes;
pub mod server;
pub mod services;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use services::{Collaborators, Services};
pub use types::{GateError, Result};

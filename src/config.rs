//! Configuration for course-gate
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::events::DEFAULT_QUEUE_CAPACITY;
use crate::policy::{
    CompletionThreshold, MergePolicy, ProgressPolicy, DEFAULT_COMPLETION_PERCENT,
    DEFAULT_CREDENTIAL_TTL_SECONDS, MAX_CREDENTIAL_TTL_SECONDS,
};
use crate::types::GateError;

/// course-gate - enrollment-checked video access and course progression
#[derive(Parser, Debug, Clone)]
#[command(name = "course-gate")]
#[command(about = "Video access and progression control for enrolled learners")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (X-Learner-Id header, generated signing key)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// JWT secret shared with the identity layer (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Lifetime of tokens minted by tooling
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Curriculum and enrollment catalog (TOML)
    #[arg(long, env = "CATALOG_PATH", default_value = "catalog.toml")]
    pub catalog_path: PathBuf,

    /// Directory for the sled progress store; in-memory when unset
    #[arg(long, env = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Base URL that signed fetch URLs point at
    #[arg(long, env = "CONTENT_BASE_URL", default_value = "http://localhost:9000/media")]
    pub content_base_url: String,

    /// Base64 Ed25519 seed (32 bytes) for signing fetch URLs
    #[arg(long, env = "SIGNING_KEY")]
    pub signing_key: Option<String>,

    /// Lifetime of issued viewing credentials
    #[arg(long, env = "CREDENTIAL_TTL_SECONDS", default_value_t = DEFAULT_CREDENTIAL_TTL_SECONDS)]
    pub credential_ttl_seconds: u64,

    /// Completion threshold in percent
    #[arg(long, env = "COMPLETION_THRESHOLD_PERCENT", default_value_t = DEFAULT_COMPLETION_PERCENT)]
    pub completion_threshold_percent: u32,

    /// How concurrent progress reports merge (keep-max, last-write-wins)
    #[arg(long, env = "MERGE_POLICY", default_value = "keep-max")]
    pub merge_policy: MergePolicy,

    /// Analytics collector endpoint; events stay in-process when unset
    #[arg(long, env = "ANALYTICS_URL")]
    pub analytics_url: Option<String>,

    /// Analytics request timeout in milliseconds
    #[arg(long, env = "ANALYTICS_TIMEOUT_MS", default_value = "2000")]
    pub analytics_timeout_ms: u64,

    /// Events buffered ahead of the analytics delivery worker
    #[arg(long, env = "ANALYTICS_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub analytics_queue_capacity: usize,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.jwt_secret.is_none() {
                return Err("JWT_SECRET is required in production mode".to_string());
            }
            if self.signing_key.is_none() {
                return Err("SIGNING_KEY is required in production mode".to_string());
            }
        }

        if self.completion_threshold_percent == 0 || self.completion_threshold_percent > 100 {
            return Err("COMPLETION_THRESHOLD_PERCENT must be within 1..=100".to_string());
        }

        if !(1..=MAX_CREDENTIAL_TTL_SECONDS).contains(&self.credential_ttl_seconds) {
            return Err(format!(
                "CREDENTIAL_TTL_SECONDS must be within 1..={}",
                MAX_CREDENTIAL_TTL_SECONDS
            ));
        }

        if self.analytics_timeout_ms == 0 {
            return Err("ANALYTICS_TIMEOUT_MS must be greater than zero".to_string());
        }

        if self.analytics_queue_capacity == 0 {
            return Err("ANALYTICS_QUEUE_CAPACITY must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Threshold, merge policy and TTL as one value
    pub fn progress_policy(&self) -> Result<ProgressPolicy, GateError> {
        if self.credential_ttl_seconds > MAX_CREDENTIAL_TTL_SECONDS {
            return Err(GateError::Config("CREDENTIAL_TTL_SECONDS is too large".into()));
        }
        let ttl = self.credential_ttl_seconds as i64;

        Ok(ProgressPolicy {
            completion: CompletionThreshold::new(self.completion_threshold_percent)?,
            merge: self.merge_policy,
            credential_ttl: chrono::Duration::seconds(ttl),
        })
    }

    pub fn analytics_timeout(&self) -> Duration {
        Duration::from_millis(self.analytics_timeout_ms)
    }
}

//! Liveness endpoint

use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use serde::Serialize;

use super::response::ok;
use crate::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Seconds since startup
    pub uptime: u64,
    pub merge_policy: String,
    pub completion_threshold_percent: u32,
    pub store: &'static str,
    pub dev_mode: bool,
}

pub fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    let policy = state.services.policy;
    ok(&HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        merge_policy: policy.merge.to_string(),
        completion_threshold_percent: policy.completion.percent(),
        store: state.services.store.backend(),
        dev_mode: state.dev_mode,
    })
}

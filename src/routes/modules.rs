//! GET /module/{moduleId}/progress and GET /module/{moduleId}/access

use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use serde::Serialize;

use super::response::{error_response, ok};
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleAccess {
    pub can_access: bool,
    pub module_id: String,
}

pub async fn handle_module_progress(
    state: &AppState,
    learner_id: &str,
    module_id: &str,
) -> Response<Full<Bytes>> {
    match state
        .services
        .aggregator
        .module_summary_by_id(learner_id, module_id)
        .await
    {
        Ok(summary) => ok(&summary),
        Err(e) => error_response(&e),
    }
}

pub async fn handle_module_access(
    state: &AppState,
    learner_id: &str,
    module_id: &str,
) -> Response<Full<Bytes>> {
    match state.services.gate.can_access_module(learner_id, module_id).await {
        Ok(can_access) => ok(&ModuleAccess {
            can_access,
            module_id: module_id.to_string(),
        }),
        Err(e) => error_response(&e),
    }
}

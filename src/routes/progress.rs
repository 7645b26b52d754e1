//! POST /progress and GET /course/progress

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::response::{error_response, json_response, ok};
use crate::server::AppState;
use crate::types::{GateError, ProgressSnapshot};

/// Body of POST /progress
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub session_id: String,
    pub watched_seconds: f64,
    #[serde(default)]
    pub completed: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressAck {
    pub success: bool,
    pub session_id: String,
    pub progress: ProgressSnapshot,
}

pub async fn handle_record_progress(
    state: &AppState,
    learner_id: &str,
    body: &[u8],
) -> Response<Full<Bytes>> {
    let report: ProgressReport = match serde_json::from_slice(body) {
        Ok(report) => report,
        Err(e) => {
            return error_response(&GateError::Validation(format!("invalid progress report: {}", e)))
        }
    };

    let result = state
        .services
        .recorder
        .record_progress(
            learner_id,
            &report.session_id,
            report.watched_seconds,
            report.completed,
        )
        .await;

    match result {
        Ok(record) => ok(&ProgressAck {
            success: true,
            session_id: record.session_id.clone(),
            progress: record.snapshot(),
        }),
        Err(e) => error_response(&e),
    }
}

pub async fn handle_course_progress(state: &AppState, learner_id: &str) -> Response<Full<Bytes>> {
    match state.services.aggregator.course_progress(learner_id).await {
        Ok(Some(course)) => ok(&course),
        Ok(None) => json_response(
            StatusCode::NOT_FOUND,
            &serde_json::json!({ "error": "not_found", "reason": "no_active_enrollment" }),
        ),
        Err(e) => error_response(&e),
    }
}

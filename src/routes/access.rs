//! GET /access/{sessionId}

use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;

use super::response::from_result;
use crate::server::AppState;

pub async fn handle_access(state: &AppState, learner_id: &str, session_id: &str) -> Response<Full<Bytes>> {
    from_result(state.services.access.request_access(learner_id, session_id).await)
}

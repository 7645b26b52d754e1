//! HTTP response building helpers

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::{error, warn};

use crate::types::{ErrorKind, GateError};

/// Build a JSON response with the given status code
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Build a JSON response with 200 OK status
pub fn ok<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, body)
}

pub fn not_found() -> Response<Full<Bytes>> {
    json_response(StatusCode::NOT_FOUND, &serde_json::json!({ "error": "not_found" }))
}

pub fn payload_too_large() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        &serde_json::json!({ "error": "invalid_request", "reason": "body_too_large" }),
    )
}

/// Convert a GateError to an HTTP response
///
/// The body carries the taxonomy class and a reason code. Validation errors
/// also carry their message; nothing else does.
pub fn error_response(err: &GateError) -> Response<Full<Bytes>> {
    match err.kind() {
        ErrorKind::Storage | ErrorKind::Internal => error!(error = %err, "Request failed"),
        ErrorKind::Analytics => warn!(error = %err, "Analytics error reached a handler"),
        _ => {}
    }

    let body = match err {
        GateError::Validation(message) => serde_json::json!({
            "error": err.kind().code(),
            "reason": err.reason_code(),
            "message": message,
        }),
        _ => serde_json::json!({
            "error": err.kind().code(),
            "reason": err.reason_code(),
        }),
    };

    json_response(err.status_code(), &body)
}

/// Wrap a service result into an HTTP response
pub fn from_result<T: Serialize>(result: Result<T, GateError>) -> Response<Full<Bytes>> {
    match result {
        Ok(value) => ok(&value),
        Err(e) => error_response(&e),
    }
}

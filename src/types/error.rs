//! Error types for course-gate
//!
//! Every failure surfaced by the core belongs to one taxonomy class (see
//! [`ErrorKind`]). Authorization, not-found, content and validation failures
//! are deterministic and reported to the caller as-is; storage failures are
//! reported as a generic failure; analytics failures never leave the recorder.

use hyper::StatusCode;

/// Taxonomy class of a [`GateError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authorization,
    NotFound,
    ContentUnavailable,
    Validation,
    Storage,
    Analytics,
    Unauthenticated,
    Internal,
}

impl ErrorKind {
    /// Stable code used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authorization => "access_denied",
            Self::NotFound => "not_found",
            Self::ContentUnavailable => "content_unavailable",
            Self::Validation => "invalid_request",
            Self::Storage => "storage_unavailable",
            Self::Analytics => "analytics_failed",
            Self::Unauthenticated => "unauthorized",
            Self::Internal => "internal_error",
        }
    }
}

/// Main error type for course-gate operations
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Learner is not enrolled")]
    NotEnrolled,

    #[error("Enrollment is not active or has expired")]
    EnrollmentExpired,

    #[error("Session is not part of an enrolled program")]
    SessionNotInProgram,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("No content assigned to session: {0}")]
    ContentUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Analytics error: {0}")]
    Analytics(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Taxonomy class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotEnrolled | Self::EnrollmentExpired | Self::SessionNotInProgram => {
                ErrorKind::Authorization
            }
            Self::SessionNotFound(_) | Self::ModuleNotFound(_) => ErrorKind::NotFound,
            Self::ContentUnavailable(_) => ErrorKind::ContentUnavailable,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Analytics(_) => ErrorKind::Analytics,
            Self::Unauthorized(_) => ErrorKind::Unauthenticated,
            Self::Config(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Minimal reason code. Never carries identifiers or backend detail.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::NotEnrolled => "not_enrolled",
            Self::EnrollmentExpired => "enrollment_expired",
            Self::SessionNotInProgram => "session_not_in_program",
            Self::SessionNotFound(_) => "session_not_found",
            Self::ModuleNotFound(_) => "module_not_found",
            Self::ContentUnavailable(_) => "content_unavailable",
            Self::Validation(_) => "validation_failed",
            Self::Storage(_) => "storage_error",
            Self::Analytics(_) => "analytics_error",
            Self::Unauthorized(_) => "unauthorized",
            Self::Config(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::NotFound | ErrorKind::ContentUnavailable => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Storage => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Analytics | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sled::Error> for GateError {
    fn from(err: sled::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for GateError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Storage(format!("Serialization error: {}", err))
    }
}

impl From<rmp_serde::decode::Error> for GateError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::Storage(format!("Deserialization error: {}", err))
    }
}

impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for GateError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

/// Result type alias for course-gate operations
pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_errors_map_to_forbidden() {
        for err in [
            GateError::NotEnrolled,
            GateError::EnrollmentExpired,
            GateError::SessionNotInProgram,
        ] {
            assert_eq!(err.kind(), ErrorKind::Authorization);
            assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn test_not_found_and_content_unavailable_map_to_404() {
        assert_eq!(
            GateError::SessionNotFound("s".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GateError::ContentUnavailable("s".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GateError::ContentUnavailable("s".into()).kind(),
            ErrorKind::ContentUnavailable
        );
    }

    #[test]
    fn test_storage_reason_hides_detail() {
        let err = GateError::Storage("disk on fire at /var/lib/x".into());
        assert_eq!(err.reason_code(), "storage_error");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

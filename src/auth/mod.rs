//! Learner identity for HTTP requests
//!
//! The services trust whatever learner id they are handed. This adapter is the
//! only place that id is derived from a request.

pub mod jwt;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenValidationResult};

use hyper::header::AUTHORIZATION;
use hyper::HeaderMap;
use tracing::debug;

use crate::types::GateError;

/// Dev-mode header naming the learner directly
pub const LEARNER_HEADER: &str = "x-learner-id";

/// Resolve the calling learner from a bearer token, or from
/// [`LEARNER_HEADER`] when `dev_mode` is on and no token is present.
pub fn resolve_learner(
    headers: &HeaderMap,
    validator: &JwtValidator,
    dev_mode: bool,
) -> Result<String, GateError> {
    let auth_header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    if let Some(token) = extract_token_from_header(auth_header) {
        let result = validator.verify_token(token);
        return match result.claims {
            Some(claims) if result.valid => Ok(claims.sub),
            _ => {
                let reason = result.error.unwrap_or_else(|| "Invalid token".into());
                debug!(reason = %reason, "Rejected bearer token");
                Err(GateError::Unauthorized(reason))
            }
        };
    }

    if dev_mode {
        if let Some(learner) = headers
            .get(LEARNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return Ok(learner.to_string());
        }
    }

    Err(GateError::Unauthorized("Missing credentials".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_bearer_token_resolves_subject() {
        let validator = JwtValidator::new_dev();
        let token = validator.generate_token("learner-7").unwrap();
        let bearer = format!("Bearer {}", token);

        let learner = resolve_learner(&headers(&[("authorization", &bearer)]), &validator, false);
        assert_eq!(learner.unwrap(), "learner-7");
    }

    #[test]
    fn test_bad_token_not_rescued_by_dev_header() {
        let validator = JwtValidator::new_dev();
        let map = headers(&[("authorization", "Bearer garbage"), (LEARNER_HEADER, "learner-7")]);

        assert!(matches!(
            resolve_learner(&map, &validator, true),
            Err(GateError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_learner_header_only_in_dev_mode() {
        let validator = JwtValidator::new_dev();
        let map = headers(&[(LEARNER_HEADER, "learner-7")]);

        assert_eq!(resolve_learner(&map, &validator, true).unwrap(), "learner-7");
        assert!(resolve_learner(&map, &validator, false).is_err());
    }

    #[test]
    fn test_missing_credentials() {
        let validator = JwtValidator::new_dev();
        assert!(resolve_learner(&HeaderMap::new(), &validator, true).is_err());
    }
}

//! Publication of the fetch-URL verifying key
//!
//! JWKS-style document so the content edge can validate signed fetch URLs.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bytes::Bytes;
use ed25519_dalek::VerifyingKey;
use http_body_util::Full;
use hyper::header::{self, HeaderValue};
use hyper::Response;
use serde::Serialize;

use super::response::ok;

pub const CONTENT_KEY_ID: &str = "content-key-1";

#[derive(Debug, Serialize)]
pub struct JwkKey {
    pub kty: String,
    pub crv: String,
    #[serde(rename = "use")]
    pub key_use: String,
    pub kid: String,
    pub x: String,
}

#[derive(Debug, Serialize)]
pub struct JwksResponse {
    pub keys: Vec<JwkKey>,
}

pub fn jwks(verifying_key: &VerifyingKey) -> JwksResponse {
    JwksResponse {
        keys: vec![JwkKey {
            kty: "OKP".to_string(),
            crv: "Ed25519".to_string(),
            key_use: "sig".to_string(),
            kid: CONTENT_KEY_ID.to_string(),
            x: URL_SAFE_NO_PAD.encode(verifying_key.to_bytes()),
        }],
    }
}

pub fn handle_content_keys(verifying_key: &VerifyingKey) -> Response<Full<Bytes>> {
    let mut response = ok(&jwks(verifying_key));
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=300"));
    response
}

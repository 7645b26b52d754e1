//! Viewing credential issuance
//!
//! The core asks a [`CredentialIssuer`] to turn a content locator into a
//! short-lived fetch descriptor. It never stores what it receives; expiry is
//! enforced by whoever validates the signature at fetch time.

pub mod signed_url;

pub use signed_url::{SignedUrlIssuer, SIGNATURE_PARAM, EXPIRES_PARAM};

use async_trait::async_trait;
use chrono::Duration;

use crate::types::{Result, SignedFetch};

#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue(&self, locator: &str, ttl: Duration) -> Result<SignedFetch>;
}

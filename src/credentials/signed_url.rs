//! Ed25519-signed fetch URLs
//!
//! A fetch URL has the form
//! `{base}/{locator}?expires={unix}&signature={base64url}` where the signature
//! covers `"{locator}\n{expires}"`. The content edge only needs the verifying
//! key (published at `/.well-known/content-keys`) to validate it.

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::debug;

use super::CredentialIssuer;
use crate::clock::Clock;
use crate::types::{GateError, Result, SignedFetch};

pub const EXPIRES_PARAM: &str = "expires";
pub const SIGNATURE_PARAM: &str = "signature";

/// Ed25519 seed length
const SEED_LEN: usize = 32;

pub struct SignedUrlIssuer {
    base_url: String,
    signing_key: SigningKey,
    clock: Arc<dyn Clock>,
}

impl SignedUrlIssuer {
    pub fn new(base_url: &str, signing_key: SigningKey, clock: Arc<dyn Clock>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            signing_key,
            clock,
        }
    }

    /// Issuer with a fresh random key; URLs stop verifying after a restart
    pub fn generate(base_url: &str, clock: Arc<dyn Clock>) -> Self {
        Self::new(base_url, SigningKey::generate(&mut OsRng), clock)
    }

    /// Issuer from a base64-encoded 32-byte seed
    pub fn from_seed_base64(base_url: &str, seed: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        let bytes = STANDARD
            .decode(seed.trim())
            .map_err(|e| GateError::Config(format!("SIGNING_KEY is not valid base64: {}", e)))?;
        let seed: [u8; SEED_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            GateError::Config(format!(
                "SIGNING_KEY must decode to {} bytes, got {}",
                SEED_LEN,
                b.len()
            ))
        })?;
        Ok(Self::new(base_url, SigningKey::from_bytes(&seed), clock))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Fetch-time validation against this issuer's key
    pub fn verify(
        &self,
        locator: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        verify_fetch(&self.verifying_key(), locator, expires, signature, now)
    }

    fn fetch_url(&self, locator: &str, expires: i64, signature: &Signature) -> String {
        let path = locator
            .trim_start_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        format!(
            "{}/{}?{}={}&{}={}",
            self.base_url,
            path,
            EXPIRES_PARAM,
            expires,
            SIGNATURE_PARAM,
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        )
    }
}

fn signing_payload(locator: &str, expires: i64) -> String {
    format!("{}\n{}", locator.trim_start_matches('/'), expires)
}

/// Validate a fetch signature and its expiry with only the verifying key
pub fn verify_fetch(
    key: &VerifyingKey,
    locator: &str,
    expires: i64,
    signature: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    if now.timestamp() > expires {
        return Err(GateError::Unauthorized("credential expired".into()));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| GateError::Unauthorized("malformed signature".into()))?;
    let signature = Signature::from_slice(&bytes)
        .map_err(|_| GateError::Unauthorized("malformed signature".into()))?;

    key.verify(signing_payload(locator, expires).as_bytes(), &signature)
        .map_err(|_| GateError::Unauthorized("invalid signature".into()))
}

#[async_trait]
impl CredentialIssuer for SignedUrlIssuer {
    async fn issue(&self, locator: &str, ttl: Duration) -> Result<SignedFetch> {
        if locator.trim().is_empty() {
            return Err(GateError::Validation("empty content locator".into()));
        }

        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .ok_or_else(|| GateError::Config(format!("credential ttl {} overflows", ttl)))?;
        let expires = expires_at.timestamp();
        let signature = self.signing_key.sign(signing_payload(locator, expires).as_bytes());

        debug!(locator = %locator, expires = expires, "Issued signed fetch URL");

        Ok(SignedFetch {
            fetch_url: self.fetch_url(locator, expires, &signature),
            expires_at,
        })
    }
}

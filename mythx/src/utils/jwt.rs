//! JWT helpers for reading token expiry.
//!
//! The client only needs to know when the tokens it received from the API
//! expire. Tokens are decoded WITHOUT verifying their signature: the client
//! has no key to verify them with and only inspects tokens it just received
//! from the service over TLS. This is not a security boundary and must never
//! be used to authenticate third-party tokens.

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};

use crate::errors::{MythXError, MythXResult};

/// The subset of claims the client reads from MythX tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Expiration as a UNIX timestamp. The API emits fractional seconds.
    pub exp: f64,
    /// Issued-at timestamp, when present.
    #[serde(default)]
    pub iat: Option<f64>,
    /// Issuer, when present.
    #[serde(default)]
    pub iss: Option<String>,
}

impl Claims {
    /// Token expiration as a UTC timestamp.
    pub fn expires_at(&self) -> MythXResult<DateTime<Utc>> {
        let secs = self.exp.trunc() as i64;
        let nanos = (self.exp.fract() * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
        DateTime::from_timestamp(secs, nanos)
            .ok_or_else(|| MythXError::decode(format!("Token expiry out of range: {}", self.exp)))
    }

    /// Check if token has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> MythXResult<bool> {
        Ok(now >= self.expires_at()?)
    }
}

/// Decodes a token's claims without signature verification.
pub fn decode_claims(token: &str) -> MythXResult<Claims> {
    let header = decode_header(token)
        .map_err(|e| MythXError::decode(format!("Token header decoding failed: {}", e)))?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|token_data| token_data.claims)
        .map_err(|e| MythXError::decode(format!("Token decoding failed: {}", e)))
}

/// Reads the embedded expiration of `token`.
pub fn expires_at(token: &str) -> MythXResult<DateTime<Utc>> {
    decode_claims(token)?.expires_at()
}

//! Compact HS256 token codec for bearer sessions.
//!
//! Tokens are three base64url segments (`header.claims.signature`) signed with
//! HMAC-SHA256 using the configured secret. Only the `HS256` algorithm is
//! accepted when verifying.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

type HmacSha256 = Hmac<Sha256>;

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account the token was issued for.
    pub sub: Uuid,
    /// Identifier of the session row backing this token.
    pub jti: String,
    /// Issue time, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn decode_segment(segment: &str) -> ServiceResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_e| ServiceError::NotAuthenticated)
}

/// ## Summary
/// Signs session claims into a compact HS256 token.
///
/// ## Errors
/// Returns `InvalidConfiguration` if the claims cannot be serialized or the
/// signing secret is unusable.
pub fn sign(claims: &SessionClaims, secret: &str) -> ServiceResult<String> {
    let header = TokenHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let header_json = serde_json::to_vec(&header).map_err(|e| {
        ServiceError::InvalidConfiguration(format!("Failed to encode token header: {e}"))
    })?;
    let claims_json = serde_json::to_vec(claims).map_err(|e| {
        ServiceError::InvalidConfiguration(format!("Failed to encode token claims: {e}"))
    })?;

    let signing_input = format!(
        "{}.{}",
        encode_segment(&header_json),
        encode_segment(&claims_json)
    );

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ServiceError::InvalidConfiguration(format!("Invalid signing secret: {e}")))?;
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();

    Ok(format!("{signing_input}.{}", encode_segment(&signature)))
}

/// ## Summary
/// Verifies a compact HS256 token and returns its claims.
///
/// The signature is checked before the claims segment is parsed, and the
/// expiry is compared against `now`.
///
/// ## Errors
/// Returns `NotAuthenticated` for malformed, tampered, or expired tokens, and
/// `InvalidConfiguration` if the signing secret is unusable.
pub fn verify(token: &str, secret: &str, now: DateTime<Utc>) -> ServiceResult<SessionClaims> {
    let mut segments = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(ServiceError::NotAuthenticated);
    };

    let header: TokenHeader = serde_json::from_slice(&decode_segment(header_b64)?)
        .map_err(|_e| ServiceError::NotAuthenticated)?;
    if header.alg != "HS256" || header.typ != "JWT" {
        return Err(ServiceError::NotAuthenticated);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ServiceError::InvalidConfiguration(format!("Invalid signing secret: {e}")))?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(claims_b64.as_bytes());
    mac.verify_slice(&decode_segment(signature_b64)?)
        .map_err(|_e| ServiceError::NotAuthenticated)?;

    let claims: SessionClaims = serde_json::from_slice(&decode_segment(claims_b64)?)
        .map_err(|_e| ServiceError::NotAuthenticated)?;

    if claims.exp <= now.timestamp() {
        return Err(ServiceError::NotAuthenticated);
    }

    Ok(claims)
}

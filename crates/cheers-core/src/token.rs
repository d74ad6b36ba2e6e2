//! Expiry inspection for JWT access and refresh tokens.
//!
//! Only the claims payload is decoded. Signatures are NOT verified here;
//! that is the backend's job. The result is used solely to decide whether
//! a stored token is worth presenting or needs refreshing.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token is not a three-part JWT")]
    Malformed,

    #[error("Claims segment is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Claims segment is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token has no exp claim")]
    MissingExpiry,

    #[error("Token exp claim is out of range: {0}")]
    InvalidExpiry(i64),
}

/// The subset of registered claims the client cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Claims {
    pub exp: Option<i64>,
    pub iat: Option<i64>,
    pub sub: Option<String>,
}

/// Decode the claims segment of a JWT without verifying it.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };

    // Some issuers pad their segments even though RFC 7515 says not to
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// When the token stops being valid, according to its `exp` claim.
pub fn expires_at(token: &str) -> Result<DateTime<Utc>, TokenError> {
    let exp = decode_claims(token)?.exp.ok_or(TokenError::MissingExpiry)?;
    DateTime::from_timestamp(exp, 0).ok_or(TokenError::InvalidExpiry(exp))
}

/// Check a token against the current time. Undecodable tokens are expired.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}

/// Check a token against `now`. Undecodable tokens are expired.
pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    match expires_at(token) {
        Ok(expiry) => now >= expiry,
        Err(e) => {
            tracing::debug!(error = %e, "Treating undecodable token as expired");
            true
        }
    }
}

/// Build an unsigned token carrying the given claims JSON. Test helper.
#[cfg(test)]
pub(crate) fn unsigned(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}

//! `Authorization: Bearer <token>` extraction and verification.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AuthError;
use crate::token::{self, TokenClaims};

/// The only accepted authorization scheme.
pub const BEARER_SCHEME: &str = "Bearer";

/// A verified caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: i64,
    pub login: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&TokenClaims> for Identity {
    fn from(claims: &TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            login: claims.login.clone(),
            expires_at: claims.expires_at(),
        }
    }
}

/// Outcome of a single authentication attempt: exactly one of the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Authenticated(Identity),
    Rejected(AuthError),
}

impl AuthResult {
    pub fn into_result(self) -> Result<Identity, AuthError> {
        match self {
            AuthResult::Authenticated(identity) => Ok(identity),
            AuthResult::Rejected(reason) => Err(reason),
        }
    }
}

impl From<Result<Identity, AuthError>> for AuthResult {
    fn from(result: Result<Identity, AuthError>) -> Self {
        match result {
            Ok(identity) => AuthResult::Authenticated(identity),
            Err(reason) => AuthResult::Rejected(reason),
        }
    }
}

/// Pull the token out of an `Authorization` header value.
///
/// The value must be exactly two single-space-separated parts, the
/// first being the literal `Bearer`.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let value = match header {
        Some(v) if !v.is_empty() => v,
        _ => return Err(AuthError::HeaderMissing),
    };

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if *scheme == BEARER_SCHEME && !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// Verify an already extracted token as of `now`.
pub fn verify_token_at(
    raw: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<Identity, AuthError> {
    let claims = token::parse_token(raw, secret)?;
    if claims.is_expired_at(now) {
        return Err(AuthError::Expired);
    }
    Ok(Identity::from(&claims))
}

/// Verify the bearer token in `header` as of `now`.
pub fn authenticate_at(header: Option<&str>, secret: &[u8], now: DateTime<Utc>) -> AuthResult {
    extract_bearer(header)
        .and_then(|raw| verify_token_at(raw, secret, now))
        .into()
}

/// Verify the bearer token in `header` against the current time.
pub fn authenticate(header: Option<&str>, secret: &[u8]) -> AuthResult {
    authenticate_at(header, secret, Utc::now())
}

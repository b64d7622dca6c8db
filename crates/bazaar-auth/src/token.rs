//! HS256 bearer token issuance and parsing.
//!
//! Tokens are compact JWTs whose payload is exactly
//! `{"login": string, "user_id": integer, "exp": unix-seconds}`.
//! [`parse_token`] checks the signature and the shape of the claims but
//! deliberately leaves expiry to the caller, so that "expired" and
//! "forged" stay distinguishable.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Claims embedded in every bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub login: String,
    pub user_id: i64,
    /// Expiration (Unix timestamp, seconds).
    pub exp: i64,
}

impl TokenClaims {
    /// Claims that expire `lifetime` from now.
    pub fn new(
        user_id: i64,
        login: impl Into<String>,
        lifetime: Duration,
    ) -> Result<Self, AuthError> {
        let expires_at = Utc::now().checked_add_signed(lifetime).ok_or_else(|| {
            AuthError::InvalidDurationFormat(format!("{} days", lifetime.num_days()))
        })?;
        Ok(Self {
            login: login.into(),
            user_id,
            exp: expires_at.timestamp(),
        })
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// A token is live only while `exp` is strictly after `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Sign `claims` with the shared secret.
pub fn issue_token(claims: &TokenClaims, secret: &[u8]) -> Result<String, AuthError> {
    let key = EncodingKey::from_secret(secret);
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Verify the signature of `token` and decode its claims.
///
/// Fails with [`AuthError::SignatureInvalid`] when the signature does
/// not match (or the header names another algorithm), and with
/// [`AuthError::Malformed`] when the token cannot be decoded into
/// `login`, `user_id` and `exp`. Expired tokens parse successfully.
pub fn parse_token(token: &str, secret: &[u8]) -> Result<TokenClaims, AuthError> {
    let key = DecodingKey::from_secret(secret);

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp"]);

    jsonwebtoken::decode::<TokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::SignatureInvalid,
            _ => AuthError::Malformed(e.to_string()),
        })
}

/// Resolve a lifetime string of the form `"<days>d"` to a [`Duration`].
///
/// Lifetimes that would push an expiry issued now past the representable
/// date range are rejected.
pub fn parse_expiry(value: &str) -> Result<Duration, AuthError> {
    let invalid = || AuthError::InvalidDurationFormat(value.to_string());

    let days = value
        .trim()
        .strip_suffix('d')
        .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(invalid)?
        .parse::<i64>()
        .map_err(|_| invalid())?;

    Duration::try_days(days)
        .filter(|lifetime| Utc::now().checked_add_signed(*lifetime).is_some())
        .ok_or_else(invalid)
}

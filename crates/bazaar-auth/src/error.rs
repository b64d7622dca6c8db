//! Authentication error types.

use bazaar_core::error::BazaarError;
use thiserror::Error;

/// Every way an authentication attempt can fail.
///
/// The variants are kept distinct all the way to the HTTP boundary,
/// where each one maps to a fixed status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("authorization header is missing")]
    HeaderMissing,

    #[error("invalid authorization header format")]
    MalformedHeader,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token has expired")]
    Expired,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("login and password are required")]
    MissingCredentials,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("login is already taken")]
    DuplicateLogin,

    #[error("invalid duration format: {0:?}")]
    InvalidDurationFormat(String),

    #[error("credential store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<BazaarError> for AuthError {
    fn from(err: BazaarError) -> Self {
        match err {
            BazaarError::AlreadyExists { .. } => AuthError::DuplicateLogin,
            other => AuthError::StoreUnavailable(other.to_string()),
        }
    }
}

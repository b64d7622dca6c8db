//! Authentication configuration.

use std::fmt;

use bazaar_core::models::credential::MAX_LOGIN_LENGTH;
use chrono::Duration;

use crate::error::AuthError;
use crate::token;

/// Configuration for the authentication service.
#[derive(Clone)]
pub struct AuthConfig {
    /// Symmetric HS256 signing key.
    pub jwt_secret: String,
    /// Token lifetime as `"<days>d"`, e.g. `"14d"`.
    pub token_expires: String,
    /// Optional pepper prepended to passwords before hashing.
    pub pepper: Option<String>,
    /// Maximum login length accepted at registration (default: 16).
    pub max_login_length: usize,
    /// Maximum password length accepted at registration (default: 32).
    pub max_password_length: usize,
}

impl AuthConfig {
    pub fn secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Resolve [`token_expires`](Self::token_expires) to a duration.
    pub fn token_lifetime(&self) -> Result<Duration, AuthError> {
        token::parse_expiry(&self.token_expires)
    }

    /// Startup check: a usable secret and a parseable lifetime.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.jwt_secret.is_empty() {
            return Err(AuthError::InvalidInput("jwt secret must not be empty".into()));
        }
        self.token_lifetime()?;
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expires: "7d".into(),
            pepper: None,
            max_login_length: MAX_LOGIN_LENGTH,
            max_password_length: 32,
        }
    }
}

// Keeps the secret and pepper out of logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_expires", &self.token_expires)
            .field("pepper", &self.pepper.as_ref().map(|_| "<redacted>"))
            .field("max_login_length", &self.max_login_length)
            .field("max_password_length", &self.max_password_length)
            .finish()
    }
}

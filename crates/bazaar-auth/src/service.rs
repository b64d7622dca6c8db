//! Authentication service — login and registration orchestration.

use std::sync::OnceLock;

use bazaar_core::models::credential::{Credential, NewCredential};
use bazaar_core::repository::CredentialRepository;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::bearer::{self, AuthResult, Identity};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::{self, TokenClaims};

/// Login and password as submitted by the client.
#[derive(Clone, Deserialize)]
pub struct LoginCredentials {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Input for the login flow.
#[derive(Debug, Default)]
pub struct LoginInput {
    /// Raw `Authorization` header value, if the client sent one.
    pub authorization: Option<String>,
    /// Request body, if the client sent one.
    pub credentials: Option<LoginCredentials>,
}

/// Which branch of the login flow succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPath {
    /// An unexpired token was presented and echoed back.
    Token,
    /// Login and password were verified and a new token was signed.
    Credentials,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    pub identity: Identity,
    /// Raw bearer token to hand back to the client.
    pub token: String,
    pub path: LoginPath,
}

impl LoginOutput {
    /// Value for the response `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", bearer::BEARER_SCHEME, self.token)
    }
}

/// Successful registration result.
#[derive(Debug, Clone)]
pub struct Registered {
    pub user_id: i64,
    pub login: String,
}

impl From<Credential> for Registered {
    fn from(credential: Credential) -> Self {
        Self {
            user_id: credential.user_id,
            login: credential.login,
        }
    }
}

/// Login flow stages. Every call walks these once, in order, without
/// retries.
enum LoginStage {
    TryToken,
    Credentials,
    Done(Result<LoginOutput, AuthError>),
}

/// Verified against when a login does not exist, so that unknown and
/// known logins cost the same.
fn decoy_hash() -> Option<&'static str> {
    static DECOY: OnceLock<Option<String>> = OnceLock::new();
    DECOY
        .get_or_init(|| password::hash_password("decoy-password", None).ok())
        .as_deref()
}

/// Authentication service.
///
/// Generic over the credential repository so that the auth layer has
/// no dependency on the database crate. Holds no mutable state; share
/// it behind an `Arc`.
pub struct AuthService<C: CredentialRepository> {
    credentials: C,
    config: AuthConfig,
}

impl<C: CredentialRepository> AuthService<C> {
    pub fn new(credentials: C, config: AuthConfig) -> Self {
        Self {
            credentials,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Authenticate a caller by bearer token or, failing that, by
    /// login and password.
    ///
    /// A missing, garbled or expired token never blocks a credential
    /// login; it only routes the call to the credential stage.
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutput, AuthError> {
        let mut stage = LoginStage::TryToken;
        loop {
            stage = match stage {
                LoginStage::TryToken => self.try_token(input.authorization.as_deref()),
                LoginStage::Credentials => {
                    LoginStage::Done(self.login_with_credentials(input.credentials.as_ref()).await)
                }
                LoginStage::Done(outcome) => return outcome,
            };
        }
    }

    fn try_token(&self, header: Option<&str>) -> LoginStage {
        if header.is_none_or(str::is_empty) {
            return LoginStage::Credentials;
        }

        let raw = match bearer::extract_bearer(header) {
            Ok(raw) => raw,
            Err(reason) => {
                debug!(%reason, "token path skipped");
                return LoginStage::Credentials;
            }
        };

        match bearer::verify_token_at(raw, self.config.secret(), Utc::now()) {
            Ok(identity) => {
                info!(user_id = identity.user_id, login = %identity.login, "login by token");
                LoginStage::Done(Ok(LoginOutput {
                    identity,
                    token: raw.to_string(),
                    path: LoginPath::Token,
                }))
            }
            Err(reason) => {
                debug!(%reason, "token rejected, falling back to credentials");
                LoginStage::Credentials
            }
        }
    }

    async fn login_with_credentials(
        &self,
        input: Option<&LoginCredentials>,
    ) -> Result<LoginOutput, AuthError> {
        let input = input.ok_or(AuthError::MissingCredentials)?;

        // 1. Look up the credential.
        let stored = self
            .credentials
            .find_by_login(&input.login)
            .await
            .map_err(|e| {
                error!(error = %e, "credential lookup failed");
                AuthError::StoreUnavailable(e.to_string())
            })?;

        // 2. Verify the password. Unknown logins are verified against a
        //    decoy hash and rejected exactly like a wrong password.
        let hash = stored.as_ref().map(|c| c.password_hash.clone());
        let matched = self.verify_blocking(input.password.clone(), hash).await?;

        let credential = match stored {
            Some(credential) if matched => credential,
            _ => {
                debug!(login = %input.login, "invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        // 3. Issue a fresh token.
        let claims = TokenClaims::new(
            credential.user_id,
            credential.login,
            self.config.token_lifetime()?,
        )?;
        let token = token::issue_token(&claims, self.config.secret())?;

        info!(user_id = claims.user_id, login = %claims.login, "login by credentials");

        Ok(LoginOutput {
            identity: Identity::from(&claims),
            token,
            path: LoginPath::Credentials,
        })
    }

    /// Create a credential for a new login.
    pub async fn register(&self, input: LoginCredentials) -> Result<Registered, AuthError> {
        self.validate_registration(&input)?;

        // Checked up front so a taken login does not cost a hash; the
        // store's unique index still catches concurrent duplicates.
        if self.credentials.find_by_login(&input.login).await?.is_some() {
            return Err(AuthError::DuplicateLogin);
        }

        let pepper = self.config.pepper.clone();
        let password = input.password;
        let password_hash = tokio::task::spawn_blocking(move || {
            password::hash_password(&password, pepper.as_deref())
        })
        .await
        .map_err(|e| AuthError::Crypto(format!("hash task failed: {e}")))??;

        let credential = self
            .credentials
            .insert(NewCredential {
                login: input.login,
                password_hash,
            })
            .await?;

        info!(user_id = credential.user_id, login = %credential.login, "registered");

        Ok(credential.into())
    }

    /// Gate for protected operations: only an unexpired bearer token is
    /// accepted, with no credential fallback.
    pub fn authorize(&self, header: Option<&str>) -> AuthResult {
        bearer::authenticate(header, self.config.secret())
    }

    fn validate_registration(&self, input: &LoginCredentials) -> Result<(), AuthError> {
        let login_len = input.login.chars().count();
        if login_len == 0 || login_len > self.config.max_login_length {
            return Err(AuthError::InvalidInput(format!(
                "login must be 1 to {} characters",
                self.config.max_login_length
            )));
        }

        let password_len = input.password.chars().count();
        if password_len == 0 || password_len > self.config.max_password_length {
            return Err(AuthError::InvalidInput(format!(
                "password must be 1 to {} characters",
                self.config.max_password_length
            )));
        }

        Ok(())
    }

    async fn verify_blocking(
        &self,
        password: String,
        hash: Option<String>,
    ) -> Result<bool, AuthError> {
        let pepper = self.config.pepper.clone();
        tokio::task::spawn_blocking(move || {
            let target = match hash.as_deref() {
                Some(hash) => Some(hash),
                None => decoy_hash(),
            };
            target.is_some_and(|hash| password::verify_password(&password, hash, pepper.as_deref()))
        })
        .await
        .map_err(|e| AuthError::Crypto(format!("verify task failed: {e}")))
    }
}

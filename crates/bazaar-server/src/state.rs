//! Shared application state.

use bazaar_auth::AuthService;
use bazaar_core::repository::CredentialRepository;

/// State shared by every handler behind an `Arc`.
pub struct AppState<C: CredentialRepository> {
    pub auth: AuthService<C>,
}

impl<C: CredentialRepository> AppState<C> {
    pub fn new(auth: AuthService<C>) -> Self {
        Self { auth }
    }
}

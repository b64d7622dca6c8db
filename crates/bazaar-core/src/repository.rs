//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations live in
//! `bazaar-db`; the auth layer only depends on these traits.

use crate::error::BazaarResult;
use crate::models::credential::{Credential, NewCredential};

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

pub trait CredentialRepository: Send + Sync {
    /// Look up a credential by its unique login.
    ///
    /// `Ok(None)` means no such login; `Err` is reserved for store
    /// failures.
    fn find_by_login(
        &self,
        login: &str,
    ) -> impl Future<Output = BazaarResult<Option<Credential>>> + Send;

    /// Insert a new credential and return it with its assigned
    /// `user_id`.
    ///
    /// Fails with [`BazaarError::AlreadyExists`](crate::BazaarError::AlreadyExists)
    /// when the login is taken; nothing is written in that case.
    fn insert(&self, input: NewCredential) -> impl Future<Output = BazaarResult<Credential>> + Send;
}

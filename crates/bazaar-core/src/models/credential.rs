//! Credential domain model.

use serde::{Deserialize, Serialize};

/// Maximum length of a login, in characters.
pub const MAX_LOGIN_LENGTH: usize = 16;

/// A stored login credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    /// Numeric identity assigned by the store on insert.
    pub user_id: i64,
    pub login: String,
    /// Opaque PHC string (or legacy bcrypt hash). Never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCredential {
    pub login: String,
    /// Already-hashed password; the store never sees plaintext.
    pub password_hash: String,
}

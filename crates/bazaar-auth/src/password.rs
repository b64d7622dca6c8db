//! Password hashing and verification.
//!
//! New hashes are Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1) and a random
//! per-hash salt embedded in the PHC string. Hashes written by the
//! previous bcrypt-based service (`$2a$`/`$2b$`/`$2y$`) still verify.

use std::borrow::Cow;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::SaltString;
use password_hash::rand_core::OsRng;
use tracing::warn;

use crate::error::AuthError;

fn peppered<'a>(password: &'a str, pepper: Option<&str>) -> Cow<'a, str> {
    match pepper {
        Some(p) => Cow::Owned(format!("{p}{password}")),
        None => Cow::Borrowed(password),
    }
}

fn argon2id() -> Result<Argon2<'static>, AuthError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| AuthError::Crypto(format!("argon2 params error: {e}")))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

fn is_bcrypt(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| hash.starts_with(prefix))
}

/// Hash a password with Argon2id.
///
/// If a pepper is provided it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, AuthError> {
    let input = peppered(password, pepper);
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2id()?
        .hash_password(input.as_bytes(), &salt)
        .map_err(|e| AuthError::Crypto(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored hash.
///
/// The comparison is constant-time. Any failure, including a stored
/// hash that cannot be parsed, is reported as a mismatch.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> bool {
    let input = peppered(password, pepper);

    if is_bcrypt(hash) {
        return match bcrypt::verify(input.as_bytes(), hash) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "stored bcrypt hash could not be verified");
                false
            }
        };
    }

    let parsed_hash = match argon2::PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "stored password hash is malformed");
            return false;
        }
    };

    // Parameters are read from the PHC string, so the default instance
    // verifies hashes produced with any cost settings.
    match Argon2::default().verify_password(input.as_bytes(), &parsed_hash) {
        Ok(()) => true,
        Err(argon2::password_hash::Error::Password) => false,
        Err(e) => {
            warn!(error = %e, "password verification error");
            false
        }
    }
}

//! Password hashing with Argon2.

use crate::CoreAccessError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hashes a password into a PHC-format string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, CoreAccessError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| CoreAccessError::PasswordHash)
}

/// Verifies a password against a stored hash. An unparsable hash and a
/// mismatched password are indistinguishable to the caller.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

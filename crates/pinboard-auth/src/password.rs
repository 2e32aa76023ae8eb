//! Password hashing with Argon2

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::AuthError;

/// Hash a password with a freshly generated random salt
///
/// Returns a self-describing PHC string (algorithm, parameters, salt and
/// digest in one), so repeated calls on the same input produce different
/// strings that all verify.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a password against a stored hash
///
/// A malformed stored hash is treated as a mismatch, not an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return Ok(false);
    };
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

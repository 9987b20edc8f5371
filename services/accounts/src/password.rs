//! Password hashing and verification
//!
//! Plaintext passwords are only held for the duration of a hash or verify
//! call; the database only ever sees the salted Argon2 PHC string.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};

use crate::error::{AccountError, AccountResult};

/// Hash a plaintext password with a fresh random salt
pub fn hash(password: &str) -> AccountResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AccountError::PasswordHash(format!("Failed to hash password: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a candidate password against a stored PHC hash string
///
/// The comparison inside the `argon2` crate is constant-time. A malformed
/// stored hash is an error; a wrong password is `Ok(false)`.
pub fn verify(password: &str, password_hash: &str) -> AccountResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AccountError::PasswordHash(format!("Failed to parse password hash: {}", e)))?;

    let argon2 = Argon2::default();
    let result = argon2.verify_password(password.as_bytes(), &parsed_hash);

    Ok(result.is_ok())
}

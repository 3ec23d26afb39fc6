//! Password hashing with Argon2id.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{debug, error};

use crate::error::{ApiError, ApiResult};

/// Hash `password` with a fresh random salt into a PHC string.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "Failed to hash password");
            ApiError::validation_failed("Failed to hash password").with_details(e.to_string())
        })
}

/// Check `password` against a stored PHC string.
///
/// A mismatch is `Ok(false)`; an unparseable stored hash is an error.
pub fn verify_password(password: &str, stored_hash: &str) -> ApiResult<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!(error = %e, "Stored password hash is malformed");
        ApiError::internal_error("Invalid stored password hash")
    })?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => {
            debug!("Password mismatch");
            Ok(false)
        }
        Err(e) => {
            error!(error = %e, "Password verification failed");
            Err(ApiError::internal_error("Password verification failed"))
        }
    }
}

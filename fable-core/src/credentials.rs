//! Credential hashing
//!
//! Passwords are stored as argon2id PHC strings (OWASP's first-choice
//! algorithm, default parameters). The rest of the system treats the stored
//! value as an opaque credential.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{FableError, Result};

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| FableError::Internal(format!("failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

/// Check a password against a stored credential
///
/// A mismatch is `InvalidCredential`; an unparseable stored hash is an
/// internal error, since we wrote it ourselves.
pub fn verify_password(password: &str, stored: &str) -> Result<()> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| FableError::Internal(format!("malformed stored credential: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(argon2::password_hash::Error::Password) => Err(FableError::InvalidCredential),
        Err(e) => Err(FableError::Internal(format!(
            "failed to verify password: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let stored = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &stored).is_ok());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let stored = hash_password("hunter2").unwrap();
        assert!(matches!(
            verify_password("hunter3", &stored),
            Err(FableError::InvalidCredential)
        ));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }
}

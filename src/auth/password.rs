//! Argon2id credential hashing
//!
//! Registration hashes the password into the PHC string stored as
//! `User.passwordHash`; login verifies against it. The PHC format embeds
//! the salt and parameters, so old hashes stay verifiable if the library
//! defaults change.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::HomefrontError;

/// Hash a password for storage on a new User document
pub fn hash_password(password: &str) -> Result<String, HomefrontError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HomefrontError::Authentication(format!("Failed to hash password: {e}")))
}

/// Check a login attempt against the stored PHC hash. A malformed stored
/// hash is an error, not a failed match.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, HomefrontError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| HomefrontError::Authentication(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ_per_registration() {
        let password = "same-password";
        let hash1 = hash_password(password).unwrap();
        let hash2 = hash_password(password).unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password(password, &hash1).unwrap());
        assert!(verify_password(password, &hash2).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "not-a-valid-hash");
        assert!(result.is_err());
    }
}

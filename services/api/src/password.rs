//! Password hashing and verification
//!
//! Accounts only ever store the salted Argon2 hash of a secret, never the
//! plaintext. Verification fails closed: anything that goes wrong while
//! parsing or checking a stored hash counts as "not verified".

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};

use crate::error::{ApiError, ApiResult};

/// Hash a plaintext secret with a freshly generated salt
///
/// Two calls on the same secret produce different encoded hashes; both
/// verify against the original secret.
pub fn hash_password(secret: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            ApiError::Internal
        })?
        .to_string();

    Ok(hash)
}

/// Verify a presented secret against a stored hash
///
/// The underlying comparison is constant-time. A malformed stored hash is
/// treated as a failed verification rather than surfaced as an error.
pub fn verify_password(secret: &str, stored_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to parse stored password hash: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify_round_trip() {
        let hash = hash_password("Secr3t!").unwrap();
        assert!(verify_password("Secr3t!", &hash));
    }

    #[test]
    fn test_wrong_secret_does_not_verify() {
        let hash = hash_password("Secr3t!").unwrap();
        assert!(!verify_password("Secr3t?", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn test_same_secret_hashes_differently() {
        let first = hash_password("Secr3t!").unwrap();
        let second = hash_password("Secr3t!").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("Secr3t!", &first));
        assert!(verify_password("Secr3t!", &second));
    }

    #[test]
    fn test_malformed_hash_fails_closed() {
        assert!(!verify_password("Secr3t!", "not-a-phc-string"));
        assert!(!verify_password("Secr3t!", ""));
    }
}

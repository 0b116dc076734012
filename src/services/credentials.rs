//! Password hashing and verification.
//!
//! Digests are Argon2id PHC strings carrying their own salt and parameters,
//! so verification needs nothing but the digest itself.

use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::config::SecurityConfig;

/// Hash a password using Argon2id with a fresh random salt.
///
/// Both functions here are CPU-heavy; async callers should run them on the
/// blocking pool.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Returns `true` iff `password` matches `digest`.
///
/// A malformed digest never matches.
#[must_use]
pub fn verify_password(password: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
pub(crate) fn fast_params() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        ..SecurityConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_and_is_salted() {
        let config = fast_params();
        let first = hash_password("Secret123!", &config).unwrap();
        let second = hash_password("Secret123!", &config).unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(verify_password("Secret123!", &first));
        assert!(verify_password("Secret123!", &second));
    }

    #[test]
    fn other_password_does_not_verify() {
        let digest = hash_password("Secret123!", &fast_params()).unwrap();
        assert!(!verify_password("Secret123?", &digest));
        assert!(!verify_password("", &digest));
    }

    #[test]
    fn malformed_digest_is_false_not_error() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "admin123"));
        assert!(!verify_password("anything", "$argon2id$v=19$garbage"));
    }

    #[test]
    fn invalid_params_are_reported() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1,
            ..fast_params()
        };
        assert!(hash_password("pw", &config).is_err());
    }
}

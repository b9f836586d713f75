//! Salted password hashing and verification.
//!
//! # Responsibility
//! - Produce Argon2id PHC hashes with a per-record random salt.
//! - Verify both Argon2id records and legacy single-pass SHA-256 records.
//!
//! # Invariants
//! - Salts are 16 random bytes, hex-encoded.
//! - Plaintext passwords are never logged or persisted.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const SALT_BYTES: usize = 16;
const PHC_ARGON2_PREFIX: &str = "$argon2";

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid password policy: {0}")]
    InvalidPolicy(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Argon2id work factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl PasswordPolicy {
    fn hasher(&self) -> Result<Argon2<'static>, PasswordError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|err| PasswordError::InvalidPolicy(err.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Salt and hash pair as persisted on a user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaltedHash {
    pub salt: String,
    pub hash: String,
}

/// Returns a fresh hex-encoded random salt.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hashes `password` with Argon2id, generating a salt when none is given.
///
/// # Errors
/// - `InvalidPolicy` when the work factors are rejected by Argon2.
/// - `Hashing` when the salt is unusable (longer than 48 bytes) or hashing fails.
pub fn hash_password(
    password: &str,
    salt: Option<&str>,
    policy: &PasswordPolicy,
) -> Result<SaltedHash, PasswordError> {
    let salt = salt.map_or_else(generate_salt, str::to_string);
    let salt_string = SaltString::encode_b64(salt.as_bytes())
        .map_err(|err| PasswordError::Hashing(err.to_string()))?;
    let hash = policy
        .hasher()?
        .hash_password(password.as_bytes(), &salt_string)
        .map_err(|err| PasswordError::Hashing(err.to_string()))?
        .to_string();

    Ok(SaltedHash { salt, hash })
}

/// Single-pass `hex(SHA-256(salt || password))` used by records written
/// before Argon2 was adopted.
pub fn legacy_sha256_hash(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks `password` against a stored salt and hash.
///
/// PHC strings are verified with the parameters they carry; anything else is
/// compared against the legacy SHA-256 digest. Malformed PHC strings never
/// verify.
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    if expected_hash.starts_with(PHC_ARGON2_PREFIX) {
        return match PasswordHash::new(expected_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        };
    }

    legacy_sha256_hash(password, salt) == expected_hash
}

#[cfg(test)]
mod tests {
    use super::{
        generate_salt, hash_password, legacy_sha256_hash, verify_password, PasswordPolicy,
    };

    fn cheap_policy() -> PasswordPolicy {
        PasswordPolicy {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn generated_salt_is_32_hex_chars() {
        let salt = generate_salt();
        assert_eq!(salt.len(), 32);
        assert!(salt.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(salt, generate_salt());
    }

    #[test]
    fn hash_then_verify() {
        let hashed = hash_password("s3cret", None, &cheap_policy()).unwrap();
        assert!(hashed.hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cret", &hashed.salt, &hashed.hash));
        assert!(!verify_password("S3cret", &hashed.salt, &hashed.hash));
    }

    #[test]
    fn supplied_salt_is_kept_and_deterministic() {
        let first = hash_password("pw", Some("abcdef0123456789"), &cheap_policy()).unwrap();
        let second = hash_password("pw", Some("abcdef0123456789"), &cheap_policy()).unwrap();
        assert_eq!(first.salt, "abcdef0123456789");
        assert_eq!(first.hash, second.hash);
    }

    #[test]
    fn legacy_digest_matches_known_vector() {
        // sha256("salt" + "password")
        assert_eq!(
            legacy_sha256_hash("password", "salt"),
            "13601bda4ea78e55a07b98866d2be6be0744e3866f13c00c811cab608a28f322"
        );
        assert!(verify_password(
            "password",
            "salt",
            "13601bda4ea78e55a07b98866d2be6be0744e3866f13c00c811cab608a28f322"
        ));
        assert!(!verify_password("password", "pepper", &legacy_sha256_hash("password", "salt")));
    }

    #[test]
    fn malformed_phc_string_never_verifies() {
        assert!(!verify_password("pw", "salt", "$argon2id$garbage"));
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let policy = PasswordPolicy {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        };
        assert!(hash_password("pw", None, &policy).is_err());
    }
}

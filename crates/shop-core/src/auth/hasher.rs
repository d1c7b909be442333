//! Password hashing (argon2id, PHC string format).

use crate::error::{ShopError, ShopResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Plaintext behind the digest used when no stored digest exists
const ABSENT_ACCOUNT_PLAINTEXT: &str = "absent-account";

/// One-way password hasher with a configurable cost factor.
///
/// Every digest carries its own salt and parameters, so raising the cost
/// does not invalidate existing hashes.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
    /// Digest at the configured cost, checked when there is no account
    absent_digest: Arc<str>,
    verifications: Arc<AtomicU64>,
}

impl CredentialHasher {
    /// Create a hasher with the given argon2 time cost
    pub fn new(cost: u32) -> ShopResult<Self> {
        let params = Params::new(Params::DEFAULT_M_COST, cost, Params::DEFAULT_P_COST, None)
            .map_err(|e| ShopError::Configuration(format!("invalid hash cost: {}", e)))?;

        let mut hasher = Self {
            params,
            absent_digest: Arc::from(""),
            verifications: Arc::new(AtomicU64::new(0)),
        };
        hasher.absent_digest = Arc::from(hasher.hash(ABSENT_ACCOUNT_PLAINTEXT)?);
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a fresh random salt
    pub fn hash(&self, plaintext: &str) -> ShopResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| ShopError::Internal("password hashing failed".to_string()))
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// Malformed digests yield `false`.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        self.verifications.fetch_add(1, Ordering::Relaxed);
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };
        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spend the same work as `verify` when no account exists.
    ///
    /// Always `false`.
    pub fn verify_absent(&self, plaintext: &str) -> bool {
        self.verify(plaintext, &self.absent_digest);
        false
    }

    /// Verifications run by this hasher and its clones
    pub fn verifications(&self) -> u64 {
        self.verifications.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = CredentialHasher::new(1).unwrap();
        let digest = hasher.hash("pw123").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(hasher.verify("pw123", &digest));
        assert!(!hasher.verify("pw124", &digest));
    }

    #[test]
    fn test_salted() {
        let hasher = CredentialHasher::new(1).unwrap();
        let a = hasher.hash("same").unwrap();
        let b = hasher.hash("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_digest_is_false() {
        let hasher = CredentialHasher::new(1).unwrap();
        assert!(!hasher.verify("pw", ""));
        assert!(!hasher.verify("pw", "not-a-phc-string"));
        assert!(!hasher.verify("pw", "$2b$10$abcdefghijklmnopqrstuv"));
    }

    #[test]
    fn test_verify_across_costs() {
        let cheap = CredentialHasher::new(1).unwrap();
        let digest = cheap.hash("pw123").unwrap();

        let dearer = CredentialHasher::new(3).unwrap();
        assert!(dearer.verify("pw123", &digest));
    }

    #[test]
    fn test_absent_account_runs_full_verify() {
        let hasher = CredentialHasher::new(1).unwrap();
        assert!(hasher.absent_digest.starts_with("$argon2id$v=19$m=19456,t=1,"));

        let clone = hasher.clone();
        assert!(!clone.verify_absent(ABSENT_ACCOUNT_PLAINTEXT));
        assert!(!clone.verify_absent("pw123"));
        assert_eq!(hasher.verifications(), 2);
    }

    #[test]
    fn test_zero_cost_rejected() {
        assert!(CredentialHasher::new(0).is_err());
    }
}

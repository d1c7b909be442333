//! # Authentication
//!
//! Password hashing, session tokens, and the bearer-token gate.
//!
//! All three are built from an [`AuthConfig`] constructed once at startup;
//! nothing in here reads the environment.

mod gate;
mod hasher;
mod token;

pub use gate::AuthGate;
pub use hasher::CredentialHasher;
pub use token::{Claims, Clock, IssuedToken, ManualClock, SystemClock, TokenService};

use crate::error::{ShopError, ShopResult};
use chrono::Duration;
use std::fmt;

/// Default session token lifetime (1 hour)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Default argon2 time cost (iterations)
pub const DEFAULT_HASH_COST: u32 = 2;

/// Upper bound accepted for the hash cost factor
pub const MAX_HASH_COST: u32 = 10;

/// Minimum signing secret length in bytes
pub const MIN_SECRET_LEN: usize = 16;

/// Process-wide authentication settings
#[derive(Clone)]
pub struct AuthConfig {
    signing_secret: String,
    /// Session token lifetime
    pub token_ttl: Duration,
    /// Argon2 time cost
    pub hash_cost: u32,
}

impl AuthConfig {
    /// Create a config with the default TTL and cost.
    ///
    /// The secret must be at least [`MIN_SECRET_LEN`] bytes.
    pub fn new(signing_secret: impl Into<String>) -> ShopResult<Self> {
        let signing_secret = signing_secret.into();
        if signing_secret.len() < MIN_SECRET_LEN {
            return Err(ShopError::Configuration(format!(
                "signing secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        Ok(Self {
            signing_secret,
            token_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            hash_cost: DEFAULT_HASH_COST,
        })
    }

    /// Builder: set token lifetime
    pub fn with_token_ttl(mut self, ttl: Duration) -> ShopResult<Self> {
        if ttl <= Duration::zero() {
            return Err(ShopError::Configuration(
                "token TTL must be positive".to_string(),
            ));
        }
        self.token_ttl = ttl;
        Ok(self)
    }

    /// Builder: set hash cost factor
    pub fn with_hash_cost(mut self, cost: u32) -> ShopResult<Self> {
        if cost == 0 || cost > MAX_HASH_COST {
            return Err(ShopError::Configuration(format!(
                "hash cost must be between 1 and {}",
                MAX_HASH_COST
            )));
        }
        self.hash_cost = cost;
        Ok(self)
    }

    pub fn signing_secret(&self) -> &[u8] {
        self.signing_secret.as_bytes()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("hash_cost", &self.hash_cost)
            .finish()
    }
}

//! # Storefront Error Types
//!
//! Typed error handling for the storefront core.
//! Services return `Result<T, ShopError>`; record store implementations
//! return `Result<T, StoreError>` and the services translate.

use thiserror::Error;

/// Failure reported by a record store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// Uniqueness constraint violated (Postgres 23505)
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// The call exceeded its deadline
    #[error("Store request timed out")]
    Timeout,

    /// Store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Store rejected the request
    #[error("Store error [{code}]: {message}")]
    Backend { code: String, message: String },

    /// Store answered with something we could not read
    #[error("Store response decode error: {0}")]
    Decode(String),
}

/// Result type alias for record store calls
pub type StoreResult<T> = Result<T, StoreError>;

/// Core error type for all storefront operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Missing or malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown email or wrong password (never distinguished)
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No bearer token on the request
    #[error("Missing credentials")]
    MissingCredential,

    /// Token failed structural or signature checks
    #[error("Invalid token")]
    InvalidToken,

    /// Token signature is valid but it has expired
    #[error("Token expired")]
    ExpiredToken,

    /// Referenced record does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Email already registered
    #[error("Email already exists")]
    DuplicateEmail,

    /// Cart references data that no longer resolves
    #[error("Inconsistent cart {cart_id}: {reason}")]
    InconsistentCart { cart_id: String, reason: String },

    /// Record store failure
    #[error("Store failure: {0}")]
    StoreFailure(String),

    /// Record store or crypto call exceeded its deadline
    #[error("Operation timed out")]
    Timeout,

    /// Configuration errors (missing secret, out-of-range cost)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShopError {
    /// Shorthand for a `NotFound` error
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ShopError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for a `Validation` error
    pub fn validation(message: impl Into<String>) -> Self {
        ShopError::Validation(message.into())
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Validation(_) => 400,
            ShopError::InvalidCredentials
            | ShopError::MissingCredential
            | ShopError::InvalidToken
            | ShopError::ExpiredToken => 401,
            ShopError::NotFound { .. } => 404,
            ShopError::DuplicateEmail => 409,
            ShopError::InconsistentCart { .. } => 500,
            ShopError::StoreFailure(_) => 500,
            ShopError::Timeout => 500,
            ShopError::Configuration(_) => 500,
            ShopError::Internal(_) => 500,
        }
    }

    /// Message safe to hand to a client.
    ///
    /// Server-side failures collapse to a generic message; their details
    /// only go to the log.
    pub fn public_message(&self) -> String {
        match self {
            ShopError::Validation(msg) => msg.clone(),
            ShopError::InvalidCredentials => "Invalid email or password.".to_string(),
            ShopError::MissingCredential => "Access denied".to_string(),
            ShopError::InvalidToken | ShopError::ExpiredToken => "Invalid token".to_string(),
            ShopError::NotFound { entity, .. } => format!("{} not found.", entity),
            ShopError::DuplicateEmail => "Email already exists.".to_string(),
            ShopError::InconsistentCart { .. }
            | ShopError::StoreFailure(_)
            | ShopError::Timeout
            | ShopError::Configuration(_)
            | ShopError::Internal(_) => "Internal server error.".to_string(),
        }
    }
}

impl From<StoreError> for ShopError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout => ShopError::Timeout,
            other => ShopError::StoreFailure(other.to_string()),
        }
    }
}

/// Result type alias for storefront operations
pub type ShopResult<T> = Result<T, ShopError>;

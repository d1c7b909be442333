//! # Account Service
//!
//! Registration and sign-in against the `users` table.
//!
//! Unknown email and wrong password both yield
//! `ShopError::InvalidCredentials`; callers cannot tell them apart. Both
//! branches run one full password verification.

use crate::auth::{CredentialHasher, TokenService};
use crate::error::{ShopError, ShopResult, StoreError};
use crate::store::{decode, decode_all, encode, store_failure, BoxedRecordStore, Filter, Table};
use crate::user::{NewUser, User};
use crate::validate;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use tracing::{error, info, instrument, warn};

/// Sign-up request
#[derive(Clone, Default, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Sign-in request
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Successful sign-in
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Registration and sign-in
#[derive(Clone)]
pub struct AccountService {
    store: BoxedRecordStore,
    hasher: CredentialHasher,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(store: BoxedRecordStore, hasher: CredentialHasher, tokens: TokenService) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Register a new user.
    ///
    /// The email is stored lowercased; a second registration with the same
    /// address (in any case) fails with `DuplicateEmail`.
    #[instrument(skip(self, request), fields(email = ?request.email))]
    pub async fn register(&self, request: &Registration) -> ShopResult<User> {
        let name = validate::required(request.name.as_deref(), "name")?;
        let email = validate::required(request.email.as_deref(), "email")?;
        let password = required_password(request.password.as_deref())?;
        let email = validate::email(email)?;

        let password_hash = self.hash_password(password.to_string()).await?;

        let row = encode(&NewUser {
            name,
            email: &email,
            password: &password_hash,
        })?;

        let inserted = self
            .store
            .insert(Table::Users, row)
            .await
            .map_err(|err| match err {
                StoreError::Conflict(detail) => {
                    warn!(%detail, "registration rejected: email taken");
                    ShopError::DuplicateEmail
                }
                other => store_failure("register user")(other),
            })?;

        let user: User = decode(Table::Users, inserted)?;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check credentials and issue a session token
    #[instrument(skip(self, request), fields(email = ?request.email))]
    pub async fn sign_in(&self, request: &Credentials) -> ShopResult<SignedIn> {
        let email = validate::required(request.email.as_deref(), "email")?;
        let password = required_password(request.password.as_deref())?;
        let email = validate::email(email)?;

        let rows = self
            .store
            .query(Table::Users, &Filter::new().eq("email", &email), &[])
            .await
            .map_err(store_failure("find user by email"))?;

        let mut users: Vec<User> = decode_all(Table::Users, rows)?;
        if users.len() > 1 {
            error!(count = users.len(), "multiple users share one email");
            return Err(ShopError::StoreFailure(
                "email lookup returned more than one user".to_string(),
            ));
        }

        let Some(user) = users.pop() else {
            self.verify_absent(password.to_string()).await?;
            info!("sign-in failed");
            return Err(ShopError::InvalidCredentials);
        };

        if !self
            .verify_password(password.to_string(), user.password_hash.clone())
            .await?
        {
            info!("sign-in failed");
            return Err(ShopError::InvalidCredentials);
        }

        let issued = self.tokens.issue(&user.id)?;
        info!(user_id = %user.id, "user signed in");

        Ok(SignedIn {
            user,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    /// All users, in store order
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> ShopResult<Vec<User>> {
        let rows = self
            .store
            .query(Table::Users, &Filter::new(), &[])
            .await
            .map_err(store_failure("list users"))?;
        decode_all(Table::Users, rows)
    }

    async fn hash_password(&self, password: String) -> ShopResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ShopError::Internal(format!("hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: String, digest: String) -> ShopResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| ShopError::Internal(format!("verify task failed: {}", e)))
    }

    async fn verify_absent(&self, password: String) -> ShopResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify_absent(&password))
            .await
            .map_err(|e| ShopError::Internal(format!("verify task failed: {}", e)))
    }
}

/// Passwords are not trimmed; only presence is checked
fn required_password(value: Option<&str>) -> ShopResult<&str> {
    match value {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(ShopError::validation("Missing required field: password.")),
    }
}

//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the storefront services, the auth gate, and configuration.

use anyhow::Context;
use chrono::Duration;
use shop_core::auth::{DEFAULT_HASH_COST, DEFAULT_TOKEN_TTL_SECS};
use shop_core::{
    AccountService, AuthConfig, AuthGate, BoxedRecordStore, CartAggregator, CheckoutEngine,
    CredentialHasher, OrderQueries, ProductCatalog, ShopResult, TokenService,
};
use shop_postgrest::PostgrestStore;
use std::net::SocketAddr;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Signing secret, token lifetime and hash cost
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let secret = std::env::var("JWT_SECRET_KEY").context("JWT_SECRET_KEY not set")?;

        let ttl_secs = parse_or("TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        let hash_cost = parse_or("SALT_ROUND", DEFAULT_HASH_COST)?;

        let auth = AuthConfig::new(secret)?
            .with_token_ttl(Duration::seconds(ttl_secs))?
            .with_hash_cost(hash_cost)?;

        let port = parse_or("PORT", 3000u16)?;

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            auth,
        })
    }

    /// Local development defaults around an explicit auth config
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: "development".to_string(),
            auth,
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, std::env::var(key).ok().as_deref(), default)
}

/// Unset or blank values fall back to `default`
fn parse_value<T>(key: &str, raw: Option<&str>, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}={:?}: {}", key, value, e)),
        None => Ok(default),
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub catalog: ProductCatalog,
    pub carts: CartAggregator,
    pub checkout: CheckoutEngine,
    pub orders: OrderQueries,
    /// Bearer-token gate for protected routes
    pub gate: AuthGate,
    /// Record store backend name
    pub backend: &'static str,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create state backed by PostgREST, configured from the environment
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let store = PostgrestStore::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize record store: {}", e))?;

        Ok(Self::from_store(Arc::new(store), config)?)
    }

    /// Wire every service onto one record store
    pub fn from_store(store: BoxedRecordStore, config: AppConfig) -> ShopResult<Self> {
        let tokens = TokenService::new(config.auth.clone());
        let hasher = CredentialHasher::new(config.auth.hash_cost)?;

        Ok(Self {
            accounts: AccountService::new(store.clone(), hasher, tokens.clone()),
            catalog: ProductCatalog::new(store.clone()),
            carts: CartAggregator::new(store.clone()),
            checkout: CheckoutEngine::new(store.clone()),
            orders: OrderQueries::new(store.clone()),
            gate: AuthGate::new(tokens),
            backend: store.backend_name(),
            config,
        })
    }
}

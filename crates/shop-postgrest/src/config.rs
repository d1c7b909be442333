//! # PostgREST Configuration
//!
//! Connection settings for the Supabase/PostgREST record store.
//! Secrets are loaded from environment variables.

use shop_core::{ShopError, ShopResult};
use std::env;
use std::fmt;
use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// PostgREST connection configuration
#[derive(Clone)]
pub struct PostgrestConfig {
    /// Project URL (https://xxxx.supabase.co)
    pub url: String,

    /// Service key, sent as `apikey` and bearer token
    pub api_key: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl PostgrestConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `SUPABASE_URL`
    /// - `SUPABASE_KEY`
    ///
    /// Optional: `STORE_TIMEOUT_SECS` (default 10)
    pub fn from_env() -> ShopResult<Self> {
        dotenvy::dotenv().ok();

        let url = env::var("SUPABASE_URL")
            .map_err(|_| ShopError::Configuration("SUPABASE_URL not set".to_string()))?;

        let api_key = env::var("SUPABASE_KEY")
            .map_err(|_| ShopError::Configuration("SUPABASE_KEY not set".to_string()))?;

        let timeout = parse_timeout(env::var("STORE_TIMEOUT_SECS").ok().as_deref())?;

        Self::new(url, api_key).map(|config| config.with_timeout(timeout))
    }

    /// Create config with explicit values
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> ShopResult<Self> {
        let url = url.into().trim_end_matches('/').to_string();
        let api_key = api_key.into();

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ShopError::Configuration(
                "SUPABASE_URL must be an http(s) URL".to_string(),
            ));
        }
        if api_key.trim().is_empty() {
            return Err(ShopError::Configuration("SUPABASE_KEY is empty".to_string()));
        }

        Ok(Self {
            url,
            api_key,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Builder: set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `/rest/v1/<table>` endpoint
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

impl fmt::Debug for PostgrestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgrestConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn parse_timeout(value: Option<&str>) -> ShopResult<Duration> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ShopError::Configuration(format!(
                "STORE_TIMEOUT_SECS must be a positive integer, got {:?}",
                raw
            ))),
        },
    }
}

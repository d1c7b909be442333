//! # shop-postgrest
//!
//! PostgREST (Supabase) record store for storefront-rs.
//!
//! `PostgrestStore` implements `shop_core::RecordStore` over the
//! `/rest/v1` HTTP API, authenticating with a service key.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_postgrest::PostgrestStore;
//! use shop_core::{Filter, RecordStore, Table};
//!
//! // SUPABASE_URL / SUPABASE_KEY from the environment
//! let store = PostgrestStore::from_env()?;
//!
//! let products = store
//!     .query(Table::Products, &Filter::new().eq("category", "kitchen"), &[])
//!     .await?;
//! ```

pub mod client;
pub mod config;

// Re-exports
pub use client::PostgrestStore;
pub use config::{PostgrestConfig, DEFAULT_TIMEOUT_SECS};

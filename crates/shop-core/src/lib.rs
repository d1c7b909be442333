//! # shop-core
//!
//! Core services and types for the storefront backend.
//!
//! This crate provides:
//! - `RecordStore` trait for plugging in the system of record, plus `MemoryStore`
//! - `CredentialHasher`, `TokenService` and `AuthGate` for authentication
//! - `AccountService` for registration and sign-in
//! - `ProductCatalog`, `CartAggregator` and `OrderQueries` for the shop data
//! - `CheckoutEngine` for turning a cart into a priced order
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{AuthConfig, CartAggregator, CheckoutEngine, MemoryStore, RecordId};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let carts = CartAggregator::new(store.clone());
//! let checkout = CheckoutEngine::new(store);
//!
//! let user = RecordId::new("u1");
//! let cart = carts.create_cart(Some(&user)).await?;
//! carts.add_item(&cart.id, Some(&RecordId::new("p1")), Some(3)).await?;
//!
//! let order = checkout.place_order(Some(&user), Some(&cart.id)).await?;
//! println!("total: {}", order.total_cost);
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod error;
pub mod id;
pub mod order;
pub mod product;
pub mod store;
pub mod user;
pub mod validate;

// Re-exports for convenience
pub use account::{AccountService, Credentials, Registration, SignedIn};
pub use auth::{
    AuthConfig, AuthGate, Claims, Clock, CredentialHasher, IssuedToken, ManualClock,
    SystemClock, TokenService,
};
pub use cart::{Cart, CartAggregator, CartDetails, CartItem, CartLine};
pub use checkout::{compute_total, CheckoutEngine};
pub use error::{ShopError, ShopResult, StoreError, StoreResult};
pub use id::{require_id, RecordId};
pub use order::{Order, OrderDetails, OrderQueries, OrderSummary};
pub use product::{NewProduct, Product, ProductCatalog, ProductPatch};
pub use store::{BoxedRecordStore, Filter, Join, JoinKind, MemoryStore, RecordStore, Row, Table};
pub use user::{PublicUser, User};

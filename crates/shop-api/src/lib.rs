//! # shop-api
//!
//! HTTP API layer for storefront-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for accounts, products, carts and orders
//! - Bearer-token authentication via the `AuthUser` extractor
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/users/sign/up` | Register |
//! | POST | `/users/sign/in` | Sign in, returns a token |
//! | GET | `/products/get/all` | List products |
//! | GET | `/products/:id` | One product |
//! | GET/POST | `/carts` | List / create carts |
//! | POST | `/carts/:id/items` | Add a cart item |
//! | POST | `/orders` | Place an order from a cart |
//! | GET | `/orders/:id` | Order with its lines |

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::AuthUser;
pub use error::{ApiError, ApiJson, ErrorResponse};
pub use routes::create_router;
pub use state::{AppConfig, AppState};

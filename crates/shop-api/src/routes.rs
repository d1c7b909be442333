//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes (auth = `Authorization: Bearer <token>`):
/// - Users:
///   - POST /users/sign/up
///   - POST /users/sign/in
///   - GET  /users (auth)
///
/// - Products:
///   - GET    /products/get/all?category=
///   - POST   /products/add (auth)
///   - GET    /products/{id}
///   - PUT    /products/{id} (auth)
///   - DELETE /products/{id} (auth)
///
/// - Carts (auth):
///   - GET|POST /carts
///   - GET|DELETE /carts/{id}
///   - POST /carts/{id}/items
///   - PUT|DELETE /carts/{id}/items/{item_id}
///
/// - Orders (auth):
///   - GET|POST /orders
///   - GET /orders/{id}
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let user_routes = Router::new()
        .route("/users/sign/up", post(handlers::sign_up))
        .route("/users/sign/in", post(handlers::sign_in))
        .route("/users", get(handlers::list_users));

    let product_routes = Router::new()
        .route("/products/get/all", get(handlers::list_products))
        .route("/products/add", post(handlers::create_product))
        .route(
            "/products/{product_id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        );

    let cart_routes = Router::new()
        .route("/carts", get(handlers::list_carts).post(handlers::create_cart))
        .route(
            "/carts/{cart_id}",
            get(handlers::get_cart).delete(handlers::delete_cart),
        )
        .route("/carts/{cart_id}/items", post(handlers::add_cart_item))
        .route(
            "/carts/{cart_id}/items/{item_id}",
            put(handlers::update_cart_item).delete(handlers::remove_cart_item),
        );

    let order_routes = Router::new()
        .route("/orders", get(handlers::list_orders).post(handlers::place_order))
        .route("/orders/{order_id}", get(handlers::get_order));

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .merge(user_routes)
        .merge(product_routes)
        .merge(cart_routes)
        .merge(order_routes)
        // Middleware (outermost first)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        // State
        .with_state(state)
}

//! # Request Handlers
//!
//! Axum request handlers for the storefront API.
//! Handlers only translate HTTP to service calls; validation and business
//! rules live in shop-core.

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiJson};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_core::{
    Cart, CartDetails, CartItem, Credentials, NewProduct, Order, OrderDetails, OrderSummary,
    Product, ProductPatch, PublicUser, RecordId, Registration,
};
use tracing::instrument;

type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create cart request
#[derive(Debug, Default, Deserialize)]
pub struct CreateCartRequest {
    #[serde(default)]
    pub user_id: Option<RecordId>,
}

/// Add cart item request
#[derive(Debug, Default, Deserialize)]
pub struct AddItemRequest {
    #[serde(default)]
    pub product_id: Option<RecordId>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Update cart item request
#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Place order request
#[derive(Debug, Default, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub user_id: Option<RecordId>,
    #[serde(default)]
    pub cart_id: Option<RecordId>,
}

/// Product listing filter
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub category: Option<String>,
}

/// Sign-up response
#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub message: String,
    pub data: PublicUser,
}

/// Sign-in response
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub message: String,
    pub data: PublicUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Delete response; `deleted` is the number of rows removed
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub deleted: u64,
}

impl DeleteResponse {
    fn new(entity: &str, deleted: u64) -> Self {
        Self {
            message: format!("{} deleted successfully.", entity),
            deleted,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "storefront",
        "store": state.backend,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// -----------------------------------------------------------------------------
// Users
// -----------------------------------------------------------------------------

#[instrument(skip(state, request))]
pub async fn sign_up(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<Registration>,
) -> ApiResult<(StatusCode, Json<SignUpResponse>)> {
    let user = state.accounts.register(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            message: "User registered successfully.".to_string(),
            data: user.into(),
        }),
    ))
}

#[instrument(skip(state, request))]
pub async fn sign_in(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<Credentials>,
) -> ApiResult<Json<SignInResponse>> {
    let signed_in = state.accounts.sign_in(&request).await?;

    Ok(Json(SignInResponse {
        message: "Login successful.".to_string(),
        data: signed_in.user.into(),
        token: signed_in.token,
        expires_at: signed_in.expires_at,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn list_users(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> ApiResult<Json<Vec<PublicUser>>> {
    let users = state.accounts.list_users().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

// -----------------------------------------------------------------------------
// Products
// -----------------------------------------------------------------------------

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = state.catalog.list(query.category.as_deref()).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<RecordId>,
) -> ApiResult<Json<Product>> {
    let product = state.catalog.get(&product_id).await?;
    Ok(Json(product))
}

#[instrument(skip(state, _caller, request))]
pub async fn create_product(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiJson(request): ApiJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.catalog.create(&request).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, _caller, patch))]
pub async fn update_product(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(product_id): Path<RecordId>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> ApiResult<Json<Product>> {
    let product = state.catalog.update(&product_id, &patch).await?;
    Ok(Json(product))
}

#[instrument(skip(state, _caller))]
pub async fn delete_product(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(product_id): Path<RecordId>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = state.catalog.delete(&product_id).await?;
    Ok(Json(DeleteResponse::new("Product", deleted)))
}

// -----------------------------------------------------------------------------
// Carts
// -----------------------------------------------------------------------------

#[instrument(skip(state, _caller))]
pub async fn list_carts(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> ApiResult<Json<Vec<CartDetails>>> {
    Ok(Json(state.carts.list_carts().await?))
}

#[instrument(skip(state, _caller))]
pub async fn get_cart(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(cart_id): Path<RecordId>,
) -> ApiResult<Json<CartDetails>> {
    Ok(Json(state.carts.get_cart(&cart_id).await?))
}

#[instrument(skip(state, _caller))]
pub async fn create_cart(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiJson(request): ApiJson<CreateCartRequest>,
) -> ApiResult<(StatusCode, Json<Cart>)> {
    let cart = state.carts.create_cart(request.user_id.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

#[instrument(skip(state, _caller))]
pub async fn add_cart_item(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(cart_id): Path<RecordId>,
    ApiJson(request): ApiJson<AddItemRequest>,
) -> ApiResult<(StatusCode, Json<CartItem>)> {
    let item = state
        .carts
        .add_item(&cart_id, request.product_id.as_ref(), request.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state, _caller))]
pub async fn update_cart_item(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path((cart_id, item_id)): Path<(RecordId, RecordId)>,
    ApiJson(request): ApiJson<UpdateItemRequest>,
) -> ApiResult<Json<CartItem>> {
    let item = state
        .carts
        .update_item_quantity(&cart_id, &item_id, request.quantity)
        .await?;
    Ok(Json(item))
}

#[instrument(skip(state, _caller))]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path((cart_id, item_id)): Path<(RecordId, RecordId)>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = state.carts.remove_item(&cart_id, &item_id).await?;
    Ok(Json(DeleteResponse::new("Cart item", deleted)))
}

#[instrument(skip(state, _caller))]
pub async fn delete_cart(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(cart_id): Path<RecordId>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = state.carts.delete_cart(&cart_id).await?;
    Ok(Json(DeleteResponse::new("Cart", deleted)))
}

// -----------------------------------------------------------------------------
// Orders
// -----------------------------------------------------------------------------

#[instrument(skip(state, _caller))]
pub async fn place_order(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiJson(request): ApiJson<PlaceOrderRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = state
        .checkout
        .place_order(request.user_id.as_ref(), request.cart_id.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[instrument(skip(state, _caller))]
pub async fn list_orders(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> ApiResult<Json<Vec<OrderSummary>>> {
    Ok(Json(state.orders.list_orders().await?))
}

#[instrument(skip(state, _caller))]
pub async fn get_order(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(order_id): Path<RecordId>,
) -> ApiResult<Json<OrderDetails>> {
    Ok(Json(state.orders.get_order(&order_id).await?))
}

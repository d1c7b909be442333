//! End-to-end tests: the full router over an in-memory record store.

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use shop_api::{create_router, AppConfig, AppState};
use shop_core::{AuthConfig, MemoryStore, Row, Table};
use std::sync::Arc;

struct Harness {
    server: TestServer,
    store: Arc<MemoryStore>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let auth = AuthConfig::new("api-test-signing-secret")
        .unwrap()
        .with_hash_cost(1)
        .unwrap();
    let state = AppState::from_store(store.clone(), AppConfig::new(auth)).unwrap();
    let server = TestServer::new(create_router(state)).unwrap();
    Harness { server, store }
}

fn seed_product(store: &MemoryStore, id: &str, price: i64) {
    let row: Row = json!({
        "id": id,
        "name": format!("Product {}", id),
        "description": "seeded",
        "price": price,
        "category": "misc"
    })
    .as_object()
    .cloned()
    .unwrap();
    store.seed(Table::Products, row).unwrap();
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

fn error_of(response: &TestResponse) -> String {
    response.json::<Value>()["error"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

impl Harness {
    async fn sign_up(&self, name: &str, email: &str, password: &str) -> TestResponse {
        self.server
            .post("/users/sign/up")
            .json(&json!({ "name": name, "email": email, "password": password }))
            .await
    }

    async fn sign_in(&self, email: &str, password: &str) -> TestResponse {
        self.server
            .post("/users/sign/in")
            .json(&json!({ "email": email, "password": password }))
            .await
    }

    /// Register + sign in; returns (user id, token)
    async fn login(&self, name: &str, email: &str) -> (String, String) {
        let created = self.sign_up(name, email, "pw123").await;
        assert_eq!(created.status_code(), StatusCode::CREATED);

        let signed_in = self.sign_in(email, "pw123").await;
        assert_eq!(signed_in.status_code(), StatusCode::OK);

        let body = signed_in.json::<Value>();
        (
            body["data"]["id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let response = h.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["store"], json!("memory"));
}

#[tokio::test]
async fn test_checkout_end_to_end() {
    let h = harness();
    seed_product(&h.store, "p1", 10);
    seed_product(&h.store, "p2", 5);

    let (user_id, token) = h.login("Ada", "ada@x.com").await;

    let cart = h
        .server
        .post("/carts")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "user_id": user_id }))
        .await;
    assert_eq!(cart.status_code(), StatusCode::CREATED);
    let cart_id = cart.json::<Value>()["id"].as_str().unwrap().to_string();

    for (product_id, quantity) in [("p1", 3), ("p2", 2)] {
        let item = h
            .server
            .post(&format!("/carts/{}/items", cart_id))
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({ "product_id": product_id, "quantity": quantity }))
            .await;
        assert_eq!(item.status_code(), StatusCode::CREATED);
    }

    let order = h
        .server
        .post("/orders")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "user_id": user_id, "cart_id": cart_id }))
        .await;
    assert_eq!(order.status_code(), StatusCode::CREATED);

    let order = order.json::<Value>();
    let total: Decimal = serde_json::from_value(order["total_cost"].clone()).unwrap();
    assert_eq!(total, Decimal::from(40));

    let order_id = order["id"].as_str().unwrap();
    let details = h
        .server
        .get(&format!("/orders/{}", order_id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(details.status_code(), StatusCode::OK);

    let details = details.json::<Value>();
    assert_eq!(details["cart_items"].as_array().unwrap().len(), 2);
    assert_eq!(details["users"]["email"], json!("ada@x.com"));
    assert!(details["users"].get("password").is_none());
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let h = harness();

    for path in ["/carts", "/orders", "/users"] {
        let response = h.server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED, "{}", path);
        assert!(!error_of(&response).is_empty());
    }

    let response = h
        .server
        .get("/carts")
        .add_header(header::AUTHORIZATION, bearer("not.a.token"))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_of(&response), "Invalid token");
}

#[tokio::test]
async fn test_auth_rejected_before_body_is_read() {
    let h = harness();
    let response = h
        .server
        .post("/orders")
        .json(&json!({ "user_id": "u1", "cart_id": "c1" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(h.store.write_count(), 0);
}

#[tokio::test]
async fn test_missing_cart_is_404() {
    let h = harness();
    let (user_id, token) = h.login("Ada", "ada@x.com").await;

    let response = h
        .server
        .get("/carts/does-not-exist")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = h
        .server
        .post("/orders")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "user_id": user_id, "cart_id": "does-not-exist" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_missing_rows_succeeds() {
    let h = harness();
    let (_, token) = h.login("Ada", "ada@x.com").await;

    let response = h
        .server
        .delete("/carts/c9/items/i9")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["deleted"], json!(0));

    let response = h
        .server
        .delete("/carts/c9")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_registration_is_409() {
    let h = harness();
    assert_eq!(
        h.sign_up("Ada", "ada@x.com", "pw123").await.status_code(),
        StatusCode::CREATED
    );

    let again = h.sign_up("Ada", "ada@x.com", "other").await;
    assert_eq!(again.status_code(), StatusCode::CONFLICT);
    assert_eq!(error_of(&again), "Email already exists.");
}

#[tokio::test]
async fn test_sign_up_validation() {
    let h = harness();

    let bad_email = h.sign_up("Ada", "not-an-email", "pw123").await;
    assert_eq!(bad_email.status_code(), StatusCode::BAD_REQUEST);

    let missing = h
        .server
        .post("/users/sign/up")
        .json(&json!({ "email": "ada@x.com" }))
        .await;
    assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);

    let malformed = h
        .server
        .post("/users/sign/up")
        .content_type("application/json")
        .bytes("{ not json".into())
        .await;
    assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);
    assert!(!error_of(&malformed).is_empty());

    assert_eq!(h.store.write_count(), 0);
}

#[tokio::test]
async fn test_sign_up_hides_password() {
    let h = harness();
    let response = h.sign_up("Ada", "ada@x.com", "pw123").await;
    let body = response.json::<Value>();

    assert_eq!(body["data"]["email"], json!("ada@x.com"));
    assert!(body["data"].get("password").is_none());
}

#[tokio::test]
async fn test_sign_in_failures_are_indistinguishable() {
    let h = harness();
    h.sign_up("Ada", "ada@x.com", "pw123").await;

    let wrong_password = h.sign_in("ada@x.com", "nope").await;
    let unknown_email = h.sign_in("bob@x.com", "pw123").await;

    assert_eq!(wrong_password.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_of(&wrong_password), error_of(&unknown_email));
}

#[tokio::test]
async fn test_cart_item_quantity_rules() {
    let h = harness();
    seed_product(&h.store, "p1", 10);
    let (user_id, token) = h.login("Ada", "ada@x.com").await;

    let cart_id = h
        .server
        .post("/carts")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "user_id": user_id }))
        .await
        .json::<Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let zero = h
        .server
        .post(&format!("/carts/{}/items", cart_id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "product_id": "p1", "quantity": 0 }))
        .await;
    assert_eq!(zero.status_code(), StatusCode::BAD_REQUEST);

    let item_id = h
        .server
        .post(&format!("/carts/{}/items", cart_id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "product_id": "p1", "quantity": 1 }))
        .await
        .json::<Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let updated = h
        .server
        .put(&format!("/carts/{}/items/{}", cart_id, item_id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "quantity": 4 }))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    assert_eq!(updated.json::<Value>()["quantity"], json!(4));

    let wrong_cart = h
        .server
        .put(&format!("/carts/other-cart/items/{}", item_id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "quantity": 9 }))
        .await;
    assert_eq!(wrong_cart.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_catalog_routes() {
    let h = harness();
    let (_, token) = h.login("Ada", "ada@x.com").await;

    let unauthorized = h
        .server
        .post("/products/add")
        .json(&json!({ "name": "Mug", "description": "d", "price": 9.5, "category": "kitchen" }))
        .await;
    assert_eq!(unauthorized.status_code(), StatusCode::UNAUTHORIZED);

    let created = h
        .server
        .post("/products/add")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "name": "Mug", "description": "d", "price": 9.5, "category": "kitchen" }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let product_id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    let fetched = h.server.get(&format!("/products/{}", product_id)).await;
    assert_eq!(fetched.status_code(), StatusCode::OK);
    assert_eq!(fetched.json::<Value>()["name"], json!("Mug"));
    let price: Decimal = serde_json::from_value(fetched.json::<Value>()["price"].clone()).unwrap();
    assert_eq!(price, Decimal::new(95, 1));

    let missing = h.server.get("/products/no-such-product").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

    let listed = h.server.get("/products/get/all?category=kitchen").await;
    assert_eq!(listed.status_code(), StatusCode::OK);
    assert_eq!(listed.json::<Value>().as_array().unwrap().len(), 1);

    let updated = h
        .server
        .put(&format!("/products/{}", product_id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "category": "office" }))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);

    let listed = h.server.get("/products/get/all?category=kitchen").await;
    assert!(listed.json::<Value>().as_array().unwrap().is_empty());

    let deleted = h
        .server
        .delete(&format!("/products/{}", product_id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(deleted.json::<Value>()["deleted"], json!(1));
}

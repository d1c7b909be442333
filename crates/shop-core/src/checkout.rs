//! # Checkout Engine
//!
//! Turns a cart into an order:
//!
//! ```text
//! place_order(user_id, cart_id)
//!   ├── validate ids                  → Validation
//!   ├── load cart                     → NotFound
//!   ├── load lines + products         → InconsistentCart (dangling product)
//!   ├── total = Σ price × quantity    → InconsistentCart (overflow / bad data)
//!   └── insert order {user_id, cart_id, total_cost}
//! ```
//!
//! The read and the insert are separate store calls. A cart mutated in
//! between yields an order priced from the earlier read. The cart itself
//! is left as is after checkout.

use crate::cart::{CartAggregator, CartLine};
use crate::error::{ShopError, ShopResult};
use crate::id::{require_id, RecordId};
use crate::order::Order;
use crate::store::{decode, encode, store_failure, BoxedRecordStore, Table};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, instrument};

#[derive(Serialize)]
struct NewOrder<'a> {
    user_id: &'a RecordId,
    cart_id: &'a RecordId,
    total_cost: Decimal,
}

/// Sum of `price × quantity` over the lines of one cart.
///
/// Every line must resolve to a product with a non-negative price and
/// carry a positive quantity. An empty cart totals zero.
pub fn compute_total(cart_id: &RecordId, lines: &[CartLine]) -> ShopResult<Decimal> {
    let inconsistent = |reason: String| ShopError::InconsistentCart {
        cart_id: cart_id.to_string(),
        reason,
    };

    lines.iter().try_fold(Decimal::ZERO, |total, line| {
        let item = &line.item;
        let product = line.product.as_ref().ok_or_else(|| {
            inconsistent(format!(
                "item {} references missing product {}",
                item.id, item.product_id
            ))
        })?;

        if product.price.is_sign_negative() && !product.price.is_zero() {
            return Err(inconsistent(format!("product {} has a negative price", product.id)));
        }
        if item.quantity < 1 {
            return Err(inconsistent(format!(
                "item {} has quantity {}",
                item.id, item.quantity
            )));
        }

        product
            .price
            .checked_mul(Decimal::from(item.quantity))
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or_else(|| inconsistent("total overflows".to_string()))
    })
}

/// Order placement
#[derive(Clone)]
pub struct CheckoutEngine {
    store: BoxedRecordStore,
    carts: CartAggregator,
}

impl CheckoutEngine {
    pub fn new(store: BoxedRecordStore) -> Self {
        Self {
            carts: CartAggregator::new(store.clone()),
            store,
        }
    }

    #[instrument(skip(self))]
    pub async fn place_order(
        &self,
        user_id: Option<&RecordId>,
        cart_id: Option<&RecordId>,
    ) -> ShopResult<Order> {
        let user_id = require_id(user_id, "user_id")?;
        let cart_id = require_id(cart_id, "cart_id")?;

        let cart = self
            .carts
            .find_cart(&cart_id)
            .await?
            .ok_or_else(|| ShopError::not_found("Cart", cart_id.as_str()))?;

        let lines = self.carts.lines(&cart.id).await?;
        let total_cost = compute_total(&cart.id, &lines).map_err(|err| {
            error!(error = %err, "checkout aborted");
            err
        })?;

        let row = encode(&NewOrder {
            user_id: &user_id,
            cart_id: &cart.id,
            total_cost,
        })?;

        let inserted = self
            .store
            .insert(Table::Orders, row)
            .await
            .map_err(store_failure("insert order"))?;

        let order: Order = decode(Table::Orders, inserted)?;
        info!(
            order_id = %order.id,
            cart_id = %order.cart_id,
            items = lines.len(),
            total_cost = %order.total_cost,
            "order placed"
        );
        Ok(order)
    }
}

//! # Order Queries
//!
//! Read side of `orders`. Listings embed the order's cart and user;
//! a single order additionally carries the cart's line items.

use crate::cart::{CartAggregator, CartLine, Cart};
use crate::error::{ShopError, ShopResult};
use crate::id::RecordId;
use crate::store::{decode, decode_all, store_failure, BoxedRecordStore, Filter, Join, Table};
use crate::user::PublicUser;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// An order row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: RecordId,
    pub user_id: RecordId,
    pub cart_id: RecordId,
    pub total_cost: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Order with its cart and user embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    #[serde(default)]
    pub carts: Option<Cart>,
    #[serde(default)]
    pub users: Option<PublicUser>,
}

/// Order with cart, user and the cart's lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub summary: OrderSummary,
    pub cart_items: Vec<CartLine>,
}

fn summary_joins() -> [Join; 2] {
    [
        Join::one("carts", Table::Carts),
        Join::one("users", Table::Users),
    ]
}

#[derive(Clone)]
pub struct OrderQueries {
    store: BoxedRecordStore,
    carts: CartAggregator,
}

impl OrderQueries {
    pub fn new(store: BoxedRecordStore) -> Self {
        Self {
            carts: CartAggregator::new(store.clone()),
            store,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> ShopResult<Vec<OrderSummary>> {
        let rows = self
            .store
            .query(Table::Orders, &Filter::new(), &summary_joins())
            .await
            .map_err(store_failure("list orders"))?;
        decode_all(Table::Orders, rows)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: &RecordId) -> ShopResult<OrderDetails> {
        let row = self
            .store
            .get(Table::Orders, order_id, &summary_joins())
            .await
            .map_err(store_failure("get order"))?
            .ok_or_else(|| ShopError::not_found("Order", order_id.as_str()))?;

        let summary: OrderSummary = decode(Table::Orders, row)?;
        let cart_items = self.carts.lines(&summary.order.cart_id).await?;

        Ok(OrderDetails {
            summary,
            cart_items,
        })
    }
}

//! # Cart Aggregator
//!
//! Carts and their line items. Reads embed each line's product so callers
//! get prices without a second lookup.
//!
//! Product existence is not checked when an item is added; a dangling
//! `product_id` surfaces as a `null` product here and as
//! `InconsistentCart` at checkout.

use crate::error::{ShopError, ShopResult};
use crate::id::{require_id, RecordId};
use crate::product::Product;
use crate::store::{
    decode, decode_all, encode, store_failure, BoxedRecordStore, Filter, Join, Row, Table,
};
use crate::validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

/// A cart row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: RecordId,
    pub user_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A cart line item row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: RecordId,
    pub cart_id: RecordId,
    pub product_id: RecordId,
    pub quantity: i64,
}

/// A line item with its product embedded (`null` when dangling)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    #[serde(default)]
    pub product: Option<Product>,
}

/// A cart with all of its lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartDetails {
    #[serde(flatten)]
    pub cart: Cart,
    #[serde(default)]
    pub cart_items: Vec<CartLine>,
}

#[derive(Serialize)]
struct NewCart<'a> {
    user_id: &'a RecordId,
}

#[derive(Serialize)]
struct NewCartItem<'a> {
    cart_id: &'a RecordId,
    product_id: &'a RecordId,
    quantity: i64,
}

/// Embed for a cart's items with their products
pub fn lines_join() -> Join {
    Join::many("cart_items", Table::CartItems).with(Join::one("product", Table::Products))
}

/// Embed for a line item's product
pub fn product_join() -> Join {
    Join::one("product", Table::Products)
}

/// Cart assembly and line-item maintenance
#[derive(Clone)]
pub struct CartAggregator {
    store: BoxedRecordStore,
}

impl CartAggregator {
    pub fn new(store: BoxedRecordStore) -> Self {
        Self { store }
    }

    /// Cart row without its items, if it exists
    pub async fn find_cart(&self, cart_id: &RecordId) -> ShopResult<Option<Cart>> {
        self.store
            .get(Table::Carts, cart_id, &[])
            .await
            .map_err(store_failure("find cart"))?
            .map(|row| decode(Table::Carts, row))
            .transpose()
    }

    /// Line items of a cart, each with its product embedded
    pub async fn lines(&self, cart_id: &RecordId) -> ShopResult<Vec<CartLine>> {
        let rows = self
            .store
            .query(
                Table::CartItems,
                &Filter::new().eq("cart_id", cart_id),
                &[product_join()],
            )
            .await
            .map_err(store_failure("load cart items"))?;
        decode_all(Table::CartItems, rows)
    }

    #[instrument(skip(self))]
    pub async fn get_cart(&self, cart_id: &RecordId) -> ShopResult<CartDetails> {
        let row = self
            .store
            .get(Table::Carts, cart_id, &[lines_join()])
            .await
            .map_err(store_failure("get cart"))?
            .ok_or_else(|| ShopError::not_found("Cart", cart_id.as_str()))?;
        decode(Table::Carts, row)
    }

    /// Every cart with its items, in store order
    #[instrument(skip(self))]
    pub async fn list_carts(&self) -> ShopResult<Vec<CartDetails>> {
        let rows = self
            .store
            .query(Table::Carts, &Filter::new(), &[lines_join()])
            .await
            .map_err(store_failure("list carts"))?;
        decode_all(Table::Carts, rows)
    }

    #[instrument(skip(self))]
    pub async fn create_cart(&self, user_id: Option<&RecordId>) -> ShopResult<Cart> {
        let user_id = require_id(user_id, "user_id")?;

        let inserted = self
            .store
            .insert(Table::Carts, encode(&NewCart { user_id: &user_id })?)
            .await
            .map_err(store_failure("create cart"))?;

        let cart: Cart = decode(Table::Carts, inserted)?;
        info!(cart_id = %cart.id, user_id = %cart.user_id, "cart created");
        Ok(cart)
    }

    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        cart_id: &RecordId,
        product_id: Option<&RecordId>,
        quantity: Option<i64>,
    ) -> ShopResult<CartItem> {
        let product_id = require_id(product_id, "product_id")?;
        let quantity = validate::quantity(quantity)?;

        let row = encode(&NewCartItem {
            cart_id,
            product_id: &product_id,
            quantity,
        })?;

        let inserted = self
            .store
            .insert(Table::CartItems, row)
            .await
            .map_err(store_failure("add cart item"))?;

        let item: CartItem = decode(Table::CartItems, inserted)?;
        debug!(item_id = %item.id, "cart item added");
        Ok(item)
    }

    /// Set an item's quantity.
    ///
    /// Matches on both cart and item id; an item that belongs to another
    /// cart is `NotFound` and nothing changes.
    #[instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        cart_id: &RecordId,
        item_id: &RecordId,
        quantity: Option<i64>,
    ) -> ShopResult<CartItem> {
        let quantity = validate::quantity(quantity)?;

        let mut patch = Row::new();
        patch.insert("quantity".to_string(), Value::from(quantity));

        let rows = self
            .store
            .update(
                Table::CartItems,
                &Filter::new().eq("cart_id", cart_id).eq("id", item_id),
                patch,
            )
            .await
            .map_err(store_failure("update cart item"))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| ShopError::not_found("Cart item", item_id.as_str()))?;
        decode(Table::CartItems, row)
    }

    /// Remove an item; removing a missing item is not an error
    #[instrument(skip(self))]
    pub async fn remove_item(&self, cart_id: &RecordId, item_id: &RecordId) -> ShopResult<u64> {
        let removed = self
            .store
            .delete(
                Table::CartItems,
                &Filter::new().eq("cart_id", cart_id).eq("id", item_id),
            )
            .await
            .map_err(store_failure("remove cart item"))?;
        debug!(removed, "cart item delete");
        Ok(removed)
    }

    /// Delete a cart; deleting a missing cart is not an error
    #[instrument(skip(self))]
    pub async fn delete_cart(&self, cart_id: &RecordId) -> ShopResult<u64> {
        let removed = self
            .store
            .delete(Table::Carts, &Filter::by_id(cart_id))
            .await
            .map_err(store_failure("delete cart"))?;
        info!(removed, "cart delete");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (CartAggregator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store
            .seed(
                Table::Products,
                json!({ "id": "p1", "name": "Mug", "price": 10 })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .unwrap();
        (CartAggregator::new(store.clone()), store)
    }

    fn id(s: &str) -> RecordId {
        RecordId::new(s)
    }

    #[tokio::test]
    async fn test_cart_with_lines() {
        let (carts, _) = setup();
        let cart = carts.create_cart(Some(&id("u1"))).await.unwrap();
        carts
            .add_item(&cart.id, Some(&id("p1")), Some(3))
            .await
            .unwrap();

        let details = carts.get_cart(&cart.id).await.unwrap();
        assert_eq!(details.cart.user_id, id("u1"));
        assert_eq!(details.cart_items.len(), 1);
        assert_eq!(details.cart_items[0].item.quantity, 3);
        assert_eq!(
            details.cart_items[0].product.as_ref().map(|p| p.name.as_str()),
            Some("Mug")
        );

        assert_eq!(carts.list_carts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_cart() {
        let (carts, _) = setup();
        assert!(matches!(
            carts.get_cart(&id("nope")).await,
            Err(ShopError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_validation_before_store() {
        let (carts, store) = setup();
        assert!(matches!(
            carts.create_cart(None).await,
            Err(ShopError::Validation(_))
        ));
        assert!(matches!(
            carts.add_item(&id("c1"), None, Some(1)).await,
            Err(ShopError::Validation(_))
        ));
        assert!(matches!(
            carts.add_item(&id("c1"), Some(&id("p1")), Some(0)).await,
            Err(ShopError::Validation(_))
        ));
        assert!(matches!(
            carts.update_item_quantity(&id("c1"), &id("i1"), Some(-1)).await,
            Err(ShopError::Validation(_))
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_update_in_wrong_cart_is_not_found() {
        let (carts, _) = setup();
        let first = carts.create_cart(Some(&id("u1"))).await.unwrap();
        let second = carts.create_cart(Some(&id("u1"))).await.unwrap();
        let item = carts
            .add_item(&first.id, Some(&id("p1")), Some(2))
            .await
            .unwrap();

        let err = carts
            .update_item_quantity(&second.id, &item.id, Some(9))
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::NotFound { .. }));

        let details = carts.get_cart(&first.id).await.unwrap();
        assert_eq!(details.cart_items[0].item.quantity, 2);

        let updated = carts
            .update_item_quantity(&first.id, &item.id, Some(9))
            .await
            .unwrap();
        assert_eq!(updated.quantity, 9);
    }

    #[tokio::test]
    async fn test_deletes_are_idempotent() {
        let (carts, _) = setup();
        let cart = carts.create_cart(Some(&id("u1"))).await.unwrap();
        let item = carts
            .add_item(&cart.id, Some(&id("p1")), Some(1))
            .await
            .unwrap();

        assert_eq!(carts.remove_item(&cart.id, &item.id).await.unwrap(), 1);
        assert_eq!(carts.remove_item(&cart.id, &item.id).await.unwrap(), 0);
        assert_eq!(carts.delete_cart(&cart.id).await.unwrap(), 1);
        assert_eq!(carts.delete_cart(&cart.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dangling_product_is_null() {
        let (carts, _) = setup();
        let cart = carts.create_cart(Some(&id("u1"))).await.unwrap();
        carts
            .add_item(&cart.id, Some(&id("ghost")), Some(1))
            .await
            .unwrap();

        let lines = carts.lines(&cart.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].product.is_none());
    }
}

//! # Product Catalog
//!
//! Products live in the `products` table. Checkout only ever reads
//! `price`; the catalog endpoints manage the rest.

use crate::error::{ShopError, ShopResult};
use crate::id::RecordId;
use crate::store::{decode, decode_all, encode, store_failure, BoxedRecordStore, Filter, Table};
use crate::validate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// A product in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: RecordId,
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Unit price (fixed-point)
    pub price: Decimal,

    #[serde(default)]
    pub category: Option<String>,
}

/// Create request; every field is required
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Partial update; absent fields are left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
    }
}

#[derive(Serialize)]
struct ProductRow<'a> {
    name: &'a str,
    description: &'a str,
    price: Decimal,
    category: &'a str,
}

fn check_price(price: Decimal) -> ShopResult<Decimal> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ShopError::validation("price must not be negative."));
    }
    Ok(price)
}

/// Product catalog operations
#[derive(Clone)]
pub struct ProductCatalog {
    store: BoxedRecordStore,
}

impl ProductCatalog {
    pub fn new(store: BoxedRecordStore) -> Self {
        Self { store }
    }

    /// All products, optionally restricted to one category
    #[instrument(skip(self))]
    pub async fn list(&self, category: Option<&str>) -> ShopResult<Vec<Product>> {
        let filter = match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(category) => Filter::new().eq("category", category),
            None => Filter::new(),
        };

        let rows = self
            .store
            .query(Table::Products, &filter, &[])
            .await
            .map_err(store_failure("list products"))?;
        decode_all(Table::Products, rows)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &RecordId) -> ShopResult<Product> {
        let row = self
            .store
            .get(Table::Products, id, &[])
            .await
            .map_err(store_failure("get product"))?
            .ok_or_else(|| ShopError::not_found("Product", id.as_str()))?;
        decode(Table::Products, row)
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: &NewProduct) -> ShopResult<Product> {
        let name = validate::required(request.name.as_deref(), "name")?;
        let description = validate::required(request.description.as_deref(), "description")?;
        let category = validate::required(request.category.as_deref(), "category")?;
        let price = request
            .price
            .ok_or_else(|| ShopError::validation("Missing required field: price."))
            .and_then(check_price)?;

        let row = encode(&ProductRow {
            name,
            description,
            price,
            category,
        })?;

        let inserted = self
            .store
            .insert(Table::Products, row)
            .await
            .map_err(store_failure("create product"))?;

        let product: Product = decode(Table::Products, inserted)?;
        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &RecordId, patch: &ProductPatch) -> ShopResult<Product> {
        if patch.is_empty() {
            return Err(ShopError::validation("No fields to update."));
        }
        if let Some(price) = patch.price {
            check_price(price)?;
        }
        if let Some(name) = &patch.name {
            validate::required(Some(name.as_str()), "name")?;
        }

        let rows = self
            .store
            .update(Table::Products, &Filter::by_id(id), encode(patch)?)
            .await
            .map_err(store_failure("update product"))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| ShopError::not_found("Product", id.as_str()))?;
        decode(Table::Products, row)
    }

    /// Delete a product; deleting a missing id is not an error
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &RecordId) -> ShopResult<u64> {
        let removed = self
            .store
            .delete(Table::Products, &Filter::by_id(id))
            .await
            .map_err(store_failure("delete product"))?;
        info!(product_id = %id, removed, "product delete");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn catalog() -> ProductCatalog {
        ProductCatalog::new(Arc::new(MemoryStore::new()))
    }

    fn new_product(name: &str, price: Decimal, category: &str) -> NewProduct {
        NewProduct {
            name: Some(name.into()),
            description: Some(format!("{} description", name)),
            price: Some(price),
            category: Some(category.into()),
        }
    }

    #[tokio::test]
    async fn test_create_and_filter_by_category() {
        let catalog = catalog();
        catalog
            .create(&new_product("Mug", Decimal::new(999, 2), "kitchen"))
            .await
            .unwrap();
        catalog
            .create(&new_product("Shirt", Decimal::from(20), "apparel"))
            .await
            .unwrap();

        assert_eq!(catalog.list(None).await.unwrap().len(), 2);

        let kitchen = catalog.list(Some("kitchen")).await.unwrap();
        assert_eq!(kitchen.len(), 1);
        assert_eq!(kitchen[0].price, Decimal::new(999, 2));
    }

    #[tokio::test]
    async fn test_create_validation() {
        let catalog = catalog();
        let mut request = new_product("Mug", Decimal::from(5), "kitchen");
        request.price = None;
        assert!(matches!(
            catalog.create(&request).await,
            Err(ShopError::Validation(_))
        ));

        let request = new_product("Mug", Decimal::from(-1), "kitchen");
        assert!(matches!(
            catalog.create(&request).await,
            Err(ShopError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update() {
        let catalog = catalog();
        let product = catalog
            .create(&new_product("Mug", Decimal::from(5), "kitchen"))
            .await
            .unwrap();

        let patch = ProductPatch {
            price: Some(Decimal::from(7)),
            ..Default::default()
        };
        let updated = catalog.update(&product.id, &patch).await.unwrap();
        assert_eq!(updated.price, Decimal::from(7));
        assert_eq!(updated.name, "Mug");

        assert!(matches!(
            catalog.update(&RecordId::new("missing"), &patch).await,
            Err(ShopError::NotFound { .. })
        ));
        assert!(matches!(
            catalog.update(&product.id, &ProductPatch::default()).await,
            Err(ShopError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let catalog = catalog();
        let product = catalog
            .create(&new_product("Mug", Decimal::from(5), "kitchen"))
            .await
            .unwrap();

        assert_eq!(catalog.delete(&product.id).await.unwrap(), 1);
        assert_eq!(catalog.delete(&product.id).await.unwrap(), 0);
    }
}

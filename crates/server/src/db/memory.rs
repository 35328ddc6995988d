//! In-process store.
//!
//! Used when no database URL is configured and by the test suites. All data
//! lives behind one `tokio::sync::RwLock`, so each call observes and mutates a
//! consistent snapshot and the stock decrement is a single critical section.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use cartwheel_core::{OrderNumber, ProductId, UserId};

use super::{RepositoryError, StockChange, Store};
use crate::models::{Cart, Order, Product};

#[derive(Debug, Default)]
struct Inner {
    /// Insertion order doubles as creation order.
    products: Vec<Product>,
    carts: HashMap<UserId, Cart>,
    /// Insertion order doubles as creation order.
    orders: Vec<Order>,
}

/// Store that keeps everything in memory. Cloning shares the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.inner.read().await.products.clone())
    }

    async fn count_products(&self) -> Result<u64, RepositoryError> {
        let len = self.inner.read().await.products.len();
        u64::try_from(len).map_err(|_| RepositoryError::DataCorruption(len.to_string()))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.products.iter().find(|p| p.id == id).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner.products.iter().any(|p| p.id == product.id) {
            return Err(RepositoryError::Conflict(format!(
                "product {} already exists",
                product.id
            )));
        }
        inner.products.push(product.clone());
        Ok(())
    }

    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> Result<StockChange, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(product) = inner.products.iter_mut().find(|p| p.id == id) else {
            return Ok(StockChange::Missing);
        };

        if !product.has_stock_for(quantity) {
            return Ok(StockChange::Insufficient(product.clone()));
        }

        product.stock -= quantity;
        product.updated_at = Utc::now();
        Ok(StockChange::Applied(product.clone()))
    }

    async fn restock(&self, id: ProductId, quantity: u32) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;

        product.stock = product.stock.saturating_add(quantity);
        product.updated_at = Utc::now();
        Ok(())
    }

    async fn find_cart(&self, user_id: &UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.inner.read().await.carts.get(user_id).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        inner
            .carts
            .entry(cart.user_id.clone())
            .and_modify(|existing| {
                existing.items.clone_from(&cart.items);
                existing.updated_at = cart.updated_at;
            })
            .or_insert_with(|| cart.clone());
        Ok(())
    }

    async fn insert_order(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner.orders.iter().any(|o| o.order_id == order.order_id) {
            return Err(RepositoryError::Conflict(format!(
                "order number {} already exists",
                order.order_id
            )));
        }
        inner.orders.push(order.clone());
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.orders.iter().rev().cloned().collect())
    }

    async fn find_order(&self, order_id: &OrderNumber) -> Result<Option<Order>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .find(|o| &o.order_id == order_id)
            .cloned())
    }
}

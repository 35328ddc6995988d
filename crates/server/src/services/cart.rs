//! Per-user cart operations.
//!
//! Carts are read, modified in memory and written back whole. Concurrent
//! writers to the same cart are last-write-wins.

use tracing::instrument;

use cartwheel_core::{CartItemId, ProductId, UserId};

use super::ServiceError;
use crate::db::Store;
use crate::models::{Cart, CartView};

/// Cart operations.
pub struct CartService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> CartService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Get the user's cart, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the store fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_cart(&self, user_id: &UserId) -> Result<CartView, ServiceError> {
        let cart = match self.store.find_cart(user_id).await? {
            Some(cart) => cart,
            None => {
                let cart = Cart::new(user_id.clone());
                self.store.save_cart(&cart).await?;
                cart
            }
        };

        self.view(cart).await
    }

    /// Add `quantity` units of a product, merging with an existing line.
    ///
    /// The merged quantity is checked against current stock but nothing is
    /// reserved; checkout re-checks.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the product reference or a
    /// positive quantity is missing, `ServiceError::NotFound` if the product
    /// does not exist, and `ServiceError::InsufficientStock` if the cart would
    /// hold more units than are in stock.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn add_item(
        &self,
        user_id: &UserId,
        product_ref: Option<&str>,
        quantity: Option<i64>,
    ) -> Result<CartView, ServiceError> {
        let product_ref = product_ref.map(str::trim).filter(|r| !r.is_empty());
        let quantity = quantity
            .filter(|q| *q >= 1)
            .and_then(|q| u32::try_from(q).ok());
        let (Some(product_ref), Some(quantity)) = (product_ref, quantity) else {
            return Err(ServiceError::validation(
                "ProductId and quantity are required",
            ));
        };

        let product_id = ProductId::parse(product_ref)
            .map_err(|_| ServiceError::not_found("Product not found"))?;
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product not found"))?;

        let mut cart = self
            .store
            .find_cart(user_id)
            .await?
            .unwrap_or_else(|| Cart::new(user_id.clone()));

        let wanted = cart.quantity_of(product.id).saturating_add(quantity);
        if !product.has_stock_for(wanted) {
            return Err(ServiceError::InsufficientStock {
                product: product.name,
            });
        }

        let item_id = cart.add(&product, quantity);
        ensure_total(&cart)?;
        self.store.save_cart(&cart).await?;

        tracing::debug!(%item_id, product_id = %product.id, quantity, "Added item to cart");
        self.view(cart).await
    }

    /// Set a line's quantity. 0 removes the line.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the quantity is missing or
    /// negative, and `ServiceError::NotFound` if the cart or line does not
    /// exist.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn set_item_quantity(
        &self,
        user_id: &UserId,
        item_id: &str,
        quantity: Option<i64>,
    ) -> Result<CartView, ServiceError> {
        let quantity = quantity.ok_or_else(|| ServiceError::validation("Quantity is required"))?;
        if quantity < 0 {
            return Err(ServiceError::validation("Quantity cannot be negative"));
        }
        let quantity = u32::try_from(quantity)
            .map_err(|_| ServiceError::validation("Quantity is too large"))?;

        let mut cart = self.require_cart(user_id).await?;

        let updated = CartItemId::parse(item_id)
            .is_ok_and(|item_id| cart.set_quantity(item_id, quantity));
        if !updated {
            return Err(ServiceError::not_found("Item not found in cart"));
        }
        ensure_total(&cart)?;

        self.store.save_cart(&cart).await?;
        self.view(cart).await
    }

    /// Remove a line. Removing a line that is not in the cart is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user has no cart.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn remove_item(
        &self,
        user_id: &UserId,
        item_id: &str,
    ) -> Result<CartView, ServiceError> {
        let mut cart = self.require_cart(user_id).await?;

        if let Ok(item_id) = CartItemId::parse(item_id)
            && cart.remove(item_id)
        {
            self.store.save_cart(&cart).await?;
        }

        self.view(cart).await
    }

    /// Remove every line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user has no cart.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn clear_cart(&self, user_id: &UserId) -> Result<CartView, ServiceError> {
        let mut cart = self.require_cart(user_id).await?;
        cart.clear();
        self.store.save_cart(&cart).await?;
        self.view(cart).await
    }

    async fn require_cart(&self, user_id: &UserId) -> Result<Cart, ServiceError> {
        self.store
            .find_cart(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart not found"))
    }

    /// Attach the current product documents to each line.
    async fn view(&self, cart: Cart) -> Result<CartView, ServiceError> {
        let ids: Vec<ProductId> = cart.items.iter().map(|item| item.product_id).collect();
        let products = self.store.get_products(&ids).await?;
        CartView::new(cart, &products).map_err(|e| ServiceError::Internal(e.to_string()))
    }
}

fn ensure_total(cart: &Cart) -> Result<(), ServiceError> {
    cart.total()
        .map(drop)
        .map_err(|_| ServiceError::validation("Cart total is too large"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewProduct, Product};
    use cartwheel_core::Price;

    async fn setup(stock: u32) -> (MemoryStore, Product, UserId) {
        let store = MemoryStore::new();
        let product = NewProduct::new("Running Shoes", Price::from_cents(12999))
            .stock(stock)
            .into_product(Utc::now());
        store.insert_product(&product).await.unwrap();
        (store, product, UserId::parse("alice").unwrap())
    }

    #[tokio::test]
    async fn test_get_cart_creates_empty_cart_once() {
        let (store, _, user) = setup(5).await;
        let carts = CartService::new(&store);

        let first = carts.get_cart(&user).await.unwrap();
        let second = carts.get_cart(&user).await.unwrap();

        assert!(first.items.is_empty());
        assert_eq!(first.id, second.id);
        assert_eq!(first.total, Price::ZERO);
    }

    #[tokio::test]
    async fn test_add_item_merges_and_populates() {
        let (store, product, user) = setup(5).await;
        let carts = CartService::new(&store);
        let id = product.id.to_string();

        carts.add_item(&user, Some(id.as_str()), Some(2)).await.unwrap();
        let view = carts.add_item(&user, Some(id.as_str()), Some(1)).await.unwrap();

        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 3);
        assert_eq!(view.items[0].product.as_ref().unwrap().name, "Running Shoes");
        assert_eq!(view.item_count, 3);
        assert_eq!(view.total, Price::from_cents(38997));
    }

    #[tokio::test]
    async fn test_add_item_requires_product_and_quantity() {
        let (store, product, user) = setup(5).await;
        let carts = CartService::new(&store);
        let id = product.id.to_string();

        for (product_ref, quantity) in [
            (None, Some(1)),
            (Some(id.as_str()), None),
            (Some(id.as_str()), Some(0)),
            (Some(id.as_str()), Some(-2)),
        ] {
            let err = carts
                .add_item(&user, product_ref, quantity)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "ProductId and quantity are required");
        }
    }

    #[tokio::test]
    async fn test_add_item_unknown_product() {
        let (store, _, user) = setup(5).await;
        let carts = CartService::new(&store);

        let unknown = ProductId::generate().to_string();
        for product_ref in ["bogus", unknown.as_str()] {
            let err = carts
                .add_item(&user, Some(product_ref), Some(1))
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Product not found"));
        }
    }

    #[tokio::test]
    async fn test_add_item_checks_merged_quantity_against_stock() {
        let (store, product, user) = setup(3).await;
        let carts = CartService::new(&store);
        let id = product.id.to_string();

        carts.add_item(&user, Some(id.as_str()), Some(2)).await.unwrap();
        let err = carts.add_item(&user, Some(id.as_str()), Some(2)).await.unwrap_err();
        assert_eq!(err.to_string(), "Insufficient stock for Running Shoes");

        // Nothing is reserved by adding to a cart.
        let stored = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 3);
    }

    #[tokio::test]
    async fn test_set_quantity_updates_and_removes() {
        let (store, product, user) = setup(10).await;
        let carts = CartService::new(&store);
        let view = carts
            .add_item(&user, Some(product.id.to_string().as_str()), Some(1))
            .await
            .unwrap();
        let item_id = view.items[0].id.to_string();

        let view = carts
            .set_item_quantity(&user, &item_id, Some(4))
            .await
            .unwrap();
        assert_eq!(view.item_count, 4);

        let view = carts
            .set_item_quantity(&user, &item_id, Some(0))
            .await
            .unwrap();
        assert!(view.items.is_empty());
        assert_eq!(view.total, Price::ZERO);
    }

    #[tokio::test]
    async fn test_set_quantity_errors() {
        let (store, product, user) = setup(10).await;
        let carts = CartService::new(&store);

        let err = carts
            .set_item_quantity(&user, "anything", Some(-1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Quantity cannot be negative");

        let err = carts
            .set_item_quantity(&user, "anything", Some(1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cart not found");

        carts
            .add_item(&user, Some(product.id.to_string().as_str()), Some(1))
            .await
            .unwrap();
        let missing = CartItemId::generate().to_string();
        for item_id in ["not-a-uuid", missing.as_str()] {
            let err = carts
                .set_item_quantity(&user, item_id, Some(1))
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Item not found in cart");
        }
    }

    #[tokio::test]
    async fn test_remove_item_absent_is_noop() {
        let (store, product, user) = setup(10).await;
        let carts = CartService::new(&store);

        let err = carts.remove_item(&user, "anything").await.unwrap_err();
        assert_eq!(err.to_string(), "Cart not found");

        let view = carts
            .add_item(&user, Some(product.id.to_string().as_str()), Some(2))
            .await
            .unwrap();
        let view_after = carts
            .remove_item(&user, &CartItemId::generate().to_string())
            .await
            .unwrap();
        assert_eq!(view_after.item_count, 2);

        let view_after = carts
            .remove_item(&user, &view.items[0].id.to_string())
            .await
            .unwrap();
        assert!(view_after.items.is_empty());
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let (store, product, user) = setup(10).await;
        let carts = CartService::new(&store);

        let err = carts.clear_cart(&user).await.unwrap_err();
        assert_eq!(err.to_string(), "Cart not found");

        carts
            .add_item(&user, Some(product.id.to_string().as_str()), Some(2))
            .await
            .unwrap();
        let view = carts.clear_cart(&user).await.unwrap();
        assert!(view.items.is_empty());
        assert_eq!(view.item_count, 0);
        assert_eq!(view.total, Price::ZERO);
    }

    #[tokio::test]
    async fn test_carts_are_isolated_per_user() {
        let (store, product, alice) = setup(10).await;
        let carts = CartService::new(&store);
        let bob = UserId::parse("bob").unwrap();

        carts
            .add_item(&alice, Some(product.id.to_string().as_str()), Some(2))
            .await
            .unwrap();

        assert!(carts.get_cart(&bob).await.unwrap().items.is_empty());
        assert_eq!(carts.get_cart(&alice).await.unwrap().item_count, 2);
    }

    #[tokio::test]
    async fn test_cart_total_is_capped() {
        let store = MemoryStore::new();
        let product = NewProduct::new("Vault", Price::MAX)
            .stock(5)
            .into_product(Utc::now());
        store.insert_product(&product).await.unwrap();
        let user = UserId::parse("alice").unwrap();
        let carts = CartService::new(&store);
        let product_id = product.id.to_string();

        let view = carts
            .add_item(&user, Some(product_id.as_str()), Some(1))
            .await
            .unwrap();
        assert_eq!(view.total, Price::MAX);

        let err = carts
            .add_item(&user, Some(product_id.as_str()), Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "Cart total is too large"));

        let item_id = view.items[0].id.to_string();
        let err = carts
            .set_item_quantity(&user, &item_id, Some(3))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cart total is too large");

        assert_eq!(carts.get_cart(&user).await.unwrap().item_count, 1);
    }
}

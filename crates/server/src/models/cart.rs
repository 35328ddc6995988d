//! Per-user carts.
//!
//! A cart is a single document holding an ordered list of line items. Line
//! prices are snapshots taken when the product was first added and are never
//! re-synced with the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cartwheel_core::{CartId, CartItemId, Price, PriceError, ProductId, UserId};

use super::Product;

/// One product line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    /// Always at least 1; a line set to 0 is removed.
    pub quantity: u32,
    /// Unit price at the time the product was added.
    pub price: Price,
}

impl CartItem {
    /// # Errors
    ///
    /// Returns [`PriceError::TooLarge`] if the line exceeds [`Price::MAX`].
    pub fn line_total(&self) -> Result<Price, PriceError> {
        self.price.times(self.quantity)
    }
}

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Create an empty cart for `user_id`.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::generate(),
            user_id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Sum of the snapshot line totals.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::TooLarge`] if a line or the sum exceeds
    /// [`Price::MAX`].
    pub fn total(&self) -> Result<Price, PriceError> {
        self.items
            .iter()
            .try_fold(Price::ZERO, |acc, item| acc.checked_add(item.line_total()?))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity of `product_id` already in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.items
            .iter()
            .find(|item| item.product_id == product_id)
            .map_or(0, |item| item.quantity)
    }

    /// Add `quantity` units of `product`, merging into the existing line for
    /// that product if there is one. New lines snapshot the current price.
    pub fn add(&mut self, product: &Product, quantity: u32) -> CartItemId {
        self.touch();

        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product.id)
        {
            item.quantity = item.quantity.saturating_add(quantity);
            return item.id;
        }

        let item = CartItem {
            id: CartItemId::generate(),
            product_id: product.id,
            quantity,
            price: product.price,
        };
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Set the quantity of a line; 0 removes it.
    ///
    /// Returns `false` if the cart has no line with `item_id`.
    pub fn set_quantity(&mut self, item_id: CartItemId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(item_id);
        }

        let Some(item) = self.items.iter_mut().find(|item| item.id == item_id) else {
            return false;
        };
        item.quantity = quantity;
        self.touch();
        true
    }

    /// Remove a line. Returns `false` if it was not present.
    pub fn remove(&mut self, item_id: CartItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != item_id);
        let removed = self.items.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A cart line as returned to clients, with the current product attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub id: CartItemId,
    pub product_id: ProductId,
    /// `None` when the product has since been removed from the catalog.
    pub product: Option<Product>,
    pub quantity: u32,
    pub price: Price,
    pub line_total: Price,
}

/// A cart as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartLineView>,
    pub item_count: u32,
    pub total: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartView {
    /// Build a view of `cart`, attaching products found in `products`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::TooLarge`] if the cart total exceeds
    /// [`Price::MAX`].
    pub fn new(cart: Cart, products: &[Product]) -> Result<Self, PriceError> {
        let item_count = cart.item_count();
        let total = cart.total()?;
        let items = cart
            .items
            .into_iter()
            .map(|item| -> Result<CartLineView, PriceError> {
                Ok(CartLineView {
                    line_total: item.line_total()?,
                    id: item.id,
                    product_id: item.product_id,
                    product: products.iter().find(|p| p.id == item.product_id).cloned(),
                    quantity: item.quantity,
                    price: item.price,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            id: cart.id,
            user_id: cart.user_id,
            items,
            item_count,
            total,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::models::NewProduct;

    fn product(cents: u32) -> Product {
        NewProduct::new("Widget", Price::from_cents(cents)).into_product(Utc::now())
    }

    #[test]
    fn test_add_merges_lines_for_same_product() {
        let widget = product(500);
        let mut cart = Cart::new(UserId::guest());

        let first = cart.add(&widget, 1);
        let second = cart.add(&widget, 2);

        assert_eq!(first, second);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.quantity_of(widget.id), 3);
    }

    #[test]
    fn test_add_keeps_price_snapshot() {
        let mut widget = product(500);
        let mut cart = Cart::new(UserId::guest());
        cart.add(&widget, 1);

        widget.price = Price::from_cents(900);
        cart.add(&widget, 1);

        assert_eq!(cart.items[0].price, Price::from_cents(500));
        assert_eq!(cart.total().unwrap(), Price::from_cents(1000));
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new(UserId::guest());
        let a = cart.add(&product(100), 2);
        let b = cart.add(&product(250), 1);

        assert!(cart.set_quantity(a, 0));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].id, b);
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total().unwrap(), Price::from_cents(250));
    }

    #[test]
    fn test_set_quantity_unknown_item() {
        let mut cart = Cart::new(UserId::guest());
        assert!(!cart.set_quantity(CartItemId::generate(), 3));
        assert!(!cart.remove(CartItemId::generate()));
    }

    #[test]
    fn test_clear_empties_cart() {
        let mut cart = Cart::new(UserId::guest());
        cart.add(&product(100), 4);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total().unwrap(), Price::ZERO);
    }

    #[test]
    fn test_view_attaches_products_and_totals() {
        let widget = product(1999);
        let mut cart = Cart::new(UserId::guest());
        cart.add(&widget, 2);

        let view = CartView::new(cart, std::slice::from_ref(&widget)).unwrap();
        assert_eq!(view.item_count, 2);
        assert_eq!(view.total, Price::from_cents(3998));
        assert_eq!(view.items[0].product.as_ref().unwrap().id, widget.id);
        assert_eq!(view.items[0].line_total, Price::from_cents(3998));

        let orphan = CartView::new(
            {
                let mut c = Cart::new(UserId::guest());
                c.add(&widget, 1);
                c
            },
            &[],
        )
        .unwrap();
        assert!(orphan.items[0].product.is_none());
    }

    #[test]
    fn test_total_fails_instead_of_overflowing() {
        let mut cart = Cart::new(UserId::guest());
        cart.add(&product(100), 1);
        let mut pricey = product(0);
        pricey.price = Price::MAX;
        cart.add(&pricey, 1);

        assert_eq!(cart.total(), Err(PriceError::TooLarge));
        assert!(CartView::new(cart, &[]).is_err());
    }
}

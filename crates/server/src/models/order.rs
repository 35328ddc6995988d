//! Completed purchases.
//!
//! Orders are append-only. Line items are denormalized snapshots of the
//! product name and price at purchase time so later catalog edits never
//! change historical orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cartwheel_core::{OrderId, OrderNumber, OrderStatus, Price, PriceError, ProductId};

use super::Product;

/// Who placed the order. Only presence is checked, not format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
}

/// One purchased product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price charged.
    pub price: Price,
    pub quantity: u32,
}

impl OrderLine {
    /// Snapshot `product` as a purchased line.
    #[must_use]
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity,
        }
    }

    /// # Errors
    ///
    /// Returns [`PriceError::TooLarge`] if the line exceeds [`Price::MAX`].
    pub fn line_total(&self) -> Result<Price, PriceError> {
        self.price.times(self.quantity)
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Customer-facing order number.
    pub order_id: OrderNumber,
    pub customer: Customer,
    pub items: Vec<OrderLine>,
    pub total: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Summary returned to the client right after checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub order_id: OrderNumber,
    pub customer: Customer,
    pub items: Vec<OrderLine>,
    pub total: Price,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

impl From<Order> for Receipt {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.order_id,
            customer: order.customer,
            items: order.items,
            total: order.total,
            status: order.status,
            timestamp: order.created_at,
        }
    }
}

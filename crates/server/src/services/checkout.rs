//! Checkout and order queries.
//!
//! # Order placement
//!
//! 1. Validate the customer and requested items (no storage access).
//! 2. For each item in request order, take stock with a conditional
//!    decrement and snapshot the product into an order line.
//! 3. Persist the order under a fresh order number, retrying on collision.
//! 4. Clear the user's cart (best-effort).
//!
//! If step 2 or 3 fails, every decrement already applied by this call is
//! returned to stock before the error is reported. There is no transaction
//! spanning products and orders, so a crash between steps can still leave
//! stock decremented without an order.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::instrument;

use cartwheel_core::{OrderId, OrderNumber, OrderStatus, Price, ProductId, UserId};

use super::ServiceError;
use crate::db::{RepositoryError, StockChange, Store};
use crate::models::{Customer, Order, OrderLine, Receipt};

/// Attempts at persisting an order before giving up on order-number
/// collisions.
const MAX_ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Customer details as submitted.
#[derive(Debug, Clone, Default)]
pub struct CustomerInput {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// One requested item as submitted.
#[derive(Debug, Clone, Default)]
pub struct CheckoutItem {
    /// Product id as sent by the client.
    pub product_ref: Option<String>,
    pub quantity: Option<i64>,
}

/// A checkout request.
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    pub customer: Option<CustomerInput>,
    pub items: Vec<CheckoutItem>,
}

/// Order placement and lookup.
pub struct CheckoutService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> CheckoutService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Place an order for `request` on behalf of `user_id`.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation` if the customer is incomplete, no items
    ///   were requested, a quantity is below 1, or the total exceeds
    ///   `Price::MAX`
    /// - `ServiceError::NotFound` if a referenced product does not exist
    /// - `ServiceError::InsufficientStock` if a product has fewer units than
    ///   requested
    /// - `ServiceError::Storage` if the store fails
    ///
    /// On any error, stock taken by this call has been restored.
    #[instrument(skip(self, request), fields(user_id = %user_id, items = request.items.len()))]
    pub async fn place_order(
        &self,
        request: CheckoutRequest,
        user_id: &UserId,
    ) -> Result<Receipt, ServiceError> {
        let customer = validate_customer(request.customer)?;
        let items = validate_items(request.items)?;

        let mut taken = Vec::with_capacity(items.len());
        let result = self.record_order(customer, &items, &mut taken).await;
        if result.is_err() {
            self.release(&taken).await;
        }
        let order = result?;

        tracing::info!(
            order_id = %order.order_id,
            total = %order.total,
            lines = order.items.len(),
            "Order placed"
        );

        if let Err(e) = self.clear_cart(user_id).await {
            tracing::warn!(error = %e, "Failed to clear cart after checkout");
        }

        Ok(Receipt::from(order))
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the store fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ServiceError> {
        Ok(self.store.list_orders().await?)
    }

    /// Look up an order by its public order number.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the number is malformed or unknown.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: &str) -> Result<Order, ServiceError> {
        let order_id =
            OrderNumber::parse(order_id).map_err(|_| ServiceError::not_found("Order not found"))?;
        self.store
            .find_order(&order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order not found"))
    }

    /// Take stock for every item and persist the order.
    ///
    /// Each successful decrement is pushed onto `taken` as it happens so the
    /// caller can undo them.
    async fn record_order(
        &self,
        customer: Customer,
        items: &[(String, u32)],
        taken: &mut Vec<(ProductId, u32)>,
    ) -> Result<Order, ServiceError> {
        let mut lines = Vec::with_capacity(items.len());

        for (product_ref, quantity) in items {
            let not_found = || {
                if product_ref.is_empty() {
                    ServiceError::not_found("Product not found")
                } else {
                    ServiceError::not_found(format!("Product {product_ref} not found"))
                }
            };
            let product_id = ProductId::parse(product_ref).map_err(|_| not_found())?;

            let product = match self.store.decrement_stock(product_id, *quantity).await? {
                StockChange::Applied(product) => product,
                StockChange::Insufficient(product) => {
                    return Err(ServiceError::InsufficientStock {
                        product: product.name,
                    });
                }
                StockChange::Missing => return Err(not_found()),
            };

            taken.push((product_id, *quantity));
            lines.push(OrderLine::snapshot(&product, *quantity));
        }

        let total = lines
            .iter()
            .try_fold(Price::ZERO, |acc, line| acc.checked_add(line.line_total()?))
            .map_err(|_| ServiceError::validation("Order total is too large"))?;
        let mut order = Order {
            id: OrderId::generate(),
            order_id: generate_order_number(Utc::now())?,
            customer,
            items: lines,
            total,
            status: OrderStatus::Confirmed,
            created_at: Utc::now(),
        };

        let mut attempt = 1;
        loop {
            match self.store.insert_order(&order).await {
                Ok(()) => return Ok(order),
                Err(RepositoryError::Conflict(reason)) if attempt < MAX_ORDER_NUMBER_ATTEMPTS => {
                    tracing::warn!(attempt, %reason, "Order number collision, regenerating");
                    attempt += 1;
                    order.order_id = generate_order_number(Utc::now())?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Return stock taken by a failed checkout.
    async fn release(&self, taken: &[(ProductId, u32)]) {
        for &(product_id, quantity) in taken {
            if let Err(e) = self.store.restock(product_id, quantity).await {
                tracing::error!(
                    %product_id,
                    quantity,
                    error = %e,
                    "Failed to restore stock after checkout failure"
                );
            }
        }
    }

    async fn clear_cart(&self, user_id: &UserId) -> Result<(), RepositoryError> {
        if let Some(mut cart) = self.store.find_cart(user_id).await?
            && !cart.is_empty()
        {
            cart.clear();
            self.store.save_cart(&cart).await?;
        }
        Ok(())
    }
}

fn validate_customer(customer: Option<CustomerInput>) -> Result<Customer, ServiceError> {
    let customer = customer.unwrap_or_default();
    let name = customer.name.as_deref().map(str::trim).unwrap_or_default();
    let email = customer.email.as_deref().map(str::trim).unwrap_or_default();

    if name.is_empty() || email.is_empty() {
        return Err(ServiceError::validation(
            "Customer name and email are required",
        ));
    }

    Ok(Customer {
        name: name.to_owned(),
        email: email.to_owned(),
    })
}

fn validate_items(items: Vec<CheckoutItem>) -> Result<Vec<(String, u32)>, ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::validation("Cart is empty"));
    }

    items
        .into_iter()
        .map(|item| {
            let quantity = item
                .quantity
                .filter(|q| *q >= 1)
                .and_then(|q| u32::try_from(q).ok())
                .ok_or_else(|| ServiceError::validation("Quantity must be at least 1"))?;
            let product_ref = item
                .product_ref
                .map(|r| r.trim().to_owned())
                .unwrap_or_default();
            Ok((product_ref, quantity))
        })
        .collect()
}

/// `ORD-<unix millis>-<9 upper-case alphanumerics>`.
fn generate_order_number(at: DateTime<Utc>) -> Result<OrderNumber, ServiceError> {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(OrderNumber::SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();

    OrderNumber::from_parts(at, &suffix).map_err(|e| ServiceError::Internal(e.to_string()))
}

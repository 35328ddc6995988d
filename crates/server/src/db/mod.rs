//! Persistence for products, carts and orders.
//!
//! Handlers and services talk to storage through the [`Store`] trait. Two
//! backends implement it:
//!
//! - [`PgStore`] - `PostgreSQL`, used whenever a database URL is configured
//! - [`MemoryStore`] - process-local maps, used for development and tests
//!
//! # Database schema: `shop`
//!
//! - `product` - Catalog entries (`stock >= 0` is a CHECK constraint)
//! - `cart` - One row per user id, line items stored as a JSONB document
//! - `customer_order` - Immutable orders, customer and lines as JSONB
//!
//! There are no foreign keys between the three tables; orders and carts carry
//! denormalized snapshots of the products they reference.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p cartwheel-cli -- migrate
//! ```

mod memory;
mod postgres;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use cartwheel_core::{OrderNumber, ProductId, UserId};

use crate::models::{Cart, Order, Product};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate order number).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockChange {
    /// Stock was decremented; carries the updated product.
    Applied(Product),
    /// The product exists but has fewer units than requested. Nothing changed.
    Insufficient(Product),
    /// No product with that id.
    Missing,
}

/// Storage operations used by the services.
///
/// Every call is independent; there are no multi-call transactions. The only
/// atomicity guarantee is [`Store::decrement_stock`], which checks and
/// decrements in a single step so concurrent checkouts cannot oversell.
pub trait Store: Send + Sync + 'static {
    /// Check that the backend is reachable.
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// All products, oldest first.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    fn count_products(&self) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    fn get_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Fetch every product whose id is in `ids`. Unknown ids are skipped.
    fn get_products(
        &self,
        ids: &[ProductId],
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    fn insert_product(
        &self,
        product: &Product,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Take `quantity` units from stock if at least that many are available.
    fn decrement_stock(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<StockChange, RepositoryError>> + Send;

    /// Return `quantity` units to stock.
    ///
    /// Returns [`RepositoryError::NotFound`] if the product no longer exists.
    fn restock(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn find_cart(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<Cart>, RepositoryError>> + Send;

    /// Insert or replace the cart owned by `cart.user_id`.
    fn save_cart(&self, cart: &Cart) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Persist a new order.
    ///
    /// Returns [`RepositoryError::Conflict`] if the order number is taken.
    fn insert_order(
        &self,
        order: &Order,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// All orders, newest first.
    fn list_orders(&self) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;

    fn find_order(
        &self,
        order_id: &OrderNumber,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

//! Business logic services.
//!
//! # Services
//!
//! - `catalog` - Product listing, creation and sample-catalog seeding
//! - `cart` - Per-user cart operations
//! - `checkout` - Order placement and order queries
//!
//! Services borrow a [`Store`](crate::db::Store) and are cheap to construct
//! per request.

mod cart;
mod catalog;
mod checkout;
mod error;

pub use cart::CartService;
pub use catalog::{CatalogService, ProductInput, sample_catalog};
pub use checkout::{CheckoutItem, CheckoutRequest, CheckoutService, CustomerInput};
pub use error::ServiceError;

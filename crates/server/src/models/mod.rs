//! Domain models for the shop.
//!
//! These are the documents persisted by the [`Store`](crate::db::Store)
//! backends and, with camelCase field names, the bodies of the JSON API.

pub mod cart;
pub mod order;
pub mod product;

pub use cart::{Cart, CartItem, CartLineView, CartView};
pub use order::{Customer, Order, OrderLine, Receipt};
pub use product::{NewProduct, Product};

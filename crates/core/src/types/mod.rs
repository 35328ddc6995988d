//! Core types for Cartwheel.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod order_number;
pub mod price;
pub mod status;
pub mod user;

pub use id::*;
pub use order_number::{OrderNumber, OrderNumberError};
pub use price::{Price, PriceError};
pub use status::*;
pub use user::{UserId, UserIdError};

//! Service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors returned by the catalog, cart and checkout services.
///
/// The `Display` text of the first three variants is the message shown to
/// clients, so it must not leak storage details.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input. Never touches storage.
    #[error("{0}")]
    Validation(String),

    /// A referenced product, cart, line or order does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Not enough units of `product` in stock.
    #[error("Insufficient stock for {product}")]
    InsufficientStock {
        /// Product name.
        product: String,
    },

    /// Repository/database error.
    #[error("{0}")]
    Storage(#[from] RepositoryError),

    /// Unexpected failure outside storage.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

//! Catalog products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cartwheel_core::{Price, ProductId};

/// Image used when a product is created without one.
pub const DEFAULT_IMAGE: &str = "https://via.placeholder.com/300";

/// Category used when a product is created without one.
pub const DEFAULT_CATEGORY: &str = "general";

/// Stock level used when a product is created without one.
pub const DEFAULT_STOCK: u32 = 100;

/// A purchasable catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub description: String,
    pub image: String,
    pub category: String,
    /// Units available. Never negative; checkout decrements it.
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether `quantity` units can be taken from stock.
    #[must_use]
    pub const fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}

/// Validated input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub description: String,
    pub image: String,
    pub category: String,
    pub stock: u32,
}

impl NewProduct {
    /// Create product input with the default description, image, category
    /// and stock.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Price) -> Self {
        Self {
            name: name.into(),
            price,
            description: String::new(),
            image: DEFAULT_IMAGE.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            stock: DEFAULT_STOCK,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub const fn stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    /// Materialize the product with a fresh id and timestamps.
    #[must_use]
    pub fn into_product(self, now: DateTime<Utc>) -> Product {
        Product {
            id: ProductId::generate(),
            name: self.name,
            price: self.price,
            description: self.description,
            image: self.image,
            category: self.category,
            stock: self.stock,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_defaults() {
        let input = NewProduct::new("Mug", Price::from_cents(1200));
        assert_eq!(input.description, "");
        assert_eq!(input.image, DEFAULT_IMAGE);
        assert_eq!(input.category, "general");
        assert_eq!(input.stock, 100);
    }

    #[test]
    fn test_into_product_stamps_times() {
        let now = Utc::now();
        let product = NewProduct::new("Mug", Price::from_cents(1200))
            .category("kitchen")
            .stock(3)
            .into_product(now);
        assert_eq!(product.created_at, now);
        assert_eq!(product.updated_at, now);
        assert_eq!(product.category, "kitchen");
        assert!(product.has_stock_for(3));
        assert!(!product.has_stock_for(4));
    }

    #[test]
    fn test_serializes_camel_case() {
        let product = NewProduct::new("Mug", Price::from_cents(1200)).into_product(Utc::now());
        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["price"], serde_json::json!(12.0));
        assert_eq!(json["stock"], serde_json::json!(100));
    }
}

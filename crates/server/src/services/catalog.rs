//! Product catalog.

use chrono::{TimeDelta, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use cartwheel_core::{Price, PriceError, ProductId};

use super::ServiceError;
use crate::db::Store;
use crate::models::{NewProduct, Product};

/// Fields accepted when creating a product. Everything is optional here so
/// that missing values produce validation messages instead of parse errors.
#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i64>,
}

/// Catalog operations.
pub struct CatalogService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> CatalogService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// All products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the store fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.list_products().await?)
    }

    /// Look up a product by its id as received from a client.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the id is malformed or unknown.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &str) -> Result<Product, ServiceError> {
        let id = ProductId::parse(id).map_err(|_| ServiceError::not_found("Product not found"))?;
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product not found"))
    }

    /// Validate `input` and add the product to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the name or price is missing, the
    /// price or stock is negative, or the price exceeds `Price::MAX`.
    #[instrument(skip(self, input), fields(name = ?input.name))]
    pub async fn create_product(&self, input: ProductInput) -> Result<Product, ServiceError> {
        let product = validate_product(input)?.into_product(Utc::now());
        self.store.insert_product(&product).await?;

        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Insert the sample catalog if the catalog is empty.
    ///
    /// Returns how many products were inserted (0 when products already
    /// exist).
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the store fails.
    #[instrument(skip(self))]
    pub async fn seed_catalog(&self) -> Result<usize, ServiceError> {
        if self.store.count_products().await? > 0 {
            tracing::debug!("Catalog already populated, skipping seed");
            return Ok(0);
        }

        // Space creation times apart so "oldest first" keeps the sample order.
        let start = Utc::now();
        let samples = sample_catalog();
        let count = samples.len();
        for (offset, sample) in (0_i64..).zip(samples) {
            let product = sample.into_product(start + TimeDelta::milliseconds(offset));
            self.store.insert_product(&product).await?;
        }

        tracing::info!(count, "Seeded sample catalog");
        Ok(count)
    }
}

fn validate_product(input: ProductInput) -> Result<NewProduct, ServiceError> {
    let name = input.name.as_deref().map(str::trim).unwrap_or_default();
    let Some(price) = input.price.filter(|_| !name.is_empty()) else {
        return Err(ServiceError::validation("Name and price are required"));
    };

    let price = Price::new(price).map_err(|e| match e {
        PriceError::Negative => ServiceError::validation("Price cannot be negative"),
        PriceError::TooLarge => ServiceError::validation("Price is too large"),
    })?;

    let mut product = NewProduct::new(name, price);

    if let Some(stock) = input.stock {
        if stock < 0 {
            return Err(ServiceError::validation("Stock cannot be negative"));
        }
        let stock =
            u32::try_from(stock).map_err(|_| ServiceError::validation("Stock is too large"))?;
        product = product.stock(stock);
    }

    if let Some(description) = non_blank(input.description) {
        product = product.description(description);
    }
    if let Some(image) = non_blank(input.image) {
        product = product.image(image);
    }
    if let Some(category) = non_blank(input.category) {
        product = product.category(category);
    }

    Ok(product)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// The fixed sample catalog used to bootstrap an empty store.
#[must_use]
pub fn sample_catalog() -> Vec<NewProduct> {
    const SAMPLES: [(&str, u32, &str, &str, &str, u32); 8] = [
        (
            "Wireless Bluetooth Headphones",
            7999,
            "High-quality wireless headphones with noise cancellation",
            "photo-1505740420928-5e560c06d30e",
            "electronics",
            50,
        ),
        (
            "Smart Watch Pro",
            29999,
            "Advanced fitness tracking and notifications",
            "photo-1523275335684-37898b6baf30",
            "electronics",
            30,
        ),
        (
            "Leather Backpack",
            8999,
            "Stylish and durable leather backpack",
            "photo-1553062407-98eeb64c6a62",
            "accessories",
            75,
        ),
        (
            "Running Shoes",
            12999,
            "Comfortable running shoes for all terrains",
            "photo-1542291026-7eec264c27ff",
            "footwear",
            100,
        ),
        (
            "Stainless Steel Water Bottle",
            2499,
            "Insulated water bottle keeps drinks cold for 24 hours",
            "photo-1602143407151-7111542de6e8",
            "accessories",
            200,
        ),
        (
            "Wireless Mouse",
            3999,
            "Ergonomic wireless mouse with USB receiver",
            "photo-1527864550417-7fd91fc51a46",
            "electronics",
            150,
        ),
        (
            "Sunglasses",
            14999,
            "UV protection designer sunglasses",
            "photo-1572635196237-14b3f281503f",
            "accessories",
            60,
        ),
        (
            "Yoga Mat",
            3499,
            "Non-slip yoga mat with carrying strap",
            "photo-1601925260368-ae2f83cf8b7f",
            "fitness",
            80,
        ),
    ];

    SAMPLES
        .iter()
        .map(|&(name, cents, description, photo, category, stock)| {
            NewProduct::new(name, Price::from_cents(cents))
                .description(description)
                .image(format!("https://images.unsplash.com/{photo}?w=400"))
                .category(category)
                .stock(stock)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::product::{DEFAULT_CATEGORY, DEFAULT_IMAGE, DEFAULT_STOCK};

    fn input(name: &str, price: Decimal) -> ProductInput {
        ProductInput {
            name: Some(name.to_string()),
            price: Some(price),
            ..ProductInput::default()
        }
    }

    #[tokio::test]
    async fn test_seed_populates_empty_catalog_once() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        assert_eq!(catalog.seed_catalog().await.unwrap(), 8);
        assert_eq!(catalog.seed_catalog().await.unwrap(), 0);

        let products = catalog.list_products().await.unwrap();
        assert_eq!(products.len(), 8);
        assert_eq!(products[0].name, "Wireless Bluetooth Headphones");
        assert_eq!(products[0].price, Price::from_cents(7999));
        assert_eq!(products[7].name, "Yoga Mat");
        assert_eq!(products[7].category, "fitness");
    }

    #[tokio::test]
    async fn test_list_products_has_no_side_effects() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        assert!(catalog.list_products().await.unwrap().is_empty());
        assert!(catalog.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let product = catalog
            .create_product(input("  Lamp ", Decimal::new(1250, 2)))
            .await
            .unwrap();

        assert_eq!(product.name, "Lamp");
        assert_eq!(product.description, "");
        assert_eq!(product.image, DEFAULT_IMAGE);
        assert_eq!(product.category, DEFAULT_CATEGORY);
        assert_eq!(product.stock, DEFAULT_STOCK);

        let fetched = catalog.get_product(&product.id.to_string()).await.unwrap();
        assert_eq!(fetched, product);
    }

    #[tokio::test]
    async fn test_create_requires_name_and_price() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let missing_price = ProductInput {
            name: Some("Lamp".to_string()),
            ..ProductInput::default()
        };
        let err = catalog.create_product(missing_price).await.unwrap_err();
        assert_eq!(err.to_string(), "Name and price are required");

        let err = catalog
            .create_product(input("   ", Decimal::ONE))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        assert!(catalog.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_accepts_zero_price() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let product = catalog
            .create_product(input("Sticker", Decimal::ZERO))
            .await
            .unwrap();
        assert_eq!(product.price, Price::ZERO);
    }

    #[tokio::test]
    async fn test_create_rejects_negative_values() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let err = catalog
            .create_product(input("Lamp", Decimal::new(-1, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Price cannot be negative");

        let err = catalog
            .create_product(ProductInput {
                stock: Some(-3),
                ..input("Lamp", Decimal::ONE)
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Stock cannot be negative");
    }

    #[tokio::test]
    async fn test_create_rejects_price_above_max() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        for price in [
            Decimal::from_scientific("7e28").unwrap(),
            Decimal::new(1_000_000_000_000, 2),
        ] {
            let err = catalog
                .create_product(ProductInput {
                    stock: Some(5),
                    ..input("Vault", price)
                })
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Price is too large");
        }
        assert!(catalog.list_products().await.unwrap().is_empty());

        let product = catalog
            .create_product(input("Vault", Price::MAX.amount()))
            .await
            .unwrap();
        assert_eq!(product.price, Price::MAX);
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let unknown = ProductId::generate().to_string();
        for id in ["not-a-uuid", unknown.as_str()] {
            let err = catalog.get_product(id).await.unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Product not found"));
        }
    }
}

//! `PostgreSQL` store.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate compiles
//! without a live database. Rows are decoded into `*Row` structs and converted
//! to domain models, turning out-of-range values into
//! [`RepositoryError::DataCorruption`].

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use cartwheel_core::{CartId, OrderId, OrderNumber, OrderStatus, Price, ProductId, UserId};

use super::{RepositoryError, StockChange, Store};
use crate::models::{Cart, CartItem, Customer, Order, OrderLine, Product};

const PRODUCT_COLUMNS: &str =
    "id, name, price, description, image, category, stock, created_at, updated_at";

const ORDER_COLUMNS: &str =
    "id, order_id, customer_name, customer_email, items, total, status, created_at";

/// Store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1");
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Product::try_from)
            .transpose()
    }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    price: Price,
    description: String,
    image: String,
    category: String,
    stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let stock = u32::try_from(row.stock).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "stock out of range for product {}: {}",
                row.id, row.stock
            ))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            price: row.price,
            description: row.description,
            image: row.image,
            category: row.category,
            stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    items: Json<Vec<CartItem>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            items: row.items.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_id: OrderNumber,
    customer_name: String,
    customer_email: String,
    items: Json<Vec<OrderLine>>,
    total: Price,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            customer: Customer {
                name: row.customer_name,
                email: row.customer_email,
            },
            items: row.items.0,
            total: row.total,
            status,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Store implementation
// =============================================================================

impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM shop.product ORDER BY created_at, id");
        sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    async fn count_products(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.product")
            .fetch_one(&self.pool)
            .await?;
        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative row count: {count}")))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.fetch_product(id).await
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let uuids: Vec<uuid::Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = ANY($1)");
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(uuids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.product
                (id, name, price, description, image, category, stock, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .bind(&product.image)
        .bind(&product.category)
        .bind(i64::from(product.stock))
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!("product {} already exists", product.id));
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> Result<StockChange, RepositoryError> {
        let sql = format!(
            r"
            UPDATE shop.product
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            RETURNING {PRODUCT_COLUMNS}
            "
        );
        let updated = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(i64::from(quantity))
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = updated {
            return Ok(StockChange::Applied(Product::try_from(row)?));
        }

        // The guard failed: either the product is gone or stock is short.
        Ok(match self.fetch_product(id).await? {
            Some(product) => StockChange::Insufficient(product),
            None => StockChange::Missing,
        })
    }

    async fn restock(&self, id: ProductId, quantity: u32) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.product
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn find_cart(&self, user_id: &UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, items, created_at, updated_at
            FROM shop.cart
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Cart::from))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.cart (id, user_id, items, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET items = EXCLUDED.items, updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(cart.id)
        .bind(&cart.user_id)
        .bind(Json(&cart.items))
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_order(&self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.customer_order
                (id, order_id, customer_name, customer_email, items, total, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(order.id)
        .bind(&order.order_id)
        .bind(&order.customer.name)
        .bind(&order.customer.email)
        .bind(Json(&order.items))
        .bind(order.total)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!(
                    "order number {} already exists",
                    order.order_id
                ));
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        let sql =
            format!("SELECT {ORDER_COLUMNS} FROM shop.customer_order ORDER BY created_at DESC");
        sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Order::try_from)
            .collect()
    }

    async fn find_order(&self, order_id: &OrderNumber) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM shop.customer_order WHERE order_id = $1");
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Order::try_from)
            .transpose()
    }
}

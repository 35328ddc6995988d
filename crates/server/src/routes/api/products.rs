//! Product API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use super::ApiJson;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::Product;
use crate::services::{CatalogService, ProductInput};
use crate::state::AppState;

/// Body of `POST /api/products`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i64>,
}

impl From<CreateProductRequest> for ProductInput {
    fn from(body: CreateProductRequest) -> Self {
        Self {
            name: body.name,
            price: body.price,
            description: body.description,
            image: body.image,
            category: body.category,
            stock: body.stock,
        }
    }
}

/// List all products.
#[instrument(skip(state))]
pub async fn index<S: Store>(State(state): State<AppState<S>>) -> Result<ApiJson<Vec<Product>>> {
    let products = CatalogService::new(state.store())
        .list_products()
        .await
        .map_err(AppError::during("Failed to fetch products"))?;

    Ok(ApiJson(products))
}

/// Get a single product.
#[instrument(skip(state))]
pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<ApiJson<Product>> {
    let product = CatalogService::new(state.store())
        .get_product(&id)
        .await
        .map_err(AppError::during("Failed to fetch product"))?;

    Ok(ApiJson(product))
}

/// Create a product. There is no admin gating.
#[instrument(skip(state, body))]
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, ApiJson<Product>)> {
    let product = CatalogService::new(state.store())
        .create_product(body.into())
        .await
        .map_err(AppError::during("Failed to create product"))?;

    Ok((StatusCode::CREATED, ApiJson(product)))
}

//! Cart API handlers.
//!
//! Every handler resolves the cart owner through [`UserContext`]; handlers
//! with a body also accept a `userId` field that takes precedence.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ApiJson;
use crate::db::Store;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::UserContext;
use crate::models::CartView;
use crate::services::CartService;
use crate::state::AppState;

/// Body of `POST /api/cart`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
    pub user_id: Option<String>,
}

/// Body of `PUT /api/cart/{item_id}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub quantity: Option<i64>,
    pub user_id: Option<String>,
}

/// Response of `DELETE /api/cart`.
#[derive(Debug, Serialize)]
pub struct ClearCartResponse {
    pub message: &'static str,
    pub cart: CartView,
}

/// Get the cart, creating an empty one if needed.
#[instrument(skip(state, user), fields(user_id = %user.0))]
pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
) -> Result<ApiJson<CartView>> {
    let cart = CartService::new(state.store())
        .get_cart(&user.0)
        .await
        .map_err(AppError::during("Failed to fetch cart"))?;

    Ok(ApiJson(cart))
}

/// Add an item to the cart.
#[instrument(skip(state, user, body))]
pub async fn add<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<(StatusCode, ApiJson<CartView>)> {
    let user_id = user.with_body_override(body.user_id.as_deref())?;

    add_breadcrumb(
        "cart",
        "Add item",
        Some(&[("product_id", body.product_id.as_deref().unwrap_or_default())]),
    );

    let cart = CartService::new(state.store())
        .add_item(&user_id, body.product_id.as_deref(), body.quantity)
        .await
        .map_err(AppError::during("Failed to add item to cart"))?;

    Ok((StatusCode::CREATED, ApiJson(cart)))
}

/// Set the quantity of a cart line.
#[instrument(skip(state, user, body))]
pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Path(item_id): Path<String>,
    user: UserContext,
    ApiJson(body): ApiJson<UpdateItemRequest>,
) -> Result<ApiJson<CartView>> {
    let user_id = user.with_body_override(body.user_id.as_deref())?;

    let cart = CartService::new(state.store())
        .set_item_quantity(&user_id, &item_id, body.quantity)
        .await
        .map_err(AppError::during("Failed to update cart"))?;

    Ok(ApiJson(cart))
}

/// Remove a cart line.
#[instrument(skip(state, user), fields(user_id = %user.0))]
pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    Path(item_id): Path<String>,
    user: UserContext,
) -> Result<ApiJson<CartView>> {
    let cart = CartService::new(state.store())
        .remove_item(&user.0, &item_id)
        .await
        .map_err(AppError::during("Failed to remove item from cart"))?;

    Ok(ApiJson(cart))
}

/// Clear the whole cart.
#[instrument(skip(state, user), fields(user_id = %user.0))]
pub async fn clear<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
) -> Result<ApiJson<ClearCartResponse>> {
    let cart = CartService::new(state.store())
        .clear_cart(&user.0)
        .await
        .map_err(AppError::during("Failed to clear cart"))?;

    Ok(ApiJson(ClearCartResponse {
        message: "Cart cleared successfully",
        cart,
    }))
}

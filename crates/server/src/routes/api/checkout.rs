//! Checkout and order API handlers.

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
use crate::models::{Order, Receipt};
use crate::services::{CheckoutItem, CheckoutRequest, CheckoutService, CustomerInput};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CustomerBody {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A requested item. `id` and `productId` both name the product; `id` wins.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemBody {
    pub id: Option<String>,
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
}

/// Body of `POST /api/checkout`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub customer: Option<CustomerBody>,
    /// Absent and `null` both mean an empty cart.
    pub cart_items: Option<Vec<CartItemBody>>,
    pub user_id: Option<String>,
}

impl From<PlaceOrderRequest> for CheckoutRequest {
    fn from(body: PlaceOrderRequest) -> Self {
        Self {
            customer: body.customer.map(|c| CustomerInput {
                name: c.name,
                email: c.email,
            }),
            items: body
                .cart_items
                .unwrap_or_default()
                .into_iter()
                .map(|item| CheckoutItem {
                    product_ref: item.id.or(item.product_id),
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

/// Response of a successful checkout.
#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub message: &'static str,
    pub receipt: Receipt,
}

/// Place an order.
#[instrument(skip(state, user, body))]
pub async fn place_order<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    ApiJson(body): ApiJson<PlaceOrderRequest>,
) -> Result<(StatusCode, ApiJson<PlaceOrderResponse>)> {
    let user_id = user.with_body_override(body.user_id.as_deref())?;

    add_breadcrumb("checkout", "Place order", Some(&[("user_id", user_id.as_str())]));

    let receipt = CheckoutService::new(state.store())
        .place_order(body.into(), &user_id)
        .await
        .map_err(AppError::during("Failed to process checkout"))?;

    Ok((
        StatusCode::CREATED,
        ApiJson(PlaceOrderResponse {
            success: true,
            message: "Order placed successfully",
            receipt,
        }),
    ))
}

/// List all orders, newest first.
#[instrument(skip(state))]
pub async fn orders<S: Store>(State(state): State<AppState<S>>) -> Result<ApiJson<Vec<Order>>> {
    let orders = CheckoutService::new(state.store())
        .list_orders()
        .await
        .map_err(AppError::during("Failed to fetch orders"))?;

    Ok(ApiJson(orders))
}

/// Get one order by its order number.
#[instrument(skip(state))]
pub async fn show_order<S: Store>(
    State(state): State<AppState<S>>,
    Path(order_id): Path<String>,
) -> Result<ApiJson<Order>> {
    let order = CheckoutService::new(state.store())
        .get_order(&order_id)
        .await
        .map_err(AppError::during("Failed to fetch order"))?;

    Ok(ApiJson(order))
}

//! Order receipt page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::db::Store;
use crate::error::{AppError, PageError};
use crate::middleware::Visitor;
use crate::models::{Order, OrderLine};
use crate::services::{CartService, CheckoutService};
use crate::state::AppState;

/// Receipt line display data for templates.
#[derive(Clone)]
pub struct ReceiptLineRow {
    pub name: String,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
}

impl From<&OrderLine> for ReceiptLineRow {
    fn from(line: &OrderLine) -> Self {
        Self {
            name: line.name.clone(),
            price: line.price.to_string(),
            quantity: line.quantity,
            line_total: line
                .line_total()
                .map_or_else(|_| String::from("-"), |total| total.to_string()),
        }
    }
}

/// Receipt page template.
#[derive(Template, WebTemplate)]
#[template(path = "receipt.html")]
pub struct ReceiptTemplate {
    pub order_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub lines: Vec<ReceiptLineRow>,
    pub total: String,
    pub status: String,
    pub placed_at: String,
    pub cart_count: u32,
}

impl ReceiptTemplate {
    fn new(order: &Order, cart_count: u32) -> Self {
        Self {
            order_id: order.order_id.to_string(),
            customer_name: order.customer.name.clone(),
            customer_email: order.customer.email.clone(),
            lines: order.items.iter().map(ReceiptLineRow::from).collect(),
            total: order.total.to_string(),
            status: order.status.to_string(),
            placed_at: order.created_at.format("%B %-d, %Y %H:%M UTC").to_string(),
            cart_count,
        }
    }
}

/// Display an order receipt.
#[instrument(skip(state, visitor), fields(user_id = %visitor.user_id))]
pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    visitor: Visitor,
    Path(order_id): Path<String>,
) -> Result<ReceiptTemplate, PageError> {
    let order = CheckoutService::new(state.store())
        .get_order(&order_id)
        .await
        .map_err(AppError::during("Failed to fetch order"))?;

    let cart = CartService::new(state.store())
        .get_cart(&visitor.user_id)
        .await
        .map_err(AppError::during("Failed to fetch cart"))?;

    Ok(ReceiptTemplate::new(&order, cart.item_count))
}

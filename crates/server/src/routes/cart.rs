//! Cart page and checkout form handlers.
//!
//! The cart belongs to the session's visitor id. Form posts redirect back to
//! `/cart` on success; rejected input re-renders the cart page with the
//! error and a 4xx status.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use cartwheel_core::UserId;

use crate::db::Store;
use crate::error::{AppError, PageError, add_breadcrumb};
use crate::middleware::Visitor;
use crate::models::{CartLineView, CartView};
use crate::services::{
    CartService, CheckoutItem, CheckoutRequest, CheckoutService, CustomerInput, ServiceError,
};
use crate::state::AppState;

/// Shown for lines whose product has since been removed from the catalog.
const UNAVAILABLE_PRODUCT: &str = "Unavailable product";

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineRow {
    pub item_id: String,
    pub name: String,
    pub image: Option<String>,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
}

impl From<&CartLineView> for CartLineRow {
    fn from(line: &CartLineView) -> Self {
        Self {
            item_id: line.id.to_string(),
            name: line
                .product
                .as_ref()
                .map_or_else(|| UNAVAILABLE_PRODUCT.to_string(), |p| p.name.clone()),
            image: line.product.as_ref().map(|p| p.image.clone()),
            price: line.price.to_string(),
            quantity: line.quantity,
            line_total: line.line_total.to_string(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<i64>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: String,
    pub quantity: Option<i64>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: String,
}

/// Checkout form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub lines: Vec<CartLineRow>,
    pub total: String,
    pub cart_count: u32,
    pub error: Option<String>,
    pub name: String,
    pub email: String,
}

impl CartTemplate {
    fn new(cart: &CartView, error: Option<String>, form: CheckoutForm) -> Self {
        Self {
            lines: cart.items.iter().map(CartLineRow::from).collect(),
            total: cart.total.to_string(),
            cart_count: cart.item_count,
            error,
            name: form.name,
            email: form.email,
        }
    }
}

/// Display cart page.
#[instrument(skip(state, visitor), fields(user_id = %visitor.user_id))]
pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    visitor: Visitor,
) -> Result<CartTemplate, PageError> {
    let cart = CartService::new(state.store())
        .get_cart(&visitor.user_id)
        .await
        .map_err(AppError::during("Failed to fetch cart"))?;

    Ok(CartTemplate::new(&cart, None, CheckoutForm::default()))
}

/// Add item to cart.
#[instrument(skip(state, visitor), fields(user_id = %visitor.user_id))]
pub async fn add<S: Store>(
    State(state): State<AppState<S>>,
    visitor: Visitor,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, PageError> {
    add_breadcrumb(
        "cart",
        "Add item",
        Some(&[("product_id", form.product_id.as_str())]),
    );

    let result = CartService::new(state.store())
        .add_item(
            &visitor.user_id,
            Some(form.product_id.as_str()),
            Some(form.quantity.unwrap_or(1)),
        )
        .await;

    after_change(&state, &visitor.user_id, result, "Failed to add item to cart").await
}

/// Update cart item quantity. Zero removes the line.
#[instrument(skip(state, visitor), fields(user_id = %visitor.user_id))]
pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    visitor: Visitor,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response, PageError> {
    let result = CartService::new(state.store())
        .set_item_quantity(&visitor.user_id, &form.item_id, form.quantity)
        .await;

    after_change(&state, &visitor.user_id, result, "Failed to update cart").await
}

/// Remove item from cart.
#[instrument(skip(state, visitor), fields(user_id = %visitor.user_id))]
pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    visitor: Visitor,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response, PageError> {
    let result = CartService::new(state.store())
        .remove_item(&visitor.user_id, &form.item_id)
        .await;

    after_change(&state, &visitor.user_id, result, "Failed to remove item from cart").await
}

/// Place an order for everything in the visitor's cart.
///
/// Redirects to the receipt on success.
#[instrument(skip(state, visitor, form), fields(user_id = %visitor.user_id))]
pub async fn checkout<S: Store>(
    State(state): State<AppState<S>>,
    visitor: Visitor,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, PageError> {
    let cart = CartService::new(state.store())
        .get_cart(&visitor.user_id)
        .await
        .map_err(AppError::during("Failed to fetch cart"))?;

    let request = CheckoutRequest {
        customer: Some(CustomerInput {
            name: Some(form.name.clone()),
            email: Some(form.email.clone()),
        }),
        items: cart
            .items
            .iter()
            .map(|line| CheckoutItem {
                product_ref: Some(line.product_id.to_string()),
                quantity: Some(i64::from(line.quantity)),
            })
            .collect(),
    };

    add_breadcrumb(
        "checkout",
        "Place order",
        Some(&[("user_id", visitor.user_id.as_str())]),
    );

    match CheckoutService::new(state.store())
        .place_order(request, &visitor.user_id)
        .await
        .map_err(AppError::during("Failed to process checkout"))
    {
        Ok(receipt) => Ok(Redirect::to(&format!("/orders/{}", receipt.order_id)).into_response()),
        // Failed checkouts leave the cart untouched
        Err(err) => reject(&cart, err, form),
    }
}

async fn after_change<S: Store>(
    state: &AppState<S>,
    user_id: &UserId,
    result: Result<CartView, ServiceError>,
    action: &'static str,
) -> Result<Response, PageError> {
    let err = match result.map_err(AppError::during(action)) {
        Ok(_) => return Ok(Redirect::to("/cart").into_response()),
        Err(err) => err,
    };

    let cart = CartService::new(state.store())
        .get_cart(user_id)
        .await
        .map_err(AppError::during("Failed to fetch cart"))?;

    reject(&cart, err, CheckoutForm::default())
}

/// Re-render the cart with a client error, or escalate a server fault.
fn reject(cart: &CartView, err: AppError, form: CheckoutForm) -> Result<Response, PageError> {
    let status = err.status();
    if status.is_server_error() {
        return Err(err.into());
    }

    Ok((status, CartTemplate::new(cart, Some(err.to_string()), form)).into_response())
}

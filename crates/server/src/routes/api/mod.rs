//! JSON API, mounted under `/api`.
//!
//! ```text
//! GET    /products                    - All products, oldest first
//! POST   /products                    - Create a product
//! GET    /products/{id}               - One product
//!
//! GET    /cart                        - Current user's cart (created on first read)
//! POST   /cart                        - Add an item
//! DELETE /cart                        - Clear the cart
//! PUT    /cart/{item_id}              - Set a line's quantity (0 removes it)
//! DELETE /cart/{item_id}              - Remove a line
//!
//! POST   /checkout                    - Place an order
//! GET    /checkout/orders             - All orders, newest first
//! GET    /checkout/orders/{order_id}  - One order by order number
//! ```

pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router,
    extract::FromRequest,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Serialize;

use crate::db::Store;
use crate::error::AppError;
use crate::state::AppState;

/// JSON extractor and response whose rejection is an [`AppError`], so
/// malformed bodies get the same `{error, message}` shape as every other
/// failure.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Create the JSON API router.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/products",
            get(products::index::<S>).post(products::create::<S>),
        )
        .route("/products/{id}", get(products::show::<S>))
        .route(
            "/cart",
            get(cart::show::<S>)
                .post(cart::add::<S>)
                .delete(cart::clear::<S>),
        )
        .route(
            "/cart/{item_id}",
            put(cart::update::<S>).delete(cart::remove::<S>),
        )
        .route("/checkout", post(checkout::place_order::<S>))
        .route("/checkout/orders", get(checkout::orders::<S>))
        .route("/checkout/orders/{order_id}", get(checkout::show_order::<S>))
}

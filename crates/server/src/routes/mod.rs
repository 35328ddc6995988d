//! HTTP routes for the JSON API and the storefront pages.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (store reachable)
//!
//! # Storefront pages
//! GET  /                       - Product catalog
//! GET  /cart                   - Cart page with checkout form
//! POST /cart/add               - Add to cart (redirects to /cart)
//! POST /cart/update            - Update quantity (redirects to /cart)
//! POST /cart/remove            - Remove item (redirects to /cart)
//! POST /checkout               - Place order (redirects to the receipt)
//! GET  /orders/{order_id}      - Order receipt
//!
//! # JSON API
//! /api/...                     - See [`api`]
//! ```

pub mod api;
pub mod cart;
pub mod home;
pub mod orders;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::config::ServerConfig;
use crate::db::Store;
use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Create the cart page routes router.
pub fn cart_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(cart::show::<S>))
        .route("/add", post(cart::add::<S>))
        .route("/update", post(cart::update::<S>))
        .route("/remove", post(cart::remove::<S>))
}

/// Create all storefront page routes.
pub fn page_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(home::home::<S>))
        .nest("/cart", cart_routes::<S>())
        .route("/checkout", post(cart::checkout::<S>))
        .route("/orders/{order_id}", get(orders::show::<S>))
}

/// Build the complete application with middleware applied.
pub fn app<S: Store>(state: AppState<S>) -> Router {
    let session_layer = create_session_layer(state.config());
    let cors = cors_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness::<S>))
        .nest("/api", api::routes::<S>().layer(cors))
        .merge(page_routes::<S>())
        .layer(session_layer)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for the JSON API. No configured origins means any origin.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin: {e}");
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness<S: Store>(State(state): State<AppState<S>>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Readiness check failed: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

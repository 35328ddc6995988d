//! Integration tests for Cartwheel.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartwheel-integration-tests
//! ```
//!
//! Each test spawns the real router on an ephemeral port, backed by a fresh
//! in-memory store, and talks to it over HTTP with `reqwest`. No database or
//! external service is needed.
//!
//! # Test Categories
//!
//! - `products` - Catalog API
//! - `cart` - Cart API and owner resolution
//! - `checkout` - Order placement, stock accounting, order queries
//! - `storefront` - Server-rendered pages driven by a cookie-holding client

#![allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::indexing_slicing)]

use std::net::SocketAddr;

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use cartwheel_server::config::ServerConfig;
use cartwheel_server::db::MemoryStore;
use cartwheel_server::routes;
use cartwheel_server::services::CatalogService;
use cartwheel_server::state::AppState;

/// A running server plus a client pointed at it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Spawn a server with the sample catalog seeded.
    pub async fn spawn() -> Self {
        Self::start(true).await
    }

    /// Spawn a server with an empty catalog.
    pub async fn spawn_empty() -> Self {
        Self::start(false).await
    }

    async fn start(seed: bool) -> Self {
        let store = MemoryStore::new();
        if seed {
            CatalogService::new(&store)
                .seed_catalog()
                .await
                .expect("Failed to seed catalog");
        }

        let app = routes::app(AppState::new(ServerConfig::default(), store));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server error");
        });

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            addr,
            client,
            handle,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT failed")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE failed")
    }

    /// `GET /api/products` as JSON.
    pub async fn products(&self) -> Vec<Value> {
        let resp = self.get("/api/products").await;
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.expect("Invalid products JSON")
    }

    /// `GET /api/products/{id}` as JSON.
    pub async fn product(&self, id: &str) -> Value {
        let resp = self.get(&format!("/api/products/{id}")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.expect("Invalid product JSON")
    }

    /// Create a product with the given stock and return its id.
    pub async fn create_product(&self, name: &str, price: f64, stock: u32) -> String {
        let resp = self
            .post_json(
                "/api/products",
                &json!({ "name": name, "price": price, "stock": stock }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let product: Value = resp.json().await.expect("Invalid product JSON");
        product["id"].as_str().expect("Product has no id").to_string()
    }

    /// Place an order for `items` (pairs of product id and quantity).
    pub async fn checkout(&self, user_id: &str, items: &[(&str, i64)]) -> Response {
        let cart_items: Vec<Value> = items
            .iter()
            .map(|(id, quantity)| json!({ "id": id, "quantity": quantity }))
            .collect();

        self.post_json(
            "/api/checkout",
            &json!({
                "customer": { "name": "Ada Lovelace", "email": "ada@example.com" },
                "cartItems": cart_items,
                "userId": user_id,
            }),
        )
        .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Read a JSON error body and return its `error` field.
pub async fn error_of(resp: Response) -> String {
    let body: Value = resp.json().await.expect("Invalid error JSON");
    body["error"]
        .as_str()
        .expect("Error body has no error field")
        .to_string()
}

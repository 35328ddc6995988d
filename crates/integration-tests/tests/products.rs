//! Integration tests for the catalog API.

use reqwest::StatusCode;
use serde_json::{Value, json};

use cartwheel_integration_tests::{TestServer, error_of};

#[tokio::test]
async fn test_lists_seeded_catalog_oldest_first() {
    let server = TestServer::spawn().await;

    let products = server.products().await;
    assert_eq!(products.len(), 8);
    assert_eq!(products[0]["name"], "Wireless Bluetooth Headphones");
    assert_eq!(products[0]["price"], json!(79.99));
    assert_eq!(products[7]["name"], "Yoga Mat");

    for product in &products {
        assert!(product["id"].is_string());
        assert!(product["stock"].as_u64().is_some());
        assert!(product["createdAt"].is_string());
    }
}

#[tokio::test]
async fn test_empty_catalog_lists_nothing() {
    let server = TestServer::spawn_empty().await;
    assert!(server.products().await.is_empty());
}

#[tokio::test]
async fn test_get_product_by_id() {
    let server = TestServer::spawn().await;
    let products = server.products().await;
    let id = products[2]["id"].as_str().unwrap();

    let product = server.product(id).await;
    assert_eq!(product, products[2]);
}

#[tokio::test]
async fn test_unknown_or_malformed_product_id_is_404() {
    let server = TestServer::spawn().await;

    let resp = server
        .get("/api/products/00000000-0000-4000-8000-000000000000")
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(resp).await, "Product not found");

    let resp = server.get("/api/products/not-an-id").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_product_applies_defaults() {
    let server = TestServer::spawn_empty().await;

    let resp = server
        .post_json("/api/products", &json!({ "name": "Desk Lamp", "price": 34.5 }))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let product: Value = resp.json().await.unwrap();
    assert_eq!(product["name"], "Desk Lamp");
    assert_eq!(product["price"], json!(34.5));
    assert_eq!(product["category"], "general");
    assert_eq!(product["stock"], 100);
    assert_eq!(product["description"], "");

    let listed = server.products().await;
    assert_eq!(listed, vec![product]);
}

#[tokio::test]
async fn test_create_product_rejects_bad_input() {
    let server = TestServer::spawn_empty().await;

    let resp = server
        .post_json("/api/products", &json!({ "name": "No Price" }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Name and price are required");

    let resp = server
        .post_json("/api/products", &json!({ "price": 10 }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = server
        .post_json("/api/products", &json!({ "name": "Negative", "price": -1 }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Price cannot be negative");

    assert!(server.products().await.is_empty());
}

#[tokio::test]
async fn test_malformed_body_gets_error_shape() {
    let server = TestServer::spawn_empty().await;

    let resp = server
        .client
        .post(server.url("/api/products"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid request body");
    assert!(body["message"].is_string());
}

//! Integration tests for checkout and order queries.

use reqwest::StatusCode;
use serde_json::{Value, json};

use cartwheel_integration_tests::{TestServer, error_of};

async fn stock_of(server: &TestServer, id: &str) -> u64 {
    server.product(id).await["stock"].as_u64().unwrap()
}

#[tokio::test]
async fn test_checkout_places_order_and_takes_stock() {
    let server = TestServer::spawn_empty().await;
    let kettle = server.create_product("Kettle", 25.0, 5).await;
    let tea = server.create_product("Tea", 7.5, 40).await;

    // Something in the cart so clearing is observable
    server
        .post_json("/api/cart", &json!({ "productId": kettle, "quantity": 1, "userId": "gina" }))
        .await;

    let resp = server.checkout("gina", &[(kettle.as_str(), 2), (tea.as_str(), 4)]).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Order placed successfully");

    let receipt = &body["receipt"];
    assert!(receipt["orderId"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(receipt["customer"]["name"], "Ada Lovelace");
    assert_eq!(receipt["total"], json!(80.0));
    assert_eq!(receipt["status"], "confirmed");
    assert_eq!(receipt["items"][0]["name"], "Kettle");
    assert_eq!(receipt["items"][1]["quantity"], 4);
    assert!(receipt["timestamp"].is_string());

    assert_eq!(stock_of(&server, &kettle).await, 3);
    assert_eq!(stock_of(&server, &tea).await, 36);

    let cart: Value = server.get("/api/cart?userId=gina").await.json().await.unwrap();
    assert_eq!(cart["items"], json!([]));
}

#[tokio::test]
async fn test_checkout_accepts_product_id_field() {
    let server = TestServer::spawn_empty().await;
    let soap = server.create_product("Soap", 3.0, 10).await;

    let resp = server
        .post_json(
            "/api/checkout",
            &json!({
                "customer": { "name": "Hal", "email": "hal@example.com" },
                "cartItems": [{ "productId": soap, "quantity": 2 }],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(stock_of(&server, &soap).await, 8);
}

#[tokio::test]
async fn test_checkout_validation() {
    let server = TestServer::spawn_empty().await;
    let brush = server.create_product("Brush", 9.0, 10).await;

    let resp = server.checkout("ivy", &[]).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Cart is empty");

    let resp = server.checkout("ivy", &[(brush.as_str(), 0)]).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Quantity must be at least 1");

    let resp = server
        .post_json(
            "/api/checkout",
            &json!({ "cartItems": [{ "id": brush, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Customer name and email are required");

    assert_eq!(stock_of(&server, &brush).await, 10);
}

#[tokio::test]
async fn test_checkout_null_or_missing_items_is_empty_cart() {
    let server = TestServer::spawn_empty().await;
    let customer = json!({ "name": "Ivy", "email": "ivy@example.com" });

    for body in [
        json!({ "customer": customer, "cartItems": null }),
        json!({ "customer": customer }),
    ] {
        let resp = server.post_json("/api/checkout", &body).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Cart is empty" }));
    }
}

#[tokio::test]
async fn test_oversized_price_is_rejected_up_front() {
    let server = TestServer::spawn_empty().await;

    let resp = server
        .post_json("/api/products", &json!({ "name": "Vault", "price": 1e13, "stock": 5 }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Price is too large");
    assert!(server.products().await.is_empty());
}

#[tokio::test]
async fn test_failed_checkout_leaves_stock_unchanged() {
    let server = TestServer::spawn_empty().await;
    let chair = server.create_product("Chair", 45.0, 4).await;
    let table = server.create_product("Table", 120.0, 1).await;

    let resp = server.checkout("jack", &[(chair.as_str(), 3), (table.as_str(), 2)]).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Insufficient stock for Table");

    let unknown = "00000000-0000-4000-8000-000000000000";
    let resp = server.checkout("jack", &[(chair.as_str(), 1), (unknown, 1)]).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(resp).await, format!("Product {unknown} not found"));

    assert_eq!(stock_of(&server, &chair).await, 4);
    assert_eq!(stock_of(&server, &table).await, 1);

    let orders: Vec<Value> = server.get("/api/checkout/orders").await.json().await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_concurrent_checkouts_never_oversell() {
    let server = TestServer::spawn_empty().await;
    let ticket = server.create_product("Concert Ticket", 50.0, 5).await;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..12 {
        let client = server.client.clone();
        let url = server.url("/api/checkout");
        let body = json!({
            "customer": { "name": format!("Fan {i}"), "email": format!("fan{i}@example.com") },
            "cartItems": [{ "id": ticket, "quantity": 1 }],
            "userId": format!("fan-{i}"),
        });
        tasks.spawn(async move { client.post(url).json(&body).send().await.unwrap().status() });
    }
    let statuses = tasks.join_all().await;

    let placed = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    let rejected = statuses
        .iter()
        .filter(|s| **s == StatusCode::BAD_REQUEST)
        .count();
    assert_eq!(placed, 5);
    assert_eq!(rejected, 7);
    assert_eq!(stock_of(&server, &ticket).await, 0);

    let orders: Vec<Value> = server.get("/api/checkout/orders").await.json().await.unwrap();
    assert_eq!(orders.len(), 5);
}

#[tokio::test]
async fn test_order_queries() {
    let server = TestServer::spawn_empty().await;
    let map = server.create_product("Map", 15.0, 10).await;

    let mut placed = Vec::new();
    for _ in 0..3 {
        let body: Value = server.checkout("kim", &[(map.as_str(), 1)]).await.json().await.unwrap();
        placed.push(body["receipt"]["orderId"].as_str().unwrap().to_string());
    }

    let orders: Vec<Value> = server.get("/api/checkout/orders").await.json().await.unwrap();
    let listed: Vec<&str> = orders
        .iter()
        .map(|o| o["orderId"].as_str().unwrap())
        .collect();
    assert_eq!(listed, vec![placed[2].as_str(), placed[1].as_str(), placed[0].as_str()]);

    let resp = server
        .get(&format!("/api/checkout/orders/{}", placed[1]))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["orderId"], placed[1].as_str());
    assert_eq!(order["customer"]["email"], "ada@example.com");
    assert_eq!(order["total"], json!(15.0));

    let resp = server.get("/api/checkout/orders/ORD-0-NOTANORDER").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(resp).await, "Order not found");
}

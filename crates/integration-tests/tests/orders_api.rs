//! Integration tests for placing and managing orders.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use tajine_house_integration_tests::{TestApp, customer, error_message, json_body};

// ============================================================================
// Placing orders
// ============================================================================

#[tokio::test]
async fn test_place_order_recomputes_totals() {
    let app = TestApp::spawn().await;

    // The client claims a total of 1.00; the server prices the items itself.
    let resp = app
        .post_json(
            "/api/orders",
            &json!({
                "order": {
                    "subtotal": "1.00",
                    "deliveryFee": "0.00",
                    "tax": "0.00",
                    "total": "1.00",
                    "firstName": "Amina",
                    "lastName": "Benali",
                    "email": "amina@example.com",
                    "phone": "0612345678",
                    "address": "12 Rue des Oliviers",
                    "city": "Lyon",
                    "zipCode": "69001",
                    "deliveryOption": "delivery",
                    "deliveryTime": "19:30",
                    "paymentMethod": "cash",
                },
                "items": [
                    { "id": 2, "name": "Tajine d'agneau", "price": 24.5, "quantity": 2 },
                    { "id": 3, "name": "Pastilla au poulet", "price": 15.5, "quantity": 2 },
                ],
            }),
        )
        .await;

    assert_eq!(resp.status(), 201);
    let body = json_body(resp).await;
    assert_eq!(body["message"], "Order placed successfully");
    assert_eq!(body["orderId"], 1);
    assert_eq!(body["order"]["subtotal"], "80.00");
    assert_eq!(body["order"]["deliveryFee"], "5.60");
    assert_eq!(body["order"]["total"], "85.60");
    assert_eq!(body["order"]["status"], "pending");
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_below_minimum_is_refused() {
    let app = TestApp::spawn().await;

    let resp = app
        .place_order(json!([
            { "id": 6, "name": "Moroccan Mint Tea", "price": "5.95", "quantity": 2 },
        ]))
        .await;

    assert_eq!(resp.status(), 400);
    assert_eq!(
        error_message(resp).await,
        "minimum order is $80.00; add $68.10 more to check out"
    );
}

#[tokio::test]
async fn test_invalid_checkouts_are_refused() {
    let app = TestApp::spawn().await;

    let resp = app.place_order(json!([])).await;
    assert_eq!(resp.status(), 400);
    assert_eq!(error_message(resp).await, "your cart is empty");

    let mut form = customer();
    form["phone"] = json!("");
    form["zipCode"] = json!("");
    let resp = app
        .post_json(
            "/api/orders",
            &json!({
                "order": form,
                "items": [{ "id": 5, "name": "Seafood Tagine", "price": "26.50", "quantity": 4 }],
            }),
        )
        .await;
    assert_eq!(resp.status(), 400);
    assert_eq!(
        error_message(resp).await,
        "missing required fields: phone, zipCode"
    );

    let resp = app
        .client
        .post(app.url("/api/orders"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

// ============================================================================
// Looking up orders
// ============================================================================

#[tokio::test]
async fn test_get_order_is_public() {
    let app = TestApp::spawn().await;
    let id = app.place_valid_order().await;

    let resp = app.get(&format!("/api/orders/{id}")).await;
    assert_eq!(resp.status(), 200);
    let body = json_body(resp).await;
    assert_eq!(body["order"]["id"], id);
    assert_eq!(body["order"]["total"], "105.82");
    assert_eq!(body["items"][0]["name"], "Couscous Royal");
    assert_eq!(body["items"][0]["orderId"], id);

    let resp = app.get("/api/orders/999").await;
    assert_eq!(resp.status(), 404);
    assert_eq!(error_message(resp).await, "Order not found");

    let resp = app.get("/api/orders/abc").await;
    assert_eq!(resp.status(), 400);
    assert_eq!(error_message(resp).await, "Invalid order ID");
}

#[tokio::test]
async fn test_item_snapshot_survives_menu_edit() {
    let app = TestApp::spawn().await;
    let id = app.place_valid_order().await;

    app.login_admin().await;
    let resp = app
        .put_json("/api/menu-items/1", &json!({ "price": "30.00", "name": "Couscous Deluxe" }))
        .await;
    assert_eq!(resp.status(), 200);

    let body = json_body(app.get(&format!("/api/orders/{id}")).await).await;
    assert_eq!(body["items"][0]["name"], "Couscous Royal");
    assert_eq!(body["items"][0]["price"], "22.95");
}

// ============================================================================
// Admin order management
// ============================================================================

#[tokio::test]
async fn test_admin_endpoints_require_login() {
    let app = TestApp::spawn().await;
    let id = app.place_valid_order().await;

    let resp = app.get("/api/orders").await;
    assert_eq!(resp.status(), 401);
    assert_eq!(error_message(resp).await, "Unauthorized");

    let resp = app
        .put_json(&format!("/api/orders/{id}/status"), &json!({ "status": "confirmed" }))
        .await;
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_status_lifecycle() {
    let app = TestApp::spawn().await;
    let id = app.place_valid_order().await;
    app.login_admin().await;
    let path = format!("/api/orders/{id}/status");

    let resp = app.put_json(&path, &json!({ "status": "preparing" })).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(json_body(resp).await["status"], "preparing");

    // Moving backwards is refused.
    let resp = app.put_json(&path, &json!({ "status": "confirmed" })).await;
    assert_eq!(resp.status(), 409);

    let resp = app.put_json(&path, &json!({ "status": "delivered" })).await;
    assert_eq!(resp.status(), 200);

    // Delivered is terminal.
    let resp = app.put_json(&path, &json!({ "status": "cancelled" })).await;
    assert_eq!(resp.status(), 409);

    let resp = app.put_json(&path, &json!({ "status": "shipped" })).await;
    assert_eq!(resp.status(), 400);

    let resp = app.put_json(&path, &json!({})).await;
    assert_eq!(resp.status(), 400);
    assert_eq!(error_message(resp).await, "Status is required");

    let resp = app
        .put_json("/api/orders/999/status", &json!({ "status": "confirmed" }))
        .await;
    assert_eq!(resp.status(), 404);
    assert_eq!(error_message(resp).await, "Order not found");
}

#[tokio::test]
async fn test_list_orders_with_filters() {
    let app = TestApp::spawn().await;
    let first = app.place_valid_order().await;
    let second = app.place_valid_order().await;
    app.login_admin().await;

    let resp = app
        .put_json(&format!("/api/orders/{first}/status"), &json!({ "status": "cancelled" }))
        .await;
    assert_eq!(resp.status(), 200);

    let all = json_body(app.get("/api/orders").await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    // Orders carry their items inline.
    assert_eq!(all[0]["items"].as_array().unwrap().len(), 2);

    let active = json_body(app.get("/api/orders?status=active").await).await;
    let active = active.as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["id"], second);

    let cancelled = json_body(app.get("/api/orders?status=cancelled").await).await;
    assert_eq!(cancelled[0]["id"], first);

    let resp = app.get("/api/orders?status=lost").await;
    assert_eq!(resp.status(), 400);
}

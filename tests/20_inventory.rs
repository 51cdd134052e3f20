mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn batch_applies_items_in_order_and_floors_at_zero() {
    let app = TestApp::new().await;
    let store = app.active_store("inv-order").await;
    let product = app.create_product(&store.admin_token, "Mug", "12.00", 10).await;

    let res = app
        .post(
            "/api/inventory/adjust",
            &store.admin_token,
            json!({ "items": [
                { "product_id": product, "adjustment_type": "decrease", "quantity": 4, "reason": "damaged" },
                { "product_id": product, "adjustment_type": "increase", "quantity": 1 },
                { "product_id": product, "adjustment_type": "set", "quantity": 20 },
                { "product_id": product, "adjustment_type": "decrease", "quantity": 50 },
            ]}),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let steps: Vec<(i64, i64, i64)> = res.data()["adjustments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| {
            (
                a["quantity_before"].as_i64().unwrap(),
                a["quantity_after"].as_i64().unwrap(),
                a["quantity_change"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(steps, vec![(10, 6, -4), (6, 7, 1), (7, 20, 13), (20, 0, -20)]);

    let history = app
        .get(&format!("/api/inventory/history?product_id={}", product), &store.admin_token)
        .await;
    let rows = history.data().as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["quantity_after"], 0);
    assert_eq!(rows[3]["reason"], "damaged");

    let shown = app.get(&format!("/api/products/{}", product), &store.admin_token).await;
    assert_eq!(shown.data()["stock_quantity"], 0);
}

#[tokio::test]
async fn variant_changes_resync_parent_stock() {
    let app = TestApp::new().await;
    let store = app.active_store("inv-variants").await;
    let product = app.create_product(&store.admin_token, "Shirt", "20.00", 0).await;

    let mut variants = Vec::new();
    for (name, stock) in [("Small", 3), ("Large", 4)] {
        let res = app
            .post(
                &format!("/api/products/{}/variants", product),
                &store.admin_token,
                json!({ "name": name, "stock_quantity": stock }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        variants.push(res.data()["id"].as_str().unwrap().to_string());
    }

    let shown = app.get(&format!("/api/products/{}", product), &store.admin_token).await;
    assert_eq!(shown.data()["stock_quantity"], 7);
    assert_eq!(shown.data()["variants"].as_array().unwrap().len(), 2);

    let res = app
        .post(
            "/api/inventory/adjust",
            &store.admin_token,
            json!({ "items": [{ "variant_id": variants[0], "adjustment_type": "increase", "quantity": 5 }] }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let synced = &res.data()["synced_products"][0];
    assert_eq!(synced["product_id"], product.as_str());
    assert_eq!(synced["stock_quantity"], 12);

    let shown = app.get(&format!("/api/products/{}", product), &store.admin_token).await;
    assert_eq!(shown.data()["stock_quantity"], 12);
}

#[tokio::test]
async fn unknown_target_fails_the_whole_batch() {
    let app = TestApp::new().await;
    let store = app.active_store("inv-atomic").await;
    let product = app.create_product(&store.admin_token, "Lamp", "40.00", 8).await;

    let res = app
        .post(
            "/api/inventory/adjust",
            &store.admin_token,
            json!({ "items": [
                { "product_id": product, "adjustment_type": "increase", "quantity": 2 },
                { "product_id": uuid::Uuid::new_v4(), "adjustment_type": "increase", "quantity": 2 },
            ]}),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND, "{}", res.body);

    let shown = app.get(&format!("/api/products/{}", product), &store.admin_token).await;
    assert_eq!(shown.data()["stock_quantity"], 8);
    let history = app.get("/api/inventory/history", &store.admin_token).await;
    assert!(history.data().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_batches_are_rejected() {
    let app = TestApp::new().await;
    let store = app.active_store("inv-invalid").await;
    let product = app.create_product(&store.admin_token, "Pen", "1.00", 1).await;

    let too_many: Vec<_> = (0..11)
        .map(|_| json!({ "product_id": product, "adjustment_type": "increase", "quantity": 1 }))
        .collect();
    let cases = vec![
        json!({ "items": [] }),
        json!({ "items": [{ "adjustment_type": "increase", "quantity": 1 }] }),
        json!({ "items": [{ "product_id": product, "adjustment_type": "set", "quantity": -1 }] }),
        json!({ "items": too_many }),
        json!({ "items": [{ "product_id": product, "adjustment_type": "set", "quantity": i32::MAX }] }),
    ];
    for body in cases {
        let res = app.post("/api/inventory/adjust", &store.admin_token, body.clone()).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{} -> {}", body, res.body);
    }
}

#[tokio::test]
async fn stock_totals_stay_within_limits() {
    let app = TestApp::new().await;
    let store = app.active_store("inv-limits").await;

    let res = app
        .post(
            "/api/products",
            &store.admin_token,
            json!({ "name": "Bulk", "price": "1.00", "stock_quantity": 2_000_000_000 }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let product = app.create_product(&store.admin_token, "Poster", "9.00", 0).await;
    let mut variants = Vec::new();
    for name in ["A", "B", "C"] {
        let res = app
            .post(
                &format!("/api/products/{}/variants", product),
                &store.admin_token,
                json!({ "name": name, "stock_quantity": 1 }),
            )
            .await;
        variants.push(res.data()["id"].as_str().unwrap().to_string());
    }

    let items: Vec<_> = variants
        .iter()
        .map(|id| json!({ "variant_id": id, "adjustment_type": "set", "quantity": 1_000_000_000 }))
        .collect();
    let res = app
        .post("/api/inventory/adjust", &store.admin_token, json!({ "items": items }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST, "{}", res.body);

    let shown = app.get(&format!("/api/products/{}", product), &store.admin_token).await;
    assert_eq!(shown.data()["stock_quantity"], 3);
    let history = app.get("/api/inventory/history", &store.admin_token).await;
    assert!(history.data().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn low_stock_alert_only_when_a_product_drops_to_threshold() {
    let app = TestApp::new().await;
    let store = app.active_store("inv-alerts").await;
    let product = app.create_product(&store.admin_token, "Cap", "15.00", 0).await;
    let res = app
        .post(
            &format!("/api/products/{}/variants", product),
            &store.admin_token,
            json!({ "name": "One size", "stock_quantity": 2 }),
        )
        .await;
    let variant = res.data()["id"].as_str().unwrap().to_string();

    let low_alerts = |body: &serde_json::Value| {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|n| n["kind"] == "inventory")
            .count()
    };

    // Parent was already low, so a further drop is not news
    app.post(
        "/api/inventory/adjust",
        &store.admin_token,
        json!({ "items": [{ "variant_id": variant, "adjustment_type": "decrease", "quantity": 1 }] }),
    )
    .await;
    let notes = app.get("/api/notifications", &store.admin_token).await;
    assert_eq!(low_alerts(&notes.body), 0);

    for (kind, quantity) in [("set", 50), ("set", 1)] {
        app.post(
            "/api/inventory/adjust",
            &store.admin_token,
            json!({ "items": [{ "variant_id": variant, "adjustment_type": kind, "quantity": quantity }] }),
        )
        .await;
    }
    let notes = app.get("/api/notifications", &store.admin_token).await;
    assert_eq!(low_alerts(&notes.body), 1);
}

#[tokio::test]
async fn low_stock_lists_products_at_threshold() {
    let app = TestApp::new().await;
    let store = app.active_store("inv-low").await;
    let low = app.create_product(&store.admin_token, "Rare", "5.00", 5).await;
    app.create_product(&store.admin_token, "Plenty", "5.00", 50).await;

    let res = app.get("/api/inventory/low-stock", &store.admin_token).await;
    let ids: Vec<_> = res.data().as_array().unwrap().iter().map(|p| p["id"].as_str().unwrap().to_string()).collect();
    assert_eq!(ids, vec![low]);
}

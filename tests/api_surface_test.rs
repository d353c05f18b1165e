mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use logistics_api as api;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;
use tower::util::ServiceExt;
use uuid::Uuid;

async fn spawn_router() -> (Router, common::TestApp) {
    let app = common::spawn_services(true).await;
    let cfg = api::config::AppConfig::new(
        "sqlite::memory:".into(),
        "127.0.0.1".into(),
        0,
        "test".into(),
    );
    let state = api::AppState {
        db: app.db.clone(),
        config: cfg,
        event_sender: app.event_sender.clone(),
        services: app.services.clone(),
    };
    let router = Router::new()
        .nest("/api/v1", api::api_v1_routes())
        .with_state(state);
    (router, app)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn patch_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn decimal_field(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal serialized as string")).unwrap()
}

#[tokio::test]
async fn items_can_be_created_and_searched() {
    let (router, _app) = spawn_router().await;

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/items",
            json!({"sku": "PAL-4040", "name": "Euro pallet 40x40"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Duplicate SKU is rejected
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/items",
            json!({"sku": "PAL-4040", "name": "Duplicate"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .clone()
        .oneshot(get("/api/v1/items?q=pal"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"].as_str().unwrap(), id);
    assert_eq!(items[0]["unit"], "pcs");

    let response = router
        .oneshot(get(&format!("/api/v1/items/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn movement_endpoint_validates_its_input() {
    let (router, _app) = spawn_router().await;
    let warehouse = Uuid::new_v4();
    let item = Uuid::new_v4();

    for (bad_type, bad_quantity) in [("sideways", 5), ("in", 0), ("out", -2)] {
        let response = router
            .clone()
            .oneshot(post_json(
                "/api/v1/inventory/move",
                json!({
                    "type": bad_type,
                    "warehouse_id": warehouse,
                    "item_id": item,
                    "quantity": bad_quantity,
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Bad Request");
    }
}

#[tokio::test]
async fn movement_and_stock_lookup_round_trip() {
    let (router, _app) = spawn_router().await;
    let warehouse = Uuid::new_v4();
    let item = Uuid::new_v4();

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/inventory/move",
            json!({
                "type": "in",
                "warehouse_id": warehouse,
                "item_id": item,
                "quantity": 25,
                "reference": "PO-118",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(decimal_field(&body["data"]["quantity"]), dec!(25));

    let response = router
        .clone()
        .oneshot(get(&format!(
            "/api/v1/inventory/stock?warehouse_id={}&item_id={}",
            warehouse, item
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(decimal_field(&body["data"][0]["quantity"]), dec!(25));

    let response = router
        .oneshot(get("/api/v1/inventory/movements"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn stock_lookup_for_untouched_pair_returns_zero() {
    let (router, _app) = spawn_router().await;

    let response = router
        .oneshot(get(&format!(
            "/api/v1/inventory/stock?warehouse_id={}&item_id={}",
            Uuid::new_v4(),
            Uuid::new_v4()
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(decimal_field(&body["data"][0]["quantity"]), Decimal::ZERO);
}

#[tokio::test]
async fn shipment_status_endpoint_maps_errors_to_status_codes() {
    let (router, _app) = spawn_router().await;

    // Unknown shipment id
    let response = router
        .clone()
        .oneshot(patch_json(
            &format!("/api/v1/shipments/{}/status", Uuid::new_v4()),
            json!({"status": "picked"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Create a shipment to transition
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/shipments",
            json!({
                "shipment_no": "SHP-HTTP-1",
                "origin_warehouse_id": Uuid::new_v4(),
                "destination_name": "Customer X",
                "items": [{"item_id": Uuid::new_v4(), "quantity": 2}],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Unknown status value
    let response = router
        .clone()
        .oneshot(patch_json(
            &format!("/api/v1/shipments/{}/status", id),
            json!({"status": "flying"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Forward jump is an invalid transition
    let response = router
        .clone()
        .oneshot(patch_json(
            &format!("/api/v1/shipments/{}/status", id),
            json!({"status": "delivered"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The permitted transition succeeds and reports the moved lines
    let response = router
        .clone()
        .oneshot(patch_json(
            &format!("/api/v1/shipments/{}/status", id),
            json!({"status": "picked"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "picked");
    assert_eq!(body["data"]["movements"].as_array().unwrap().len(), 1);

    // Re-submitting the same status is rejected
    let response = router
        .clone()
        .oneshot(patch_json(
            &format!("/api/v1/shipments/{}/status", id),
            json!({"status": "picked"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Shipment body reflects the applied transition
    let response = router
        .oneshot(get(&format!("/api/v1/shipments/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "picked");
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn shipment_creation_validates_lines() {
    let (router, _app) = spawn_router().await;

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/shipments",
            json!({
                "shipment_no": "SHP-EMPTY",
                "origin_warehouse_id": Uuid::new_v4(),
                "items": [],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .oneshot(post_json(
            "/api/v1/shipments",
            json!({
                "shipment_no": "SHP-ZERO",
                "origin_warehouse_id": Uuid::new_v4(),
                "items": [{"item_id": Uuid::new_v4(), "quantity": 0}],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_status_respond() {
    let (router, _app) = spawn_router().await;

    let response = router.clone().oneshot(get("/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["checks"]["database"], "healthy");

    let response = router.oneshot(get("/api/v1/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

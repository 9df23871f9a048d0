//! Integration tests for the legacy `/legacy/dispatch` endpoint.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, build_test_app, create_dashboard, get, send_as, LEGACY_TOKEN, TEST_USER};
use pulseboard_db::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn dispatch(store: &Arc<MemoryStore>, body: Value) -> (StatusCode, Value) {
    let response = send_as(
        build_test_app(Arc::clone(store)),
        Method::POST,
        "/legacy/dispatch",
        None,
        Some(body),
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

fn request(operation: &str, payload: Value) -> Value {
    json!({
        "operation": operation,
        "payload": payload,
        "token": LEGACY_TOKEN,
        "user_id": TEST_USER
    })
}

#[tokio::test]
async fn wrong_token_returns_403() {
    let store = Arc::new(MemoryStore::new());
    let mut body = request("get_user_dashboards", Value::Null);
    body["token"] = json!("guess");

    let (status, json) = dispatch(&store, body).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["ok"], false);
}

#[tokio::test]
async fn unknown_operation_fails_with_200() {
    let store = Arc::new(MemoryStore::new());

    let (status, json) = dispatch(&store, request("drop_tables", Value::Null)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], false);
    assert!(json["message"].as_str().unwrap().contains("Unknown operation"));
}

#[tokio::test]
async fn missing_user_id_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let mut body = request("get_user_dashboards", Value::Null);
    body.as_object_mut().unwrap().remove("user_id");

    let (status, json) = dispatch(&store, body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], false);
}

#[tokio::test]
async fn malformed_envelope_fails_with_200() {
    let store = Arc::new(MemoryStore::new());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/legacy/dispatch")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = build_test_app(store).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ok"], false);
}

#[tokio::test]
async fn save_dashboard_is_visible_through_the_rest_api() {
    let store = Arc::new(MemoryStore::new());

    let (status, json) = dispatch(
        &store,
        request("save_dashboard", json!({ "name": "From legacy" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    let id = json["data"]["id"].as_i64().unwrap();

    let response = get(build_test_app(store), &format!("/api/v1/dashboards/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["dashboard"]["name"], "From legacy");
}

#[tokio::test]
async fn widget_lifecycle_through_legacy_operations() {
    let store = Arc::new(MemoryStore::new());
    let dashboard_id = create_dashboard(&store, "Main").await;

    let (_, saved) = dispatch(
        &store,
        request(
            "save_widget",
            json!({ "dashboard_id": dashboard_id, "widget_type": "data", "title": "Orders" }),
        ),
    )
    .await;
    assert_eq!(saved["ok"], true);
    let widget_id = saved["data"]["widget"]["id"].as_i64().unwrap();

    let (_, moved) = dispatch(
        &store,
        request(
            "update_widget_position",
            json!({ "id": widget_id, "x": 5, "y": 6, "width": 320, "height": 240 }),
        ),
    )
    .await;
    assert_eq!(moved["ok"], true);
    assert_eq!(moved["data"]["position"]["x"], 5);

    let (_, fetched) = dispatch(&store, request("get_widget", json!({ "id": widget_id }))).await;
    assert_eq!(fetched["ok"], true);
    assert_eq!(fetched["data"]["widget"]["title"], "Orders");

    let (_, refreshed) =
        dispatch(&store, request("refresh_widget", json!({ "id": widget_id }))).await;
    assert_eq!(refreshed["ok"], false);
    assert_eq!(refreshed["message"], "No webhook URL configured");

    let (_, deleted) =
        dispatch(&store, request("delete_widget", json!({ "id": widget_id }))).await;
    assert_eq!(deleted["ok"], true);

    let (_, gone) = dispatch(&store, request("get_widget", json!({ "id": widget_id }))).await;
    assert_eq!(gone["ok"], false);
    assert_eq!(gone["message"], format!("Widget with id {widget_id} not found"));
}

#[tokio::test]
async fn invalid_payload_names_the_operation() {
    let store = Arc::new(MemoryStore::new());

    let (_, json) = dispatch(&store, request("delete_dashboard", json!({ "id": "seven" }))).await;

    assert_eq!(json["ok"], false);
    assert!(json["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid payload for delete_dashboard"));
}

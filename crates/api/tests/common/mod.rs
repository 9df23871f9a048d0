use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use pulseboard_core::types::DbId;
use pulseboard_db::MemoryStore;
use pulseboard_webhook::{WebhookClient, WebhookClientConfig};
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use pulseboard_api::config::ServerConfig;
use pulseboard_api::middleware::auth::USER_ID_HEADER;
use pulseboard_api::routes;
use pulseboard_api::state::AppState;

/// User id sent by the request helpers.
pub const TEST_USER: DbId = 1;

/// Shared secret accepted by the legacy endpoint in tests.
pub const LEGACY_TOKEN: &str = "test-legacy-token";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 10,
        database_url: None,
        legacy_api_token: LEGACY_TOKEN.to_string(),
        webhook_timeout_secs: 5,
        webhook_verify_tls: true,
        upload_dir: std::env::temp_dir().join("pulseboard-api-tests"),
    }
}

/// Build the full application router on top of `store`.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack. Pass the same store to several calls
/// to keep data between requests.
pub fn build_test_app(store: Arc<MemoryStore>) -> Router {
    build_test_app_with(store, test_config())
}

/// Like [`build_test_app`] with a caller-supplied configuration.
pub fn build_test_app_with(store: Arc<MemoryStore>, config: ServerConfig) -> Router {
    let request_timeout = Duration::from_secs(config.request_timeout_secs);
    let webhooks = WebhookClient::new(WebhookClientConfig {
        timeout: Duration::from_secs(config.webhook_timeout_secs),
        verify_tls: config.webhook_verify_tls,
    })
    .unwrap();

    let state = AppState {
        store,
        webhooks: Arc::new(webhooks),
        config: Arc::new(config),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(USER_ID_HEADER),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .merge(routes::legacy::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Send a request as `user` with an optional JSON body.
pub async fn send_as(
    app: Router,
    method: Method,
    uri: &str,
    user: Option<DbId>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send_as(app, Method::GET, uri, Some(TEST_USER), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_as(app, Method::POST, uri, Some(TEST_USER), Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_as(app, Method::PUT, uri, Some(TEST_USER), Some(body)).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response {
    send_as(app, Method::POST, uri, Some(TEST_USER), None).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send_as(app, Method::DELETE, uri, Some(TEST_USER), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a dashboard for [`TEST_USER`] and return its id.
pub async fn create_dashboard(store: &Arc<MemoryStore>, name: &str) -> DbId {
    let response = post_json(
        build_test_app(Arc::clone(store)),
        "/api/v1/dashboards",
        serde_json::json!({ "name": name }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Create a widget from `record` and return its id.
pub async fn create_widget(store: &Arc<MemoryStore>, record: serde_json::Value) -> DbId {
    let response = post_json(build_test_app(Arc::clone(store)), "/api/v1/widgets", record).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["widget"]["id"]
        .as_i64()
        .unwrap()
}

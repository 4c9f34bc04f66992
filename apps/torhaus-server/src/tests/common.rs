//! Common test helpers: app state construction and request plumbing.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::backend::StoreBackend;
use crate::config::ServerConfig;
use crate::server::{router, AppState};
use torhaus_crypto::{TokenHasher, TokenSecret};
use torhaus_store_sqlite::SqliteStore;

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        token_secret: "test-secret".into(),
        admin_token: Some(ADMIN_TOKEN.into()),
        base_url: "http://localhost:8080".into(),
        default_expiry_days: 7,
        rate_limit_window_ms: 60_000,
        rate_limit_max: 1_000,
        email: None,
    }
}

pub async fn create_test_state() -> AppState {
    create_test_state_with(test_config()).await
}

pub async fn create_test_state_with(config: ServerConfig) -> AppState {
    let store = StoreBackend::Sqlite(Arc::new(SqliteStore::open_in_memory().await.unwrap()));
    let hasher = Arc::new(TokenHasher::new(
        TokenSecret::new(config.token_secret.clone()).unwrap(),
    ));
    AppState::new(store, &config, hasher, None).unwrap()
}

/// Run one request through a fresh router over the given state.
pub async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn admin_json(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

pub fn admin_post(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

/// Issue an invite through the staff endpoint; returns (invite id, token).
pub async fn issue_invite(state: &AppState, body: Value) -> (String, String) {
    let (status, response) = send(
        state,
        admin_json(Method::POST, "/api/admin/invites", body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "issue failed: {response}");

    let invite_id = response["inviteId"].as_str().unwrap().to_string();
    let link = response["link"].as_str().unwrap();
    let token = link
        .split_once("token=")
        .expect("link carries the token")
        .1
        .to_string();
    (invite_id, token)
}

pub fn default_invite_body() -> Value {
    json!({ "recipientEmail": "guest@example.com", "formKey": "gesellschaften" })
}

/// Valid reservation form payload; token injected when given.
pub fn reservation_body(token: Option<&str>) -> Value {
    let mut body = json!({
        "firstName": "Anna",
        "lastName": "Beispiel",
        "street": "Hauptstr. 1",
        "postalCode": "21244",
        "city": "Buchholz",
        "phone": "+49 40 1234",
        "email": "anna@example.com",
        "eventDate": "2026-09-12",
        "eventType": "Geburtstag",
        "startTime": "18:00",
        "endTime": "22:30",
        "guestCount": 24,
        "paymentMethod": "invoice",
        "privacyAccepted": true,
        "termsAccepted": true,
        "signature": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg=="
    });
    if let Some(token) = token {
        body["inviteToken"] = json!(token);
    }
    body
}

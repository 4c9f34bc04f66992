//! Invite handler tests.

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::tests::common::*;

#[tokio::test]
async fn staff_endpoints_require_bearer_token() {
    let state = create_test_state().await;

    let (status, _) = send(&state, get("/api/admin/invites")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &state,
        json_request(
            Method::POST,
            "/api/admin/invites",
            default_invite_body(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // wrong token is as good as none
    let request = axum::http::Request::builder()
        .method(Method::GET)
        .uri("/api/admin/invites")
        .header("authorization", "Bearer wrong-token")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = send(&state, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn issued_invite_validates_round_trip() {
    let state = create_test_state().await;
    let (_, token) = issue_invite(&state, default_invite_body()).await;

    let (status, body) = send(
        &state,
        get(&format!("/api/invites/validate?token={token}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], json!(true));
    assert_eq!(body["formKey"], json!("gesellschaften"));
}

#[tokio::test]
async fn issue_requires_recipient() {
    let state = create_test_state().await;
    let (status, body) = send(
        &state,
        admin_json(
            Method::POST,
            "/api/admin/invites",
            json!({ "recipientEmail": "" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("RECIPIENT_REQUIRED"));
}

#[tokio::test]
async fn missing_or_unknown_token_is_invalid() {
    let state = create_test_state().await;

    let (status, body) = send(&state, get("/api/invites/validate")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["valid"], json!(false));
    assert_eq!(body["reason"], json!("invalid"));

    let (status, body) = send(&state, get("/api/invites/validate?token=bogus")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["reason"], json!("invalid"));
}

#[tokio::test]
async fn revoked_invite_reports_revoked() {
    let state = create_test_state().await;
    let (invite_id, token) = issue_invite(&state, default_invite_body()).await;

    let (status, _) = send(
        &state,
        admin_post(&format!("/api/admin/invites/{invite_id}/revoke")),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // revoking again stays fine
    let (status, _) = send(
        &state,
        admin_post(&format!("/api/admin/invites/{invite_id}/revoke")),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &state,
        get(&format!("/api/invites/validate?token={token}")),
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["reason"], json!("revoked"));
}

#[tokio::test]
async fn expired_invite_reports_expired() {
    let state = create_test_state().await;
    let (_, token) = issue_invite(
        &state,
        json!({ "recipientEmail": "guest@example.com", "expiresInDays": -1 }),
    )
    .await;

    let (status, body) = send(
        &state,
        get(&format!("/api/invites/validate?token={token}")),
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["reason"], json!("expired"));
}

#[tokio::test]
async fn resend_mints_a_distinct_link() {
    let state = create_test_state().await;
    let (invite_id, token) = issue_invite(&state, default_invite_body()).await;

    let (status, body) = send(
        &state,
        admin_post(&format!("/api/admin/invites/{invite_id}/resend")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_id = body["inviteId"].as_str().unwrap();
    let new_token = body["link"].as_str().unwrap().split_once("token=").unwrap().1;
    assert_ne!(new_id, invite_id);
    assert_ne!(new_token, token);

    // both invites remain valid
    for t in [token.as_str(), new_token] {
        let (status, body) = send(&state, get(&format!("/api/invites/validate?token={t}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], json!(true));
    }
}

#[tokio::test]
async fn bulk_delete_removes_invites() {
    let state = create_test_state().await;
    let (id_a, token_a) = issue_invite(&state, default_invite_body()).await;
    let (id_b, _) = issue_invite(&state, default_invite_body()).await;

    let (status, body) = send(
        &state,
        admin_json(
            Method::DELETE,
            "/api/admin/invites",
            json!({ "ids": [id_a, id_b] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], json!(2));

    let (status, _) = send(
        &state,
        get(&format!("/api/invites/validate?token={token_a}")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_surfaces_granular_state() {
    let state = create_test_state().await;
    let (active_id, _) = issue_invite(&state, default_invite_body()).await;
    let (revoked_id, _) = issue_invite(&state, default_invite_body()).await;
    send(
        &state,
        admin_post(&format!("/api/admin/invites/{revoked_id}/revoke")),
    )
    .await;

    let (status, body) = send(&state, admin_get("/api/admin/invites")).await;
    assert_eq!(status, StatusCode::OK);

    let list = body.as_array().unwrap();
    let state_of = |id: &str| {
        list.iter()
            .find(|entry| entry["id"] == json!(id))
            .map(|entry| entry["state"].clone())
            .unwrap()
    };
    assert_eq!(state_of(&active_id), json!("active"));
    assert_eq!(state_of(&revoked_id), json!("revoked"));
}

//! Reservation handler tests.

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::tests::common::*;

#[tokio::test]
async fn reservation_with_token_consumes_the_invite() {
    let state = create_test_state().await;
    let (_, token) = issue_invite(&state, default_invite_body()).await;

    let (status, body) = send(
        &state,
        json_request(
            Method::POST,
            "/api/reservations",
            reservation_body(Some(&token)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    assert!(body["reservationId"].as_str().is_some());

    // the single use is gone now
    let (status, body) = send(
        &state,
        get(&format!("/api/invites/validate?token={token}")),
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["reason"], json!("used"));
}

#[tokio::test]
async fn second_submission_on_single_use_token_is_rejected() {
    let state = create_test_state().await;
    let (_, token) = issue_invite(&state, default_invite_body()).await;

    let (status, _) = send(
        &state,
        json_request(
            Method::POST,
            "/api/reservations",
            reservation_body(Some(&token)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &state,
        json_request(
            Method::POST,
            "/api/reservations",
            reservation_body(Some(&token)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], json!("TOKEN_USED"));
    // guests get the collapsed notice, not the specific precondition
    assert!(body["message"].as_str().unwrap().contains("Einladung"));
}

#[tokio::test]
async fn multi_use_invite_admits_its_quota_exactly() {
    let state = create_test_state().await;
    let (_, token) = issue_invite(
        &state,
        json!({ "recipientEmail": "guest@example.com", "maxUses": 3 }),
    )
    .await;

    for i in 0..3 {
        let mut body = reservation_body(Some(&token));
        body["email"] = json!(format!("guest{i}@example.com"));
        let (status, response) =
            send(&state, json_request(Method::POST, "/api/reservations", body)).await;
        assert_eq!(status, StatusCode::CREATED, "attempt {i} failed: {response}");
    }

    let (status, body) = send(
        &state,
        json_request(
            Method::POST,
            "/api/reservations",
            reservation_body(Some(&token)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], json!("TOKEN_USED"));
}

#[tokio::test]
async fn unknown_token_maps_to_not_found() {
    let state = create_test_state().await;
    let (status, body) = send(
        &state,
        json_request(
            Method::POST,
            "/api/reservations",
            reservation_body(Some("bogus-token")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("TOKEN_INVALID"));
}

#[tokio::test]
async fn reservation_without_token_is_accepted() {
    let state = create_test_state().await;
    let (status, body) = send(
        &state,
        json_request(Method::POST, "/api/reservations", reservation_body(None)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
}

#[tokio::test]
async fn validation_errors_name_their_fields() {
    let state = create_test_state().await;
    let mut body = reservation_body(None);
    body["guestCount"] = json!(0);
    body["termsAccepted"] = json!(false);
    body["email"] = json!("not-an-email");

    let (status, response) =
        send(&state, json_request(Method::POST, "/api/reservations", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], json!("VALIDATION_ERROR"));

    let fields: Vec<&str> = response["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    for field in ["guestCount", "termsAccepted", "email"] {
        assert!(fields.contains(&field), "missing {field} in {fields:?}");
    }
}

#[tokio::test]
async fn unknown_payment_method_is_a_validation_error() {
    let state = create_test_state().await;
    let mut body = reservation_body(None);
    body["paymentMethod"] = json!("goldbarren");

    let (status, response) =
        send(&state, json_request(Method::POST, "/api/reservations", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn legacy_contact_shape_is_accepted() {
    let state = create_test_state().await;
    let body = json!({
        "guestName": "B. Müller",
        "email": "bm@example.com",
        "eventDate": "2026-09-12",
        "eventType": "Geburtstag",
        "startTime": "18:00",
        "guestCount": 12,
        "paymentMethod": "cash",
        "privacyAccepted": true,
        "termsAccepted": true,
        "signature": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg=="
    });

    let (status, response) =
        send(&state, json_request(Method::POST, "/api/reservations", body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {response}");

    let (_, list) = send(&state, admin_get("/api/admin/reservations")).await;
    assert_eq!(list[0]["guestName"], json!("B. Müller"));
}

#[tokio::test]
async fn repeated_submissions_hit_the_rate_limit() {
    let mut config = test_config();
    config.rate_limit_max = 1;
    let state = create_test_state_with(config).await;

    let (status, _) = send(
        &state,
        json_request(Method::POST, "/api/reservations", reservation_body(None)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &state,
        json_request(Method::POST, "/api/reservations", reservation_body(None)),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], json!("RATE_LIMITED"));
}

#[tokio::test]
async fn staff_can_move_a_reservation_through_statuses() {
    let state = create_test_state().await;
    let (status, body) = send(
        &state,
        json_request(Method::POST, "/api/reservations", reservation_body(None)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["reservationId"].as_str().unwrap().to_string();

    let (status, _) = send(
        &state,
        admin_json(
            Method::POST,
            &format!("/api/admin/reservations/{id}/status"),
            json!({ "status": "confirmed" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = send(&state, admin_get("/api/admin/reservations")).await;
    let entry = list
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["id"] == json!(id.as_str()))
        .unwrap();
    assert_eq!(entry["status"], json!("confirmed"));

    let (status, body) = send(
        &state,
        admin_json(
            Method::POST,
            &format!("/api/admin/reservations/{id}/status"),
            json!({ "status": "vanished" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("INVALID_STATUS"));
}

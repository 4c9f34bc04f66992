//! HTTP handlers and the error-to-response mapping.

pub mod invites;
pub mod reservations;
pub mod validate;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use torhaus_core::{InviteError, ReservationError};
use torhaus_storage::StoreError;

/// Guests never learn WHY a token failed; staff tooling reads the invite
/// state from the admin listing instead.
const TOKEN_FAILURE_MESSAGE: &str = "Diese Einladung ist ungültig oder nicht mehr aktiv.";

pub enum ApiError {
    Unauthorized,
    RateLimited,
    BadRequest(&'static str),
    Invite(InviteError),
    Reservation(ReservationError),
    Store(StoreError),
}

impl From<InviteError> for ApiError {
    fn from(e: InviteError) -> Self {
        ApiError::Invite(e)
    }
}

impl From<ReservationError> for ApiError {
    fn from(e: ReservationError) -> Self {
        ApiError::Reservation(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

fn store_response(e: &StoreError) -> Response {
    match e {
        StoreError::NotFound => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": "NOT_FOUND" }))).into_response()
        }
        StoreError::Unavailable(reason) => {
            tracing::warn!(%reason, "storage unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "STORAGE_UNAVAILABLE" })),
            )
                .into_response()
        }
        other => {
            tracing::error!(error = %other, "storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "INTERNAL" })),
            )
                .into_response()
        }
    }
}

fn invite_response(e: &InviteError) -> Response {
    let (status, code) = match e {
        InviteError::TokenInvalid => (StatusCode::NOT_FOUND, "TOKEN_INVALID"),
        InviteError::TokenRevoked => (StatusCode::GONE, "TOKEN_REVOKED"),
        InviteError::TokenExpired => (StatusCode::GONE, "TOKEN_EXPIRED"),
        InviteError::TokenExhausted => (StatusCode::GONE, "TOKEN_USED"),
        InviteError::NoRecipient => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "NO_RECIPIENT" })),
            )
                .into_response()
        }
        InviteError::Store(e) => return store_response(e),
    };
    (
        status,
        Json(json!({ "error": code, "message": TOKEN_FAILURE_MESSAGE })),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "UNAUTHORIZED" })),
            )
                .into_response(),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": "RATE_LIMITED" })),
            )
                .into_response(),
            ApiError::BadRequest(code) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": code }))).into_response()
            }
            ApiError::Invite(e) => invite_response(&e),
            ApiError::Reservation(ReservationError::Validation(issues)) => {
                let details: Vec<_> = issues
                    .iter()
                    .map(|i| json!({ "field": i.field, "message": i.message }))
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "VALIDATION_ERROR", "details": details })),
                )
                    .into_response()
            }
            ApiError::Reservation(ReservationError::InvalidSignature) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "INVALID_SIGNATURE" })),
            )
                .into_response(),
            ApiError::Reservation(ReservationError::Invite(e)) => invite_response(&e),
            ApiError::Reservation(ReservationError::Store(e)) => store_response(&e),
            ApiError::Store(e) => store_response(&e),
        }
    }
}

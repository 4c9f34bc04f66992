//! Public token validation endpoint.
//!
//! Read-only: checking a token never consumes a use. The status mapping
//! (404 for unknown, 410 for dead) is deployment policy, not lifecycle
//! semantics.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use torhaus_core::{InvalidReason, InviteValidation};

use crate::handlers::ApiError;
use crate::metrics;
use crate::server::AppState;

#[derive(Deserialize)]
pub struct ValidateQuery {
    pub token: Option<String>,
}

pub async fn validate_invite(
    State(state): State<AppState>,
    Query(query): Query<ValidateQuery>,
) -> Response {
    let token = query.token.unwrap_or_default();

    match state.invites.validate(&token).await {
        Ok(InviteValidation::Valid { form_key, .. }) => {
            metrics::record_validation("valid");
            (
                StatusCode::OK,
                Json(json!({ "valid": true, "formKey": form_key })),
            )
                .into_response()
        }
        Ok(InviteValidation::Invalid { reason }) => {
            metrics::record_validation(reason.as_str());
            let status = match reason {
                InvalidReason::Invalid => StatusCode::NOT_FOUND,
                InvalidReason::Expired | InvalidReason::Revoked | InvalidReason::Used => {
                    StatusCode::GONE
                }
            };
            (
                status,
                Json(json!({ "valid": false, "reason": reason.as_str() })),
            )
                .into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

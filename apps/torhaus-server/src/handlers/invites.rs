//! Staff invite handlers: issue, list, revoke, resend, bulk delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use torhaus_audit::{AuditAction, AuditEvent};
use torhaus_core::{Expiry, IssueOptions, IssuedInvite};
use torhaus_storage::{
    CreateEmailLogParams, EmailStatus, InviteId, InviteLink, Store,
};

use crate::handlers::ApiError;
use crate::metrics;
use crate::server::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    pub recipient_email: String,
    #[serde(default = "default_form_key")]
    pub form_key: String,
    /// Omitted: configured default. `0`: never expires.
    pub expires_in_days: Option<i64>,
    pub note: Option<String>,
    pub max_uses: Option<i32>,
}

fn default_form_key() -> String {
    "gesellschaften".to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedInviteResponse {
    pub invite_id: String,
    pub link: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteSummary {
    pub id: String,
    pub form_key: String,
    pub recipient_email: Option<String>,
    pub note: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: i32,
    pub use_count: i32,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by_reservation_id: Option<String>,
    pub is_revoked: bool,
    pub created_at: DateTime<Utc>,
    /// Granular state for staff tooling; guests only ever see a collapsed
    /// failure notice.
    pub state: &'static str,
}

fn invite_state(invite: &InviteLink) -> &'static str {
    if invite.is_revoked {
        "revoked"
    } else if invite.is_expired(Utc::now()) {
        "expired"
    } else if invite.is_exhausted() {
        "used"
    } else {
        "active"
    }
}

fn summarize(invite: &InviteLink) -> InviteSummary {
    InviteSummary {
        id: invite.id.0.to_string(),
        form_key: invite.form_key.clone(),
        recipient_email: invite.recipient_email.clone(),
        note: invite.note.clone(),
        expires_at: invite.expires_at,
        max_uses: invite.max_uses,
        use_count: invite.use_count,
        used_at: invite.used_at,
        used_by_reservation_id: invite
            .used_by_reservation_id
            .as_ref()
            .map(|r| r.0.to_string()),
        is_revoked: invite.is_revoked,
        created_at: invite.created_at,
        state: invite_state(invite),
    }
}

fn expiry_from_days(days: Option<i64>) -> Expiry {
    match days {
        None => Expiry::Default,
        Some(0) => Expiry::Never,
        Some(n) => Expiry::Days(n),
    }
}

pub fn invite_link(base_url: &str, token: &str) -> String {
    format!("{base_url}/request?token={token}")
}

/// Delivery is non-fatal: the invite exists either way, staff can resend.
async fn deliver_invite(state: &AppState, issued: &IssuedInvite, link: &str) {
    let Some(mailer) = &state.mailer else {
        return;
    };
    let Some(recipient) = issued.invite.recipient_email.as_deref() else {
        return;
    };

    let (status, error) = match mailer
        .send_invite(recipient, link, issued.invite.expires_at)
        .await
    {
        Ok(()) => (EmailStatus::Sent, None),
        Err(e) => {
            tracing::warn!(invite = %issued.invite.id.0, error = %e, "invite email delivery failed");
            (EmailStatus::Failed, Some(e.to_string()))
        }
    };
    metrics::record_invite_email(status.as_str());

    if let Err(e) = state
        .store
        .record_email(&CreateEmailLogParams {
            invite_id: Some(issued.invite.id.clone()),
            reservation_id: None,
            recipient: recipient.to_string(),
            subject: "Ihre Einladung zur Reservierungsanfrage".to_string(),
            status,
            error,
        })
        .await
    {
        tracing::warn!(error = %e, "failed to record email log entry");
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<IssuedInviteResponse>), ApiError> {
    if req.recipient_email.trim().is_empty() {
        return Err(ApiError::BadRequest("RECIPIENT_REQUIRED"));
    }

    let issued = state
        .invites
        .issue(IssueOptions {
            form_key: req.form_key,
            created_by_user_id: None,
            recipient_email: Some(req.recipient_email),
            expires: expiry_from_days(req.expires_in_days),
            note: req.note,
            max_uses: req.max_uses.unwrap_or(1),
        })
        .await?;

    let link = invite_link(&state.base_url, &issued.token);
    deliver_invite(&state, &issued, &link).await;

    metrics::record_invite_issued();
    let _ = state
        .audit
        .append(AuditEvent::new(AuditAction::InviteIssue).invite(&issued.invite.id))
        .await;

    Ok((
        StatusCode::CREATED,
        Json(IssuedInviteResponse {
            invite_id: issued.invite.id.0.to_string(),
            link,
        }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<InviteSummary>>, ApiError> {
    let invites = state.invites.list(100).await?;
    Ok(Json(invites.iter().map(summarize).collect()))
}

pub async fn revoke(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let id = InviteId(id);
    state.invites.revoke(&id).await?;
    let _ = state
        .audit
        .append(AuditEvent::new(AuditAction::InviteRevoke).invite(&id))
        .await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn resend(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IssuedInviteResponse>, ApiError> {
    let id = InviteId(id);
    let issued = state.invites.resend(&id, None).await?;

    let link = invite_link(&state.base_url, &issued.token);
    deliver_invite(&state, &issued, &link).await;

    metrics::record_invite_issued();
    let _ = state
        .audit
        .append(
            AuditEvent::new(AuditAction::InviteResend)
                .invite(&issued.invite.id)
                .detail(format!("replaces {}", id.0)),
        )
        .await;

    Ok(Json(IssuedInviteResponse {
        invite_id: issued.invite.id.0.to_string(),
        link,
    }))
}

#[derive(Deserialize)]
pub struct DeleteInvitesRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Serialize)]
pub struct DeleteInvitesResponse {
    pub deleted: u64,
}

pub async fn delete_many(
    State(state): State<AppState>,
    Json(req): Json<DeleteInvitesRequest>,
) -> Result<Json<DeleteInvitesResponse>, ApiError> {
    let ids: Vec<InviteId> = req.ids.into_iter().map(InviteId).collect();
    let deleted = state.invites.bulk_delete(&ids).await?;
    let _ = state
        .audit
        .append(AuditEvent::new(AuditAction::InviteDelete).detail(format!("{deleted} invites")))
        .await;
    Ok(Json(DeleteInvitesResponse { deleted }))
}

//! Reservation handlers: the public intake endpoint plus the staff listing
//! and status workflow.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use torhaus_audit::{AuditAction, AuditEvent};
use torhaus_core::{InviteError, NewReservation, ReservationError, ValidationIssue};
use torhaus_storage::{
    GuestContact, PaymentMethod, Reservation, ReservationId, ReservationStatus, Store,
};

use crate::handlers::ApiError;
use crate::metrics;
use crate::server::AppState;

/// Wire shape of the public form. Carries both contact layouts; which one a
/// submission means is decided by explicit field presence, never by probing
/// defaults.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationForm {
    // structured host contact
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    // legacy single-field contact (older clients)
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,

    pub email: String,
    pub event_date: NaiveDate,
    pub event_type: String,
    pub start_time: String,
    #[serde(default = "default_end_time")]
    pub end_time: String,
    pub guest_count: i32,
    pub payment_method: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub privacy_accepted: bool,
    #[serde(default)]
    pub terms_accepted: bool,
    pub signature: String,
    pub invite_token: Option<String>,
}

fn default_end_time() -> String {
    "22:30".to_string()
}

fn contact_from_form(form: &ReservationForm) -> GuestContact {
    match (&form.guest_name, &form.first_name) {
        (Some(name), None) => GuestContact::Legacy {
            name: name.clone(),
            email: form.email.clone(),
            phone: form.guest_phone.clone(),
        },
        _ => GuestContact::Detailed {
            first_name: form.first_name.clone().unwrap_or_default(),
            last_name: form.last_name.clone().unwrap_or_default(),
            street: form.street.clone().unwrap_or_default(),
            postal_code: form.postal_code.clone().unwrap_or_default(),
            city: form.city.clone().unwrap_or_default(),
            phone: form.phone.clone().unwrap_or_default(),
            email: form.email.clone(),
        },
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReservationResponse {
    pub reservation_id: String,
}

fn consumption_outcome(e: &InviteError) -> &'static str {
    match e {
        InviteError::TokenInvalid => "invalid",
        InviteError::TokenRevoked => "revoked",
        InviteError::TokenExpired => "expired",
        InviteError::TokenExhausted => "used",
        InviteError::NoRecipient => "invalid",
        InviteError::Store(_) => "storage",
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<ReservationForm>,
) -> Result<(StatusCode, Json<CreatedReservationResponse>), ApiError> {
    let Some(payment_method) = PaymentMethod::parse(&form.payment_method) else {
        return Err(ReservationError::Validation(vec![ValidationIssue {
            field: "paymentMethod",
            message: "unknown payment method",
        }])
        .into());
    };

    let contact = contact_from_form(&form);
    if !state
        .rate_limiter
        .check(&format!("request:{}", contact.email()))
    {
        return Err(ApiError::RateLimited);
    }

    let input = NewReservation {
        contact,
        event_date: form.event_date,
        event_type: form.event_type,
        start_time: form.start_time,
        end_time: form.end_time,
        guest_count: form.guest_count,
        payment_method,
        notes: form.notes,
        privacy_accepted: form.privacy_accepted,
        terms_accepted: form.terms_accepted,
        signature_data_url: form.signature,
    };

    let with_token = form.invite_token.is_some();
    match state.intake.create(input, form.invite_token.as_deref()).await {
        Ok(reservation) => {
            if with_token {
                metrics::record_consumption("consumed");
            }
            metrics::record_reservation_created();
            let _ = state
                .audit
                .append(AuditEvent::new(AuditAction::ReservationCreate).reservation(&reservation.id))
                .await;

            Ok((
                StatusCode::CREATED,
                Json(CreatedReservationResponse {
                    reservation_id: reservation.id.0.to_string(),
                }),
            ))
        }
        Err(e) => {
            if let ReservationError::Invite(invite_err) = &e {
                metrics::record_consumption(consumption_outcome(invite_err));
            }
            Err(e.into())
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSummary {
    pub id: String,
    pub status: &'static str,
    pub guest_name: String,
    pub email: String,
    pub event_date: NaiveDate,
    pub event_type: String,
    pub start_time: String,
    pub end_time: String,
    pub guest_count: i32,
    pub payment_method: &'static str,
    pub invite_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn summarize(reservation: &Reservation) -> ReservationSummary {
    ReservationSummary {
        id: reservation.id.0.to_string(),
        status: reservation.status.as_str(),
        guest_name: reservation.contact.display_name(),
        email: reservation.contact.email().to_string(),
        event_date: reservation.event_date,
        event_type: reservation.event_type.clone(),
        start_time: reservation.start_time.clone(),
        end_time: reservation.end_time.clone(),
        guest_count: reservation.guest_count,
        payment_method: reservation.payment_method.as_str(),
        invite_id: reservation.invite_id.as_ref().map(|i| i.0.to_string()),
        created_at: reservation.created_at,
    }
}

pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReservationSummary>>, ApiError> {
    let reservations = state.store.list_reservations(100).await?;
    Ok(Json(reservations.iter().map(summarize).collect()))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<StatusCode, ApiError> {
    let Some(status) = ReservationStatus::parse(&req.status) else {
        return Err(ApiError::BadRequest("INVALID_STATUS"));
    };

    let id = ReservationId(id);
    state.store.update_reservation_status(&id, status).await?;
    let _ = state
        .audit
        .append(
            AuditEvent::new(AuditAction::ReservationStatusChange)
                .reservation(&id)
                .detail(status.as_str()),
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}

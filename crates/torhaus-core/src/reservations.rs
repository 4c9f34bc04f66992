//! Reservation intake: the workflow the public form drives. Validates the
//! submission, decodes the captured signature, and commits the reservation
//! row, the signature, and the invite consumption in one store transaction.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{NaiveDate, Utc};
use thiserror::Error;
use torhaus_storage::{
    CreateReservationParams, GuestContact, InviteConsumption, PaymentMethod, Reservation, Store,
    StoreError,
};

use crate::invites::{invalid_reason, InviteError, InviteService};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("reservation input failed validation")]
    Validation(Vec<ValidationIssue>),
    #[error("signature image could not be decoded")]
    InvalidSignature,
    #[error(transparent)]
    Invite(#[from] InviteError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A submitted reservation, already parsed into the typed contact shape at
/// the HTTP boundary.
#[derive(Clone, Debug)]
pub struct NewReservation {
    pub contact: GuestContact,
    pub event_date: NaiveDate,
    pub event_type: String,
    pub start_time: String,
    pub end_time: String,
    pub guest_count: i32,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub privacy_accepted: bool,
    pub terms_accepted: bool,
    /// `data:image/png;base64,...` from the signature pad.
    pub signature_data_url: String,
}

pub struct ReservationIntake<S> {
    store: S,
    invites: InviteService<S>,
}

impl<S: Store> ReservationIntake<S> {
    pub fn new(store: S, invites: InviteService<S>) -> Self {
        Self { store, invites }
    }

    /// Create a reservation, optionally redeeming an invite token. The
    /// reservation insert, signature insert, and conditional consumption
    /// commit together or not at all.
    pub async fn create(
        &self,
        input: NewReservation,
        invite_token: Option<&str>,
    ) -> Result<Reservation, ReservationError> {
        let issues = validate(&input);
        if !issues.is_empty() {
            return Err(ReservationError::Validation(issues));
        }
        let signature_png = decode_signature(&input.signature_data_url)?;

        // Resolve the token up front so a dead invite fails with its name
        // before any row is written. The conditional update inside
        // create_reservation remains the admission decision.
        let grant = match invite_token {
            Some(token) => {
                let invite = self.invites.lookup_by_token(token).await?;
                if let Some(reason) = invalid_reason(&invite, Utc::now()) {
                    return Err(reason.into_error().into());
                }
                Some(InviteConsumption {
                    invite_id: invite.id,
                    expected_max_uses: invite.max_uses,
                })
            }
            None => None,
        };

        let params = CreateReservationParams {
            contact: input.contact,
            event_date: input.event_date,
            event_type: input.event_type,
            start_time: input.start_time,
            end_time: input.end_time,
            guest_count: input.guest_count,
            payment_method: input.payment_method,
            notes: input.notes,
            signature_png,
            invite: grant,
        };

        match self.store.create_reservation(&params).await {
            Ok(reservation) => {
                tracing::info!(
                    reservation = %reservation.id.0,
                    guest = %reservation.contact.display_name(),
                    "created reservation request"
                );
                Ok(reservation)
            }
            Err(StoreError::Conflict) => {
                // consumption lost the race; re-read purely to name the reason
                let invite_id = params
                    .invite
                    .as_ref()
                    .expect("conflict implies an invite grant")
                    .invite_id
                    .clone();
                Err(self.invites.classify_consume_failure(&invite_id).await.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn validate(input: &NewReservation) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut require = |ok: bool, field: &'static str, message: &'static str| {
        if !ok {
            issues.push(ValidationIssue { field, message });
        }
    };

    match &input.contact {
        GuestContact::Detailed {
            first_name,
            last_name,
            street,
            postal_code,
            city,
            phone,
            email,
        } => {
            require(first_name.trim().len() >= 2, "firstName", "first name required");
            require(last_name.trim().len() >= 2, "lastName", "last name required");
            require(street.trim().len() >= 3, "street", "street and house number required");
            require(postal_code.trim().len() >= 4, "postalCode", "postal code required");
            require(city.trim().len() >= 2, "city", "city required");
            require(is_plausible_phone(phone), "phone", "valid phone number required");
            require(is_plausible_email(email), "email", "valid email required");
        }
        GuestContact::Legacy { name, email, phone } => {
            require(name.trim().len() >= 2, "guestName", "guest name required");
            require(is_plausible_email(email), "email", "valid email required");
            if let Some(phone) = phone {
                require(is_plausible_phone(phone), "phone", "valid phone number required");
            }
        }
    }

    require(input.event_type.trim().len() >= 2, "eventType", "event type required");
    require(!input.start_time.trim().is_empty(), "startTime", "start time required");
    require(!input.end_time.trim().is_empty(), "endTime", "end time required");
    require(input.guest_count >= 1, "guestCount", "guest count required");
    require(input.privacy_accepted, "privacyAccepted", "privacy notice must be accepted");
    require(input.terms_accepted, "termsAccepted", "reservation terms must be accepted");
    require(input.signature_data_url.len() >= 10, "signature", "signature required");

    issues
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

fn is_plausible_phone(phone: &str) -> bool {
    phone.trim().len() >= 5
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '/' | '-' | ' '))
}

/// Decode the signature pad's data URL into PNG/JPEG bytes.
fn decode_signature(data_url: &str) -> Result<Vec<u8>, ReservationError> {
    let payload = data_url
        .strip_prefix("data:image/png;base64,")
        .or_else(|| data_url.strip_prefix("data:image/jpeg;base64,"))
        .ok_or(ReservationError::InvalidSignature)?;
    STANDARD
        .decode(payload)
        .map_err(|_| ReservationError::InvalidSignature)
}

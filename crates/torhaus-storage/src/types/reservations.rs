//! Reservation types.

use chrono::{DateTime, NaiveDate, Utc};

use super::{InviteId, ReservationId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Declined,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Declined => "declined",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReservationStatus::Pending),
            "confirmed" => Some(ReservationStatus::Confirmed),
            "declined" => Some(ReservationStatus::Declined),
            "cancelled" => Some(ReservationStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentMethod {
    Invoice,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Invoice => "invoice",
            PaymentMethod::Cash => "cash",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "invoice" => Some(PaymentMethod::Invoice),
            "cash" => Some(PaymentMethod::Cash),
            _ => None,
        }
    }
}

/// Guest contact details.
///
/// Old reservation records carry only a display name; newer submissions
/// carry the structured host address. The two shapes are kept as explicit
/// variants with a discriminator column in storage, so backends map fields
/// by presence instead of probing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuestContact {
    Detailed {
        first_name: String,
        last_name: String,
        street: String,
        postal_code: String,
        city: String,
        phone: String,
        email: String,
    },
    Legacy {
        name: String,
        email: String,
        phone: Option<String>,
    },
}

impl GuestContact {
    pub fn email(&self) -> &str {
        match self {
            GuestContact::Detailed { email, .. } => email,
            GuestContact::Legacy { email, .. } => email,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            GuestContact::Detailed {
                first_name,
                last_name,
                ..
            } => format!("{first_name} {last_name}"),
            GuestContact::Legacy { name, .. } => name.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureKind {
    Host,
    Staff,
}

impl SignatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureKind::Host => "host",
            SignatureKind::Staff => "staff",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "host" => Some(SignatureKind::Host),
            "staff" => Some(SignatureKind::Staff),
            _ => None,
        }
    }
}

/// Signature captured with a reservation (PNG bytes).
#[derive(Clone, Debug)]
pub struct Signature {
    pub reservation_id: ReservationId,
    pub kind: SignatureKind,
    pub image_png: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Reservation record
#[derive(Clone, Debug)]
pub struct Reservation {
    pub id: ReservationId,
    pub status: ReservationStatus,
    pub contact: GuestContact,
    pub event_date: NaiveDate,
    pub event_type: String,
    pub start_time: String,
    pub end_time: String,
    pub guest_count: i32,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    /// Invite that authorized this reservation; cleared when that invite is
    /// deleted.
    pub invite_id: Option<InviteId>,
    pub created_at: DateTime<Utc>,
}

/// One use-unit of an invite, redeemed inside the reservation transaction.
#[derive(Clone, Debug)]
pub struct InviteConsumption {
    pub invite_id: InviteId,
    pub expected_max_uses: i32,
}

/// Parameters for creating a reservation. The host signature and the
/// optional invite consumption commit in the same transaction as the
/// reservation row.
#[derive(Clone, Debug)]
pub struct CreateReservationParams {
    pub contact: GuestContact,
    pub event_date: NaiveDate,
    pub event_type: String,
    pub start_time: String,
    pub end_time: String,
    pub guest_count: i32,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub signature_png: Vec<u8>,
    pub invite: Option<InviteConsumption>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for s in [
            ReservationStatus::Pending,
            ReservationStatus::Confirmed,
            ReservationStatus::Declined,
            ReservationStatus::Cancelled,
        ] {
            assert_eq!(ReservationStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(ReservationStatus::parse("bogus"), None);
    }

    #[test]
    fn contact_accessors() {
        let detailed = GuestContact::Detailed {
            first_name: "Anna".into(),
            last_name: "Beispiel".into(),
            street: "Hauptstr. 1".into(),
            postal_code: "21244".into(),
            city: "Buchholz".into(),
            phone: "+49 40 1234".into(),
            email: "anna@example.com".into(),
        };
        assert_eq!(detailed.email(), "anna@example.com");
        assert_eq!(detailed.display_name(), "Anna Beispiel");

        let legacy = GuestContact::Legacy {
            name: "B. Müller".into(),
            email: "bm@example.com".into(),
            phone: None,
        };
        assert_eq!(legacy.email(), "bm@example.com");
        assert_eq!(legacy.display_name(), "B. Müller");
    }
}

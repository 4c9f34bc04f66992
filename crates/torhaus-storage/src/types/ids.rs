//! Strongly-typed identifiers (avoid mixing strings/UUIDs arbitrarily).

use uuid::Uuid;

/// Invite link identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InviteId(pub Uuid);

/// Reservation identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReservationId(pub Uuid);

/// Staff user identifier. Identity itself lives outside this system; the id
/// is carried for attribution only.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

/// Email log entry identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EmailLogId(pub Uuid);

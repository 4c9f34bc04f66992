//! Invite link types.

use chrono::{DateTime, Utc};

use super::{InviteId, ReservationId, UserId};

/// Invite link record. The bearer token is never stored; `token_hash` is the
/// keyed digest used for lookup.
#[derive(Clone, Debug)]
pub struct InviteLink {
    pub id: InviteId,
    /// Which public form variant this invite unlocks.
    pub form_key: String,
    pub token_hash: String,
    pub created_by_user_id: Option<UserId>,
    pub recipient_email: Option<String>,
    pub note: Option<String>,
    /// None means the invite never expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: i32,
    pub use_count: i32,
    /// Set once, when `use_count` reaches `max_uses`.
    pub used_at: Option<DateTime<Utc>>,
    /// Last reservation that consumed a unit; overwritten per consumption.
    pub used_by_reservation_id: Option<ReservationId>,
    pub is_revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl InviteLink {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(exp) if exp <= now)
    }

    pub fn is_exhausted(&self) -> bool {
        self.use_count >= self.max_uses
    }
}

/// Parameters for creating an invite
#[derive(Clone, Debug)]
pub struct CreateInviteParams {
    pub form_key: String,
    pub token_hash: String,
    pub created_by_user_id: Option<UserId>,
    pub recipient_email: Option<String>,
    pub note: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: i32,
}

//! The Store trait that backends implement.

use chrono::{DateTime, Utc};

use crate::types::*;
use crate::StoreError;

/// The storage trait the domain crates depend on.
///
/// Every method is internally atomic; multi-statement operations open their
/// own transaction inside the backend.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────────────── Invites ────────────────────────────────────────

    /// Create an invite link with `use_count = 0` and `is_revoked = false`.
    /// A duplicate `token_hash` is `AlreadyExists`.
    async fn create_invite(&self, params: &CreateInviteParams) -> Result<InviteLink, StoreError>;

    /// Get invite by ID.
    async fn get_invite(&self, id: &InviteId) -> Result<InviteLink, StoreError>;

    /// Get invite by token hash. Revoked and exhausted records are returned
    /// as-is; callers classify state themselves.
    async fn get_invite_by_hash(&self, token_hash: &str) -> Result<InviteLink, StoreError>;

    /// List invites, newest first.
    async fn list_invites(&self, limit: i64) -> Result<Vec<InviteLink>, StoreError>;

    /// Revoke an invite. Idempotent; `NotFound` only when no such row exists.
    async fn revoke_invite(&self, id: &InviteId) -> Result<(), StoreError>;

    /// Delete invites and, in the same transaction, clear the back-references
    /// held by reservations and email log rows. Returns the number of invite
    /// rows removed.
    async fn delete_invites(&self, ids: &[InviteId]) -> Result<u64, StoreError>;

    /// Atomically redeem one use-unit: a single conditional UPDATE that
    /// increments `use_count`, points `used_by_reservation_id` at the
    /// consuming reservation, and stamps `used_at` when the increment reaches
    /// `expected_max_uses` — but only while the invite is unrevoked,
    /// unexpired at `now`, and below its quota. Returns whether a row was
    /// affected. Under racing callers the database is the sole arbiter:
    /// at most `max_uses` consumptions ever succeed.
    async fn try_consume_invite(
        &self,
        id: &InviteId,
        expected_max_uses: i32,
        now: DateTime<Utc>,
        reservation_id: &ReservationId,
    ) -> Result<bool, StoreError>;

    // ─────────────────────────────────── Reservations ─────────────────────────────────────

    /// Create a reservation. One transaction covers the reservation row, the
    /// host signature, and (when `params.invite` is set) the conditional
    /// invite consumption; a consumption that affects zero rows aborts the
    /// whole transaction with `Conflict`.
    async fn create_reservation(
        &self,
        params: &CreateReservationParams,
    ) -> Result<Reservation, StoreError>;

    /// Get a reservation by ID.
    async fn get_reservation(&self, id: &ReservationId) -> Result<Reservation, StoreError>;

    /// List reservations, newest first.
    async fn list_reservations(&self, limit: i64) -> Result<Vec<Reservation>, StoreError>;

    /// Update the workflow status of a reservation.
    async fn update_reservation_status(
        &self,
        id: &ReservationId,
        status: ReservationStatus,
    ) -> Result<(), StoreError>;

    /// Fetch a stored signature.
    async fn get_signature(
        &self,
        reservation_id: &ReservationId,
        kind: SignatureKind,
    ) -> Result<Signature, StoreError>;

    // ──────────────────────────────────── Email log ───────────────────────────────────────

    /// Record a delivery attempt.
    async fn record_email(
        &self,
        params: &CreateEmailLogParams,
    ) -> Result<EmailLogEntry, StoreError>;
}

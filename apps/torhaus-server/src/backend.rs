use chrono::{DateTime, Utc};
use std::sync::Arc;
use torhaus_storage::*;
use torhaus_store_postgres::PostgresStore;
use torhaus_store_sqlite::SqliteStore;

/// StoreBackend abstracts over SQLite and PostgreSQL implementations
#[derive(Clone)]
pub enum StoreBackend {
    Sqlite(Arc<SqliteStore>),
    Postgres(Arc<PostgresStore>),
}

#[async_trait::async_trait]
impl Store for StoreBackend {
    async fn create_invite(&self, params: &CreateInviteParams) -> Result<InviteLink, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.create_invite(params).await,
            StoreBackend::Postgres(s) => s.create_invite(params).await,
        }
    }

    async fn get_invite(&self, id: &InviteId) -> Result<InviteLink, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.get_invite(id).await,
            StoreBackend::Postgres(s) => s.get_invite(id).await,
        }
    }

    async fn get_invite_by_hash(&self, token_hash: &str) -> Result<InviteLink, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.get_invite_by_hash(token_hash).await,
            StoreBackend::Postgres(s) => s.get_invite_by_hash(token_hash).await,
        }
    }

    async fn list_invites(&self, limit: i64) -> Result<Vec<InviteLink>, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.list_invites(limit).await,
            StoreBackend::Postgres(s) => s.list_invites(limit).await,
        }
    }

    async fn revoke_invite(&self, id: &InviteId) -> Result<(), StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.revoke_invite(id).await,
            StoreBackend::Postgres(s) => s.revoke_invite(id).await,
        }
    }

    async fn delete_invites(&self, ids: &[InviteId]) -> Result<u64, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.delete_invites(ids).await,
            StoreBackend::Postgres(s) => s.delete_invites(ids).await,
        }
    }

    async fn try_consume_invite(
        &self,
        id: &InviteId,
        expected_max_uses: i32,
        now: DateTime<Utc>,
        reservation_id: &ReservationId,
    ) -> Result<bool, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => {
                s.try_consume_invite(id, expected_max_uses, now, reservation_id)
                    .await
            }
            StoreBackend::Postgres(s) => {
                s.try_consume_invite(id, expected_max_uses, now, reservation_id)
                    .await
            }
        }
    }

    async fn create_reservation(
        &self,
        params: &CreateReservationParams,
    ) -> Result<Reservation, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.create_reservation(params).await,
            StoreBackend::Postgres(s) => s.create_reservation(params).await,
        }
    }

    async fn get_reservation(&self, id: &ReservationId) -> Result<Reservation, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.get_reservation(id).await,
            StoreBackend::Postgres(s) => s.get_reservation(id).await,
        }
    }

    async fn list_reservations(&self, limit: i64) -> Result<Vec<Reservation>, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.list_reservations(limit).await,
            StoreBackend::Postgres(s) => s.list_reservations(limit).await,
        }
    }

    async fn update_reservation_status(
        &self,
        id: &ReservationId,
        status: ReservationStatus,
    ) -> Result<(), StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.update_reservation_status(id, status).await,
            StoreBackend::Postgres(s) => s.update_reservation_status(id, status).await,
        }
    }

    async fn get_signature(
        &self,
        reservation_id: &ReservationId,
        kind: SignatureKind,
    ) -> Result<Signature, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.get_signature(reservation_id, kind).await,
            StoreBackend::Postgres(s) => s.get_signature(reservation_id, kind).await,
        }
    }

    async fn record_email(
        &self,
        params: &CreateEmailLogParams,
    ) -> Result<EmailLogEntry, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.record_email(params).await,
            StoreBackend::Postgres(s) => s.record_email(params).await,
        }
    }
}

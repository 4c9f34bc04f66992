use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;
use torhaus_storage::{
    CreateEmailLogParams, CreateInviteParams, CreateReservationParams, EmailLogEntry, EmailLogId,
    GuestContact, InviteId, InviteLink, PaymentMethod, Reservation, ReservationId,
    ReservationStatus, Signature, SignatureKind, Store, StoreError, UserId,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Conditional consume statement. The WHERE clause is the sole admission
/// check: revoked, expired, or quota-exhausted rows match nothing and the
/// update reports zero rows affected.
const CONSUME_SQL: &str = "UPDATE invite_links
     SET use_count = use_count + 1,
         used_by_reservation_id = ?,
         used_at = CASE WHEN use_count + 1 >= ? THEN ? ELSE used_at END
     WHERE id = ?
       AND is_revoked = 0
       AND use_count < ?
       AND (expires_at IS NULL OR expires_at > ?)";

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open("sqlite::memory:").await
    }

    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .create_if_missing(true);

        // In-memory databases live per connection; a single connection keeps
        // every caller on the same database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(map_err)?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }
}

fn map_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::AlreadyExists,
        other => StoreError::Backend(other.to_string()),
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(s).map_err(|e| StoreError::Backend(format!("malformed uuid in row: {e}")))
}

fn invite_from_row(row: &SqliteRow) -> Result<InviteLink, StoreError> {
    let id: String = row.try_get("id").map_err(map_err)?;
    let created_by: Option<String> = row.try_get("created_by_user_id").map_err(map_err)?;
    let used_by: Option<String> = row.try_get("used_by_reservation_id").map_err(map_err)?;

    Ok(InviteLink {
        id: InviteId(parse_uuid(&id)?),
        form_key: row.try_get("form_key").map_err(map_err)?,
        token_hash: row.try_get("token_hash").map_err(map_err)?,
        created_by_user_id: created_by.as_deref().map(parse_uuid).transpose()?.map(UserId),
        recipient_email: row.try_get("recipient_email").map_err(map_err)?,
        note: row.try_get("note").map_err(map_err)?,
        expires_at: row.try_get("expires_at").map_err(map_err)?,
        max_uses: row.try_get("max_uses").map_err(map_err)?,
        use_count: row.try_get("use_count").map_err(map_err)?,
        used_at: row.try_get("used_at").map_err(map_err)?,
        used_by_reservation_id: used_by
            .as_deref()
            .map(parse_uuid)
            .transpose()?
            .map(ReservationId),
        is_revoked: row.try_get("is_revoked").map_err(map_err)?,
        created_at: row.try_get("created_at").map_err(map_err)?,
    })
}

fn reservation_from_row(row: &SqliteRow) -> Result<Reservation, StoreError> {
    let id: String = row.try_get("id").map_err(map_err)?;
    let status: String = row.try_get("status").map_err(map_err)?;
    let payment: String = row.try_get("payment_method").map_err(map_err)?;
    let invite_id: Option<String> = row.try_get("invite_id").map_err(map_err)?;

    let kind: String = row.try_get("contact_kind").map_err(map_err)?;
    let email: String = row.try_get("contact_email").map_err(map_err)?;
    let phone: Option<String> = row.try_get("contact_phone").map_err(map_err)?;
    let contact = match kind.as_str() {
        "detailed" => GuestContact::Detailed {
            first_name: require_field(row, "first_name")?,
            last_name: require_field(row, "last_name")?,
            street: require_field(row, "street")?,
            postal_code: require_field(row, "postal_code")?,
            city: require_field(row, "city")?,
            phone: phone.ok_or_else(|| {
                StoreError::Backend("detailed reservation row without contact_phone".into())
            })?,
            email,
        },
        "legacy" => GuestContact::Legacy {
            name: require_field(row, "legacy_name")?,
            email,
            phone,
        },
        other => {
            return Err(StoreError::Backend(format!(
                "unknown contact_kind '{other}' in reservation row"
            )))
        }
    };

    Ok(Reservation {
        id: ReservationId(parse_uuid(&id)?),
        status: ReservationStatus::parse(&status)
            .ok_or_else(|| StoreError::Backend(format!("unknown reservation status '{status}'")))?,
        contact,
        event_date: row.try_get::<NaiveDate, _>("event_date").map_err(map_err)?,
        event_type: row.try_get("event_type").map_err(map_err)?,
        start_time: row.try_get("start_time").map_err(map_err)?,
        end_time: row.try_get("end_time").map_err(map_err)?,
        guest_count: row.try_get("guest_count").map_err(map_err)?,
        payment_method: PaymentMethod::parse(&payment)
            .ok_or_else(|| StoreError::Backend(format!("unknown payment method '{payment}'")))?,
        notes: row.try_get("notes").map_err(map_err)?,
        invite_id: invite_id.as_deref().map(parse_uuid).transpose()?.map(InviteId),
        created_at: row.try_get("created_at").map_err(map_err)?,
    })
}

fn require_field(row: &SqliteRow, column: &str) -> Result<String, StoreError> {
    row.try_get::<Option<String>, _>(column)
        .map_err(map_err)?
        .ok_or_else(|| StoreError::Backend(format!("reservation row missing '{column}'")))
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    // ───────────────────────────── Invites ─────────────────────────────

    async fn create_invite(&self, params: &CreateInviteParams) -> Result<InviteLink, StoreError> {
        let id = Uuid::now_v7();
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO invite_links(id, form_key, token_hash, created_by_user_id,
                 recipient_email, note, expires_at, max_uses, use_count, is_revoked, created_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?)",
        )
        .bind(id.to_string())
        .bind(&params.form_key)
        .bind(&params.token_hash)
        .bind(params.created_by_user_id.as_ref().map(|u| u.0.to_string()))
        .bind(&params.recipient_email)
        .bind(&params.note)
        .bind(params.expires_at)
        .bind(params.max_uses)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;

        Ok(InviteLink {
            id: InviteId(id),
            form_key: params.form_key.clone(),
            token_hash: params.token_hash.clone(),
            created_by_user_id: params.created_by_user_id.clone(),
            recipient_email: params.recipient_email.clone(),
            note: params.note.clone(),
            expires_at: params.expires_at,
            max_uses: params.max_uses,
            use_count: 0,
            used_at: None,
            used_by_reservation_id: None,
            is_revoked: false,
            created_at,
        })
    }

    async fn get_invite(&self, id: &InviteId) -> Result<InviteLink, StoreError> {
        let row = sqlx::query("SELECT * FROM invite_links WHERE id = ?")
            .bind(id.0.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .ok_or(StoreError::NotFound)?;
        invite_from_row(&row)
    }

    async fn get_invite_by_hash(&self, token_hash: &str) -> Result<InviteLink, StoreError> {
        let row = sqlx::query("SELECT * FROM invite_links WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .ok_or(StoreError::NotFound)?;
        invite_from_row(&row)
    }

    async fn list_invites(&self, limit: i64) -> Result<Vec<InviteLink>, StoreError> {
        let rows = sqlx::query("SELECT * FROM invite_links ORDER BY created_at DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        rows.iter().map(invite_from_row).collect()
    }

    async fn revoke_invite(&self, id: &InviteId) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE invite_links SET is_revoked = 1 WHERE id = ?")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_err)?;

        if result.rows_affected() == 0 {
            Err(StoreError::NotFound)
        } else {
            Ok(())
        }
    }

    async fn delete_invites(&self, ids: &[InviteId]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;
        let mut deleted = 0u64;

        for id in ids {
            let id_text = id.0.to_string();
            sqlx::query("UPDATE reservations SET invite_id = NULL WHERE invite_id = ?")
                .bind(&id_text)
                .execute(&mut *tx)
                .await
                .map_err(map_err)?;
            sqlx::query("UPDATE email_log SET invite_id = NULL WHERE invite_id = ?")
                .bind(&id_text)
                .execute(&mut *tx)
                .await
                .map_err(map_err)?;
            let result = sqlx::query("DELETE FROM invite_links WHERE id = ?")
                .bind(&id_text)
                .execute(&mut *tx)
                .await
                .map_err(map_err)?;
            deleted += result.rows_affected();
        }

        tx.commit().await.map_err(map_err)?;
        Ok(deleted)
    }

    async fn try_consume_invite(
        &self,
        id: &InviteId,
        expected_max_uses: i32,
        now: DateTime<Utc>,
        reservation_id: &ReservationId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(CONSUME_SQL)
            .bind(reservation_id.0.to_string())
            .bind(expected_max_uses)
            .bind(now)
            .bind(id.0.to_string())
            .bind(expected_max_uses)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }

    // ───────────────────────────── Reservations ─────────────────────────────

    async fn create_reservation(
        &self,
        params: &CreateReservationParams,
    ) -> Result<Reservation, StoreError> {
        let id = Uuid::now_v7();
        let created_at = Utc::now();

        let (kind, email, phone, first_name, last_name, street, postal_code, city, legacy_name) =
            match &params.contact {
                GuestContact::Detailed {
                    first_name,
                    last_name,
                    street,
                    postal_code,
                    city,
                    phone,
                    email,
                } => (
                    "detailed",
                    email.clone(),
                    Some(phone.clone()),
                    Some(first_name.clone()),
                    Some(last_name.clone()),
                    Some(street.clone()),
                    Some(postal_code.clone()),
                    Some(city.clone()),
                    None,
                ),
                GuestContact::Legacy { name, email, phone } => (
                    "legacy",
                    email.clone(),
                    phone.clone(),
                    None,
                    None,
                    None,
                    None,
                    None,
                    Some(name.clone()),
                ),
            };

        let mut tx = self.pool.begin().await.map_err(map_err)?;

        sqlx::query(
            "INSERT INTO reservations(id, status, contact_kind, contact_email, contact_phone,
                 first_name, last_name, street, postal_code, city, legacy_name,
                 event_date, event_type, start_time, end_time, guest_count, payment_method,
                 notes, invite_id, created_at)
             VALUES(?, 'pending', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(kind)
        .bind(&email)
        .bind(&phone)
        .bind(&first_name)
        .bind(&last_name)
        .bind(&street)
        .bind(&postal_code)
        .bind(&city)
        .bind(&legacy_name)
        .bind(params.event_date)
        .bind(&params.event_type)
        .bind(&params.start_time)
        .bind(&params.end_time)
        .bind(params.guest_count)
        .bind(params.payment_method.as_str())
        .bind(&params.notes)
        .bind(params.invite.as_ref().map(|g| g.invite_id.0.to_string()))
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        sqlx::query(
            "INSERT INTO signatures(reservation_id, kind, image_png, created_at)
             VALUES(?, 'host', ?, ?)",
        )
        .bind(id.to_string())
        .bind(&params.signature_png)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        if let Some(grant) = &params.invite {
            let result = sqlx::query(CONSUME_SQL)
                .bind(id.to_string())
                .bind(grant.expected_max_uses)
                .bind(created_at)
                .bind(grant.invite_id.0.to_string())
                .bind(grant.expected_max_uses)
                .bind(created_at)
                .execute(&mut *tx)
                .await
                .map_err(map_err)?;
            if result.rows_affected() == 0 {
                // dropping the transaction rolls back the inserts above
                return Err(StoreError::Conflict);
            }
        }

        tx.commit().await.map_err(map_err)?;

        Ok(Reservation {
            id: ReservationId(id),
            status: ReservationStatus::Pending,
            contact: params.contact.clone(),
            event_date: params.event_date,
            event_type: params.event_type.clone(),
            start_time: params.start_time.clone(),
            end_time: params.end_time.clone(),
            guest_count: params.guest_count,
            payment_method: params.payment_method,
            notes: params.notes.clone(),
            invite_id: params.invite.as_ref().map(|g| g.invite_id.clone()),
            created_at,
        })
    }

    async fn get_reservation(&self, id: &ReservationId) -> Result<Reservation, StoreError> {
        let row = sqlx::query("SELECT * FROM reservations WHERE id = ?")
            .bind(id.0.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .ok_or(StoreError::NotFound)?;
        reservation_from_row(&row)
    }

    async fn list_reservations(&self, limit: i64) -> Result<Vec<Reservation>, StoreError> {
        let rows = sqlx::query("SELECT * FROM reservations ORDER BY created_at DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        rows.iter().map(reservation_from_row).collect()
    }

    async fn update_reservation_status(
        &self,
        id: &ReservationId,
        status: ReservationStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE reservations SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_err)?;

        if result.rows_affected() == 0 {
            Err(StoreError::NotFound)
        } else {
            Ok(())
        }
    }

    async fn get_signature(
        &self,
        reservation_id: &ReservationId,
        kind: SignatureKind,
    ) -> Result<Signature, StoreError> {
        let row = sqlx::query(
            "SELECT image_png, created_at FROM signatures WHERE reservation_id = ? AND kind = ?",
        )
        .bind(reservation_id.0.to_string())
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?
        .ok_or(StoreError::NotFound)?;

        Ok(Signature {
            reservation_id: reservation_id.clone(),
            kind,
            image_png: row.try_get("image_png").map_err(map_err)?,
            created_at: row.try_get("created_at").map_err(map_err)?,
        })
    }

    // ───────────────────────────── Email log ─────────────────────────────

    async fn record_email(
        &self,
        params: &CreateEmailLogParams,
    ) -> Result<EmailLogEntry, StoreError> {
        let id = Uuid::now_v7();
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO email_log(id, invite_id, reservation_id, recipient, subject, status, error, created_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(params.invite_id.as_ref().map(|i| i.0.to_string()))
        .bind(params.reservation_id.as_ref().map(|r| r.0.to_string()))
        .bind(&params.recipient)
        .bind(&params.subject)
        .bind(params.status.as_str())
        .bind(&params.error)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;

        Ok(EmailLogEntry {
            id: EmailLogId(id),
            invite_id: params.invite_id.clone(),
            reservation_id: params.reservation_id.clone(),
            recipient: params.recipient.clone(),
            subject: params.subject.clone(),
            status: params.status,
            error: params.error.clone(),
            created_at,
        })
    }
}

impl SqliteStore {
    /// Test/debug helper: count email log rows still pointing at an invite.
    pub async fn email_log_rows_for_invite(&self, id: &InviteId) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM email_log WHERE invite_id = ?")
            .bind(id.0.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        row.try_get("n").map_err(map_err)
    }
}

use chrono::{Duration, NaiveDate, Utc};
use torhaus_store_sqlite::SqliteStore;
use torhaus_storage::{
    CreateEmailLogParams, CreateInviteParams, CreateReservationParams, EmailStatus, GuestContact,
    InviteConsumption, InviteId, PaymentMethod, ReservationId, ReservationStatus, SignatureKind,
    Store, StoreError,
};
use uuid::Uuid;

fn invite_params(token_hash: &str) -> CreateInviteParams {
    CreateInviteParams {
        form_key: "gesellschaften".into(),
        token_hash: token_hash.into(),
        created_by_user_id: None,
        recipient_email: Some("guest@example.com".into()),
        note: None,
        expires_at: Some(Utc::now() + Duration::days(7)),
        max_uses: 1,
    }
}

fn reservation_params(invite: Option<InviteConsumption>) -> CreateReservationParams {
    CreateReservationParams {
        contact: GuestContact::Detailed {
            first_name: "Anna".into(),
            last_name: "Beispiel".into(),
            street: "Hauptstr. 1".into(),
            postal_code: "21244".into(),
            city: "Buchholz".into(),
            phone: "+49 40 1234".into(),
            email: "anna@example.com".into(),
        },
        event_date: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
        event_type: "Geburtstag".into(),
        start_time: "18:00".into(),
        end_time: "22:30".into(),
        guest_count: 24,
        payment_method: PaymentMethod::Invoice,
        notes: None,
        signature_png: vec![0x89, 0x50, 0x4e, 0x47],
        invite,
    }
}

#[tokio::test]
async fn invite_create_and_lookup() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    let invite = store.create_invite(&invite_params("hash-1")).await.unwrap();
    assert_eq!(invite.use_count, 0);
    assert!(!invite.is_revoked);

    let by_hash = store.get_invite_by_hash("hash-1").await.unwrap();
    assert_eq!(by_hash.id, invite.id);

    let by_id = store.get_invite(&invite.id).await.unwrap();
    assert_eq!(by_id.token_hash, "hash-1");

    assert!(matches!(
        store.get_invite_by_hash("hash-nope").await,
        Err(StoreError::NotFound)
    ));
}

#[tokio::test]
async fn duplicate_token_hash_rejected() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.create_invite(&invite_params("hash-dup")).await.unwrap();
    assert!(matches!(
        store.create_invite(&invite_params("hash-dup")).await,
        Err(StoreError::AlreadyExists)
    ));
}

#[tokio::test]
async fn revoke_is_idempotent() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let invite = store.create_invite(&invite_params("hash-r")).await.unwrap();

    store.revoke_invite(&invite.id).await.unwrap();
    store.revoke_invite(&invite.id).await.unwrap();

    let reread = store.get_invite(&invite.id).await.unwrap();
    assert!(reread.is_revoked);

    assert!(matches!(
        store.revoke_invite(&InviteId(Uuid::new_v4())).await,
        Err(StoreError::NotFound)
    ));
}

#[tokio::test]
async fn consume_respects_quota() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let invite = store.create_invite(&invite_params("hash-q")).await.unwrap();
    let now = Utc::now();

    let r1 = ReservationId(Uuid::new_v4());
    assert!(store.try_consume_invite(&invite.id, 1, now, &r1).await.unwrap());

    let r2 = ReservationId(Uuid::new_v4());
    assert!(!store.try_consume_invite(&invite.id, 1, now, &r2).await.unwrap());

    let reread = store.get_invite(&invite.id).await.unwrap();
    assert_eq!(reread.use_count, 1);
    assert_eq!(reread.used_by_reservation_id, Some(r1));
    assert!(reread.used_at.is_some());
}

#[tokio::test]
async fn consume_rejects_revoked_and_expired() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let now = Utc::now();

    let revoked = store.create_invite(&invite_params("hash-rev")).await.unwrap();
    store.revoke_invite(&revoked.id).await.unwrap();
    let rid = ReservationId(Uuid::new_v4());
    assert!(!store.try_consume_invite(&revoked.id, 1, now, &rid).await.unwrap());

    let mut params = invite_params("hash-exp");
    params.expires_at = Some(now - Duration::days(1));
    let expired = store.create_invite(&params).await.unwrap();
    assert!(!store.try_consume_invite(&expired.id, 1, now, &rid).await.unwrap());

    assert_eq!(store.get_invite(&revoked.id).await.unwrap().use_count, 0);
    assert_eq!(store.get_invite(&expired.id).await.unwrap().use_count, 0);
}

#[tokio::test]
async fn multi_use_progression_sets_used_at_on_last_unit() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mut params = invite_params("hash-m");
    params.max_uses = 3;
    let invite = store.create_invite(&params).await.unwrap();
    let now = Utc::now();

    for expected_count in 1..=3 {
        let rid = ReservationId(Uuid::new_v4());
        assert!(store.try_consume_invite(&invite.id, 3, now, &rid).await.unwrap());
        let reread = store.get_invite(&invite.id).await.unwrap();
        assert_eq!(reread.use_count, expected_count);
        assert_eq!(reread.used_by_reservation_id, Some(rid));
        assert_eq!(reread.used_at.is_some(), expected_count == 3);
    }

    let rid = ReservationId(Uuid::new_v4());
    assert!(!store.try_consume_invite(&invite.id, 3, now, &rid).await.unwrap());
    assert_eq!(store.get_invite(&invite.id).await.unwrap().use_count, 3);
}

#[tokio::test]
async fn racing_consumers_get_exactly_one_unit() {
    let store = std::sync::Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let invite = store.create_invite(&invite_params("hash-race")).await.unwrap();
    let now = Utc::now();

    let a = {
        let store = store.clone();
        let id = invite.id.clone();
        tokio::spawn(async move {
            store
                .try_consume_invite(&id, 1, now, &ReservationId(Uuid::new_v4()))
                .await
                .unwrap()
        })
    };
    let b = {
        let store = store.clone();
        let id = invite.id.clone();
        tokio::spawn(async move {
            store
                .try_consume_invite(&id, 1, now, &ReservationId(Uuid::new_v4()))
                .await
                .unwrap()
        })
    };

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    assert!(a ^ b, "exactly one concurrent consumer may win");
    assert_eq!(store.get_invite(&invite.id).await.unwrap().use_count, 1);
}

#[tokio::test]
async fn reservation_commits_jointly_with_consumption() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let invite = store.create_invite(&invite_params("hash-j")).await.unwrap();

    let reservation = store
        .create_reservation(&reservation_params(Some(InviteConsumption {
            invite_id: invite.id.clone(),
            expected_max_uses: invite.max_uses,
        })))
        .await
        .unwrap();

    let invite = store.get_invite(&invite.id).await.unwrap();
    assert_eq!(invite.use_count, 1);
    assert_eq!(invite.used_by_reservation_id, Some(reservation.id.clone()));

    let stored = store.get_reservation(&reservation.id).await.unwrap();
    assert_eq!(stored.invite_id, Some(invite.id.clone()));
    assert_eq!(stored.status, ReservationStatus::Pending);

    let signature = store
        .get_signature(&reservation.id, SignatureKind::Host)
        .await
        .unwrap();
    assert_eq!(signature.image_png, vec![0x89, 0x50, 0x4e, 0x47]);
}

#[tokio::test]
async fn failed_consumption_rolls_back_reservation_insert() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let invite = store.create_invite(&invite_params("hash-rb")).await.unwrap();

    // exhaust the invite first
    let rid = ReservationId(Uuid::new_v4());
    assert!(store
        .try_consume_invite(&invite.id, 1, Utc::now(), &rid)
        .await
        .unwrap());

    let result = store
        .create_reservation(&reservation_params(Some(InviteConsumption {
            invite_id: invite.id.clone(),
            expected_max_uses: invite.max_uses,
        })))
        .await;
    assert!(matches!(result, Err(StoreError::Conflict)));

    // neither the reservation nor its signature survived the rollback
    assert!(store.list_reservations(10).await.unwrap().is_empty());
    assert_eq!(store.get_invite(&invite.id).await.unwrap().use_count, 1);
}

#[tokio::test]
async fn delete_clears_back_references() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let invite = store.create_invite(&invite_params("hash-d")).await.unwrap();

    let reservation = store
        .create_reservation(&reservation_params(Some(InviteConsumption {
            invite_id: invite.id.clone(),
            expected_max_uses: invite.max_uses,
        })))
        .await
        .unwrap();

    store
        .record_email(&CreateEmailLogParams {
            invite_id: Some(invite.id.clone()),
            reservation_id: None,
            recipient: "guest@example.com".into(),
            subject: "Ihre Einladung".into(),
            status: EmailStatus::Sent,
            error: None,
        })
        .await
        .unwrap();

    let deleted = store.delete_invites(&[invite.id.clone()]).await.unwrap();
    assert_eq!(deleted, 1);

    assert!(matches!(
        store.get_invite(&invite.id).await,
        Err(StoreError::NotFound)
    ));

    // the reservation survives with its back-reference cleared
    let stored = store.get_reservation(&reservation.id).await.unwrap();
    assert_eq!(stored.invite_id, None);

    // email history survives without a dangling invite pointer
    assert_eq!(store.email_log_rows_for_invite(&invite.id).await.unwrap(), 0);
}

#[tokio::test]
async fn legacy_contact_round_trips() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mut params = reservation_params(None);
    params.contact = GuestContact::Legacy {
        name: "B. Müller".into(),
        email: "bm@example.com".into(),
        phone: None,
    };

    let reservation = store.create_reservation(&params).await.unwrap();
    let stored = store.get_reservation(&reservation.id).await.unwrap();
    assert_eq!(stored.contact, params.contact);
}

#[tokio::test]
async fn status_updates_persist() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let reservation = store.create_reservation(&reservation_params(None)).await.unwrap();

    store
        .update_reservation_status(&reservation.id, ReservationStatus::Confirmed)
        .await
        .unwrap();
    let stored = store.get_reservation(&reservation.id).await.unwrap();
    assert_eq!(stored.status, ReservationStatus::Confirmed);

    assert!(matches!(
        store
            .update_reservation_status(&ReservationId(Uuid::new_v4()), ReservationStatus::Declined)
            .await,
        Err(StoreError::NotFound)
    ));
}

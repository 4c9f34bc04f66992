//! Invite lifecycle: issuance, validation, consumption, resend, revocation.
//!
//! Every state decision about an invite funnels through here. Admission
//! under concurrency is NOT decided here — that belongs to the store's
//! conditional update — this layer only prepares inputs and translates
//! outcomes into the error taxonomy.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use torhaus_crypto::{generate_token, TokenHasher};
use torhaus_storage::{
    CreateInviteParams, InviteId, InviteLink, ReservationId, Store, StoreError, UserId,
};

#[derive(Debug, Error)]
pub enum InviteError {
    #[error("invite token not recognized")]
    TokenInvalid,
    #[error("invite was revoked")]
    TokenRevoked,
    #[error("invite has expired")]
    TokenExpired,
    #[error("invite has no uses left")]
    TokenExhausted,
    #[error("invite has no recipient email")]
    NoRecipient,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a token failed read-only validation. Precedence: revocation is an
/// explicit administrative override and wins over the time- or usage-based
/// explanations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidReason {
    Invalid,
    Revoked,
    Expired,
    Used,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::Invalid => "invalid",
            InvalidReason::Revoked => "revoked",
            InvalidReason::Expired => "expired",
            InvalidReason::Used => "used",
        }
    }

    pub(crate) fn into_error(self) -> InviteError {
        match self {
            InvalidReason::Invalid => InviteError::TokenInvalid,
            InvalidReason::Revoked => InviteError::TokenRevoked,
            InvalidReason::Expired => InviteError::TokenExpired,
            InvalidReason::Used => InviteError::TokenExhausted,
        }
    }
}

/// Outcome of the read-only validation check. "Invalid token" is the common
/// case on a public endpoint, so it is a value, not an error.
#[derive(Clone, Debug)]
pub enum InviteValidation {
    Valid {
        invite_id: InviteId,
        form_key: String,
        use_count: i32,
        max_uses: i32,
    },
    Invalid {
        reason: InvalidReason,
    },
}

/// Expiry requested at issuance: an explicit day offset, the configured
/// default, or no expiry at all.
#[derive(Clone, Copy, Debug)]
pub enum Expiry {
    Days(i64),
    Default,
    Never,
}

#[derive(Clone, Debug)]
pub struct IssueOptions {
    pub form_key: String,
    pub created_by_user_id: Option<UserId>,
    pub recipient_email: Option<String>,
    pub expires: Expiry,
    pub note: Option<String>,
    pub max_uses: i32,
}

impl IssueOptions {
    pub fn new(form_key: impl Into<String>) -> Self {
        Self {
            form_key: form_key.into(),
            created_by_user_id: None,
            recipient_email: None,
            expires: Expiry::Default,
            note: None,
            max_uses: 1,
        }
    }
}

/// A freshly minted invite. The plaintext token exists only in this value;
/// storage keeps the digest.
#[derive(Clone, Debug)]
pub struct IssuedInvite {
    pub token: String,
    pub invite: InviteLink,
}

#[derive(Clone)]
pub struct InviteService<S> {
    store: S,
    hasher: Arc<TokenHasher>,
    default_expiry_days: i64,
}

impl<S: Store> InviteService<S> {
    pub fn new(store: S, hasher: Arc<TokenHasher>, default_expiry_days: i64) -> Self {
        Self {
            store,
            hasher,
            default_expiry_days,
        }
    }

    /// Mint a token, persist its digest, hand the plaintext back exactly once.
    pub async fn issue(&self, opts: IssueOptions) -> Result<IssuedInvite, InviteError> {
        let token = generate_token();
        let token_hash = self.hasher.hash(&token);

        let expires_at = match opts.expires {
            Expiry::Days(days) => Some(Utc::now() + Duration::days(days)),
            Expiry::Default => Some(Utc::now() + Duration::days(self.default_expiry_days)),
            Expiry::Never => None,
        };

        let invite = self
            .store
            .create_invite(&CreateInviteParams {
                form_key: opts.form_key,
                token_hash,
                created_by_user_id: opts.created_by_user_id,
                recipient_email: opts.recipient_email,
                note: opts.note,
                expires_at,
                max_uses: opts.max_uses.max(1),
            })
            .await?;

        tracing::info!(invite = %invite.id.0, form_key = %invite.form_key, "issued invite link");
        Ok(IssuedInvite { token, invite })
    }

    /// Read-only token check used by the public form and the validation
    /// endpoint. Never consumes a use.
    pub async fn validate(&self, token: &str) -> Result<InviteValidation, InviteError> {
        if token.is_empty() {
            return Ok(InviteValidation::Invalid {
                reason: InvalidReason::Invalid,
            });
        }

        let invite = match self.store.get_invite_by_hash(&self.hasher.hash(token)).await {
            Ok(invite) => invite,
            Err(StoreError::NotFound) => {
                return Ok(InviteValidation::Invalid {
                    reason: InvalidReason::Invalid,
                })
            }
            Err(e) => return Err(e.into()),
        };

        Ok(match invalid_reason(&invite, Utc::now()) {
            Some(reason) => InviteValidation::Invalid { reason },
            None => InviteValidation::Valid {
                invite_id: invite.id,
                form_key: invite.form_key,
                use_count: invite.use_count,
                max_uses: invite.max_uses,
            },
        })
    }

    /// Redeem one use-unit for a reservation. The conditional update at the
    /// store is the only admission check that counts; the surrounding reads
    /// exist purely to name the failure.
    pub async fn consume_for_reservation(
        &self,
        token: &str,
        reservation_id: &ReservationId,
    ) -> Result<InviteLink, InviteError> {
        let invite = self.lookup_by_token(token).await?;
        let now = Utc::now();
        if let Some(reason) = invalid_reason(&invite, now) {
            return Err(reason.into_error());
        }

        let consumed = self
            .store
            .try_consume_invite(&invite.id, invite.max_uses, now, reservation_id)
            .await?;
        if !consumed {
            return Err(self.classify_consume_failure(&invite.id).await);
        }

        tracing::debug!(invite = %invite.id.0, reservation = %reservation_id.0, "consumed invite unit");
        Ok(self.store.get_invite(&invite.id).await?)
    }

    /// Mint a replacement invite for the same recipient: new token and hash,
    /// inherited form key, note and quota, TTL recomputed from what remains
    /// of the old one (at least a day). The old invite keeps whatever state
    /// it is in.
    pub async fn resend(
        &self,
        id: &InviteId,
        resent_by: Option<UserId>,
    ) -> Result<IssuedInvite, InviteError> {
        let invite = self.store.get_invite(id).await?;
        let recipient = invite.recipient_email.clone().ok_or(InviteError::NoRecipient)?;

        let expires = match invite.expires_at {
            Some(exp) => {
                let secs = (exp - Utc::now()).num_seconds();
                Expiry::Days(((secs + 86_399) / 86_400).max(1))
            }
            None => Expiry::Never,
        };

        self.issue(IssueOptions {
            form_key: invite.form_key,
            created_by_user_id: resent_by,
            recipient_email: Some(recipient),
            expires,
            note: invite.note,
            max_uses: invite.max_uses,
        })
        .await
    }

    pub async fn get(&self, id: &InviteId) -> Result<InviteLink, InviteError> {
        Ok(self.store.get_invite(id).await?)
    }

    pub async fn list(&self, limit: i64) -> Result<Vec<InviteLink>, InviteError> {
        Ok(self.store.list_invites(limit).await?)
    }

    pub async fn revoke(&self, id: &InviteId) -> Result<(), InviteError> {
        self.store.revoke_invite(id).await?;
        tracing::info!(invite = %id.0, "revoked invite link");
        Ok(())
    }

    pub async fn bulk_revoke(&self, ids: &[InviteId]) -> Result<(), InviteError> {
        for id in ids {
            self.store.revoke_invite(id).await?;
        }
        Ok(())
    }

    pub async fn bulk_delete(&self, ids: &[InviteId]) -> Result<u64, InviteError> {
        let deleted = self.store.delete_invites(ids).await?;
        tracing::info!(deleted, "deleted invite links");
        Ok(deleted)
    }

    /// Resolve a plaintext token to its record; unknown hashes are
    /// `TokenInvalid`.
    pub(crate) async fn lookup_by_token(&self, token: &str) -> Result<InviteLink, InviteError> {
        if token.is_empty() {
            return Err(InviteError::TokenInvalid);
        }
        match self.store.get_invite_by_hash(&self.hasher.hash(token)).await {
            Ok(invite) => Ok(invite),
            Err(StoreError::NotFound) => Err(InviteError::TokenInvalid),
            Err(e) => Err(e.into()),
        }
    }

    /// Name the reason a conditional consume affected no rows. The re-read
    /// is for reporting only; if it shows an active record, a racer took the
    /// last unit between our update and this read.
    pub(crate) async fn classify_consume_failure(&self, id: &InviteId) -> InviteError {
        match self.store.get_invite(id).await {
            Ok(invite) => invalid_reason(&invite, Utc::now())
                .map(InvalidReason::into_error)
                .unwrap_or(InviteError::TokenExhausted),
            Err(StoreError::NotFound) => InviteError::TokenInvalid,
            Err(e) => e.into(),
        }
    }
}

/// State precedence for an existing record: revoked > expired > exhausted.
pub(crate) fn invalid_reason(invite: &InviteLink, now: DateTime<Utc>) -> Option<InvalidReason> {
    if invite.is_revoked {
        Some(InvalidReason::Revoked)
    } else if invite.is_expired(now) {
        Some(InvalidReason::Expired)
    } else if invite.is_exhausted() {
        Some(InvalidReason::Used)
    } else {
        None
    }
}

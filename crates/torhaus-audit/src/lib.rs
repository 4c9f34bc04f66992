//! Audit logging abstraction for torhaus.
//!
//! This crate defines the `AuditLog` trait for persisting audit events and
//! the types representing auditable actions in the system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;
use torhaus_storage::{InviteId, ReservationId, UserId};

/// Unique identifier for an audit log entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditLogId(pub Uuid);

impl AuditLogId {
    /// Generate a new audit log ID using UUID v7 (time-ordered)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AuditLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditLogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Categories of auditable actions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    InviteIssue,
    InviteResend,
    InviteRevoke,
    InviteDelete,
    InviteConsume,
    ReservationCreate,
    ReservationStatusChange,
}

/// A single audit event. Identifier fields are plain copies, not foreign
/// keys: entries must survive deletion of the records they mention.
#[derive(Clone, Debug)]
pub struct AuditEvent {
    pub id: AuditLogId,
    pub action: AuditAction,
    pub actor_user_id: Option<UserId>,
    pub invite_id: Option<InviteId>,
    pub reservation_id: Option<ReservationId>,
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(action: AuditAction) -> Self {
        Self {
            id: AuditLogId::new(),
            action,
            actor_user_id: None,
            invite_id: None,
            reservation_id: None,
            detail: None,
            at: Utc::now(),
        }
    }

    pub fn invite(mut self, id: &InviteId) -> Self {
        self.invite_id = Some(id.clone());
        self
    }

    pub fn reservation(mut self, id: &ReservationId) -> Self {
        self.reservation_id = Some(id.clone());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// Sink for audit events.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append an event to the trail.
    async fn append(&self, event: AuditEvent) -> Result<(), AuditError>;

    /// Most recent events, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<AuditEvent>, AuditError>;
}

/// In-process audit log for single-instance deployments and tests.
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: RwLock<Vec<AuditEvent>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn append(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.entries.write().await.push(event);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEvent>, AuditError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }
}

//! Email delivery log types.

use chrono::{DateTime, Utc};

use super::{EmailLogId, InviteId, ReservationId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmailStatus {
    Sent,
    Failed,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Sent => "sent",
            EmailStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(EmailStatus::Sent),
            "failed" => Some(EmailStatus::Failed),
            _ => None,
        }
    }
}

/// One attempted delivery. Rows outlive the invite they reference; deleting
/// an invite nulls `invite_id` instead of dropping the history.
#[derive(Clone, Debug)]
pub struct EmailLogEntry {
    pub id: EmailLogId,
    pub invite_id: Option<InviteId>,
    pub reservation_id: Option<ReservationId>,
    pub recipient: String,
    pub subject: String,
    pub status: EmailStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for recording a delivery attempt
#[derive(Clone, Debug)]
pub struct CreateEmailLogParams {
    pub invite_id: Option<InviteId>,
    pub reservation_id: Option<ReservationId>,
    pub recipient: String,
    pub subject: String,
    pub status: EmailStatus,
    pub error: Option<String>,
}

//! Append-only audit trail records for lending events.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::actor::UserId;
use crate::domain::copy::CopyId;
use crate::domain::fine::FineAmount;

/// Kind of lending event recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ActivityKind {
    /// A copy was reserved.
    Reserve,
    /// A copy was issued to a borrower.
    Issue,
    /// A loan was finalised and the copy returned to circulation.
    Return,
    /// An overdue fine was collected.
    FinePayment,
}

impl ActivityKind {
    /// Wire name of the event kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reserve => "reserve",
            Self::Issue => "issue",
            Self::Return => "return",
            Self::FinePayment => "finePayment",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable audit entry. Created once, never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    id: Uuid,
    copy_id: CopyId,
    user_id: UserId,
    kind: ActivityKind,
    at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fine_amount: Option<FineAmount>,
}

impl ActivityRecord {
    /// Record a lending event.
    pub fn new(copy_id: CopyId, user_id: UserId, kind: ActivityKind, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            copy_id,
            user_id,
            kind,
            at,
            fine_amount: None,
        }
    }

    /// Attach the collected fine amount to a [`ActivityKind::FinePayment`]
    /// entry.
    pub fn with_fine_amount(mut self, amount: FineAmount) -> Self {
        self.fine_amount = Some(amount);
        self
    }

    /// Stable identifier of the entry.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Copy the event concerns.
    pub fn copy_id(&self) -> CopyId {
        self.copy_id
    }

    /// User the event concerns: the holder or borrower, not the desk
    /// operator who triggered it.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Kind of event.
    pub fn kind(&self) -> ActivityKind {
        self.kind
    }

    /// When the event happened.
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// Fine amount collected, when the event is a fine payment.
    pub fn fine_amount(&self) -> Option<FineAmount> {
        self.fine_amount
    }
}

//! Driving port for lending lifecycle mutations.
//!
//! Every request carries the authenticated [`Actor`] explicitly; no operation
//! infers the caller from ambient state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::actor::{Actor, UserId};
use crate::domain::copy::{CopyDraft, CopyId, CopyRecord, CopyStatus, CopyStatusKind};
use crate::domain::fine::FineAmount;
use crate::domain::payment::{PaymentClaim, PaymentReference};

/// Request to register a copy in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCopyRequest {
    pub actor: Actor,
    pub draft: CopyDraft,
}

/// Response from registering a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCopyResponse {
    pub copy: CopyRecord,
}

/// Request to reserve a copy for the acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveCopyRequest {
    pub copy_id: CopyId,
    pub actor: Actor,
}

/// Response from reserving a copy.
///
/// `replayed` is `true` when the copy was already reserved by the same user
/// and the existing reservation was returned unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveCopyResponse {
    pub status: CopyStatusKind,
    pub reserved_at: DateTime<Utc>,
    pub replayed: bool,
}

/// Request to cancel a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReservationRequest {
    pub copy_id: CopyId,
    pub actor: Actor,
}

/// Response from cancelling a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReservationResponse {
    pub status: CopyStatusKind,
}

/// Request to issue a copy to a borrower at the desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCopyRequest {
    pub copy_id: CopyId,
    pub actor: Actor,
    pub borrower: UserId,
    /// Due date override; defaults to now plus the configured loan period.
    pub due_date: Option<DateTime<Utc>>,
}

/// Response from issuing a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCopyResponse {
    pub status: CopyStatusKind,
    pub due_date: DateTime<Utc>,
}

/// Request to return an issued copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnCopyRequest {
    pub copy_id: CopyId,
    pub actor: Actor,
}

/// Outcome of a return attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReturnOutcome {
    /// The copy was returned and is Active again.
    Returned,
    /// An overdue fine is outstanding; the copy stays Issued until it is
    /// settled through `pay_fine`.
    PaymentDue { fine: FineAmount },
}

/// Response from returning a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnCopyResponse {
    pub outcome: ReturnOutcome,
}

/// Request to settle an overdue fine and finalise the return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayFineRequest {
    pub copy_id: CopyId,
    pub actor: Actor,
    pub claim: PaymentClaim,
}

/// Response from settling a fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayFineResponse {
    pub amount_paid: FineAmount,
    pub reference: PaymentReference,
}

/// Administrative status values a librarian may set directly.
///
/// Reserved and Issued are reachable only through the lending operations, so
/// they are deliberately absent here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AdminCopyStatus {
    Active,
    Deactive,
}

impl AdminCopyStatus {
    /// The full status value this administrative choice maps to.
    pub fn to_status(self) -> CopyStatus {
        match self {
            Self::Active => CopyStatus::Active,
            Self::Deactive => CopyStatus::Deactive,
        }
    }

    /// Discriminant of the mapped status.
    pub fn kind(self) -> CopyStatusKind {
        match self {
            Self::Active => CopyStatusKind::Active,
            Self::Deactive => CopyStatusKind::Deactive,
        }
    }
}

/// Request to set a copy's administrative status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCopyStatusRequest {
    pub copy_id: CopyId,
    pub actor: Actor,
    pub status: AdminCopyStatus,
}

/// Response from setting a copy's administrative status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCopyStatusResponse {
    pub status: CopyStatusKind,
}

/// Driving port for lending lifecycle write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LendingCommand: Send + Sync {
    /// Register a new copy; it enters circulation as Active.
    async fn register_copy(
        &self,
        request: RegisterCopyRequest,
    ) -> Result<RegisterCopyResponse, Error>;

    /// Reserve an Active copy for the acting user.
    ///
    /// Re-reserving a copy already held by the same user replays the
    /// existing reservation instead of erroring.
    async fn reserve(&self, request: ReserveCopyRequest) -> Result<ReserveCopyResponse, Error>;

    /// Cancel a reservation, returning the copy to Active.
    async fn cancel_reservation(
        &self,
        request: CancelReservationRequest,
    ) -> Result<CancelReservationResponse, Error>;

    /// Issue a copy to a borrower, starting the loan period.
    async fn issue(&self, request: IssueCopyRequest) -> Result<IssueCopyResponse, Error>;

    /// Return an issued copy, assessing any overdue fine first.
    async fn return_copy(&self, request: ReturnCopyRequest) -> Result<ReturnCopyResponse, Error>;

    /// Confirm an outstanding fine payment and finalise the return.
    async fn pay_fine(&self, request: PayFineRequest) -> Result<PayFineResponse, Error>;

    /// Set a copy's administrative status (Active or Deactive).
    async fn set_status(
        &self,
        request: SetCopyStatusRequest,
    ) -> Result<SetCopyStatusResponse, Error>;
}

//! Fine payment records and the claims callers submit to settle them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::actor::UserId;
use crate::domain::copy::CopyId;
use crate::domain::fine::FineAmount;

/// Validation errors returned when constructing payment values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentValidationError {
    EmptyReference,
    PaddedReference,
}

impl fmt::Display for PaymentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyReference => write!(f, "payment reference must not be empty"),
            Self::PaddedReference => {
                write!(f, "payment reference must not contain surrounding whitespace")
            }
        }
    }
}

impl std::error::Error for PaymentValidationError {}

/// Opaque reference identifying a payment with the external provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaymentReference(String);

impl PaymentReference {
    /// Validate and construct a [`PaymentReference`].
    pub fn new(value: impl Into<String>) -> Result<Self, PaymentValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(PaymentValidationError::EmptyReference);
        }
        if raw.trim() != raw {
            return Err(PaymentValidationError::PaddedReference);
        }
        Ok(Self(raw))
    }

    /// Borrow the reference as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PaymentReference {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PaymentReference> for String {
    fn from(value: PaymentReference) -> Self {
        value.0
    }
}

impl TryFrom<String> for PaymentReference {
    type Error = PaymentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Amount and provider reference a caller submits to settle a fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentClaim {
    pub amount: FineAmount,
    pub reference: PaymentReference,
}

/// Settlement state of a recorded fine payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// The external provider confirmed the payment.
    Confirmed,
}

/// Ledger record of one collected fine.
///
/// Created only as a side effect of a successful return with an outstanding
/// fine; immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinePayment {
    id: Uuid,
    copy_id: CopyId,
    user_id: UserId,
    amount: FineAmount,
    reference: PaymentReference,
    at: DateTime<Utc>,
    status: PaymentStatus,
}

impl FinePayment {
    /// Record a confirmed fine payment.
    pub fn confirmed(
        copy_id: CopyId,
        user_id: UserId,
        amount: FineAmount,
        reference: PaymentReference,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            copy_id,
            user_id,
            amount,
            reference,
            at,
            status: PaymentStatus::Confirmed,
        }
    }

    /// Stable identifier of the payment.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Copy the fine was owed against.
    pub fn copy_id(&self) -> CopyId {
        self.copy_id
    }

    /// Borrower who paid.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Amount collected.
    pub fn amount(&self) -> FineAmount {
        self.amount
    }

    /// Provider reference for the settlement.
    pub fn reference(&self) -> &PaymentReference {
        &self.reference
    }

    /// When the payment was recorded.
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// Settlement state.
    pub fn status(&self) -> PaymentStatus {
        self.status
    }
}

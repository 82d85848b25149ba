//! Port for confirming fine payments with an external gateway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::actor::UserId;
use crate::domain::copy::CopyId;
use crate::domain::fine::FineAmount;
use crate::domain::payment::PaymentReference;

/// Payment details submitted to the gateway for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub copy_id: CopyId,
    pub user_id: UserId,
    pub amount: FineAmount,
    pub reference: PaymentReference,
}

/// Gateway acknowledgement of a settled payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub reference: PaymentReference,
    pub amount: FineAmount,
    pub confirmed_at: DateTime<Utc>,
}

/// Errors surfaced by payment gateway adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentGatewayError {
    /// The gateway refused the payment.
    #[error("payment declined: {reason}")]
    Declined { reason: String },
    /// The gateway did not answer within the configured deadline.
    #[error("payment gateway timed out")]
    Timeout,
    /// The gateway could not be reached.
    #[error("payment gateway unreachable: {message}")]
    Transport { message: String },
    /// The gateway answered with a body the adapter could not interpret.
    #[error("payment gateway returned an invalid response: {message}")]
    InvalidResponse { message: String },
}

impl PaymentGatewayError {
    /// Helper for refused payments.
    pub fn declined(reason: impl Into<String>) -> Self {
        Self::Declined {
            reason: reason.into(),
        }
    }

    /// Helper for connectivity failures.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Helper for malformed gateway responses.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

/// Confirmation port for fine payments.
///
/// Implementations must only return [`PaymentConfirmation`] once the gateway
/// has durably accepted the payment; every error leaves the fine unsettled.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submit a payment and wait for the gateway's verdict.
    async fn confirm(
        &self,
        request: &ConfirmPaymentRequest,
    ) -> Result<PaymentConfirmation, PaymentGatewayError>;
}

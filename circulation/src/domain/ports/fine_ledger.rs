//! Port for recording confirmed fine payments.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::copy::CopyId;
use crate::domain::payment::FinePayment;

/// Errors surfaced by fine ledger adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FineLedgerError {
    /// Ledger connectivity or write failures.
    #[error("fine ledger connection failed: {message}")]
    Connection { message: String },
    /// Read failures that bubble up from the adapter.
    #[error("fine ledger query failed: {message}")]
    Query { message: String },
}

impl FineLedgerError {
    /// Helper for connection related adapter errors.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Durable record of settled fines.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FineLedger: Send + Sync {
    /// Record one confirmed payment.
    async fn record(&self, payment: &FinePayment) -> Result<(), FineLedgerError>;

    /// Payments recorded against one copy, newest first.
    async fn list_for_copy(&self, copy_id: &CopyId) -> Result<Vec<FinePayment>, FineLedgerError>;
}

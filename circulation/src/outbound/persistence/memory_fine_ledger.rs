//! In-process `FineLedger` implementation.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::ports::{FineLedger, FineLedgerError};
use crate::domain::{CopyId, FinePayment};

/// In-memory ledger of settled fines.
#[derive(Debug, Default)]
pub struct MemoryFineLedger {
    payments: RwLock<Vec<FinePayment>>,
}

impl MemoryFineLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    fn read_payments(&self) -> Result<RwLockReadGuard<'_, Vec<FinePayment>>, FineLedgerError> {
        self.payments
            .read()
            .map_err(|_| FineLedgerError::connection("fine ledger lock poisoned"))
    }

    fn write_payments(&self) -> Result<RwLockWriteGuard<'_, Vec<FinePayment>>, FineLedgerError> {
        self.payments
            .write()
            .map_err(|_| FineLedgerError::connection("fine ledger lock poisoned"))
    }
}

#[async_trait]
impl FineLedger for MemoryFineLedger {
    async fn record(&self, payment: &FinePayment) -> Result<(), FineLedgerError> {
        let mut payments = self.write_payments()?;
        payments.push(payment.clone());
        Ok(())
    }

    async fn list_for_copy(&self, copy_id: &CopyId) -> Result<Vec<FinePayment>, FineLedgerError> {
        let payments = self.read_payments()?;
        Ok(payments
            .iter()
            .rev()
            .filter(|payment| payment.copy_id() == *copy_id)
            .cloned()
            .collect())
    }
}

//! In-process `CopyStore` implementation backed by a guarded map.
//!
//! This adapter is the reference implementation of the conditional-update
//! contract: `update_if_status` holds the write lock for the whole
//! compare-and-swap, so concurrent transitions over the same copy are
//! linearised and exactly one writer wins.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::ports::{CopyPage, CopyStore, CopyStoreError};
use crate::domain::{CopyId, CopyRecord, CopyStatus};

/// Copy stored together with its registration sequence number.
#[derive(Debug, Clone)]
struct StoredCopy {
    sequence: u64,
    record: CopyRecord,
}

#[derive(Debug, Default)]
struct StoreState {
    next_sequence: u64,
    copies: HashMap<CopyId, StoredCopy>,
}

/// In-memory copy store; listing follows registration order.
#[derive(Debug, Default)]
pub struct MemoryCopyStore {
    state: RwLock<StoreState>,
}

impl MemoryCopyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, StoreState>, CopyStoreError> {
        self.state
            .read()
            .map_err(|_| CopyStoreError::connection("copy store lock poisoned"))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, StoreState>, CopyStoreError> {
        self.state
            .write()
            .map_err(|_| CopyStoreError::connection("copy store lock poisoned"))
    }
}

#[async_trait]
impl CopyStore for MemoryCopyStore {
    async fn insert(&self, copy: &CopyRecord) -> Result<(), CopyStoreError> {
        let mut state = self.write_state()?;
        let duplicate = state.copies.values().any(|stored| {
            stored.record.id() == copy.id()
                || stored.record.accession_number() == copy.accession_number()
        });
        if duplicate {
            return Err(CopyStoreError::duplicate_copy(
                copy.accession_number().as_str(),
            ));
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.copies.insert(
            copy.id(),
            StoredCopy {
                sequence,
                record: copy.clone(),
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, id: &CopyId) -> Result<Option<CopyRecord>, CopyStoreError> {
        let state = self.read_state()?;
        Ok(state.copies.get(id).map(|stored| stored.record.clone()))
    }

    async fn list(&self, page: &CopyPage) -> Result<Vec<CopyRecord>, CopyStoreError> {
        let state = self.read_state()?;
        let mut stored: Vec<&StoredCopy> = state.copies.values().collect();
        stored.sort_by_key(|entry| entry.sequence);
        Ok(stored
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|entry| entry.record.clone())
            .collect())
    }

    async fn update_if_status(
        &self,
        expected: &CopyStatus,
        updated: &CopyRecord,
    ) -> Result<(), CopyStoreError> {
        let mut state = self.write_state()?;
        let Some(stored) = state.copies.get_mut(&updated.id()) else {
            return Err(CopyStoreError::status_changed(updated.id().to_string()));
        };
        if stored.record.status() != expected {
            return Err(CopyStoreError::status_changed(updated.id().to_string()));
        }

        stored.record = updated.clone();
        Ok(())
    }
}

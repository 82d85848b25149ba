//! Port for copy persistence with conditional status updates.
//!
//! The [`CopyStore::update_if_status`] contract carries the optimistic
//! concurrency discipline: adapters must refuse a write whose expected prior
//! status no longer matches the stored record, so concurrent transitions on
//! the same copy resolve to exactly one winner.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::copy::{CopyId, CopyRecord, CopyStatus};

/// Default number of copies returned by a listing.
pub const COPY_PAGE_DEFAULT_LIMIT: u32 = 50;
/// Upper bound on the number of copies returned by a listing.
pub const COPY_PAGE_MAX_LIMIT: u32 = 200;

/// Validation errors returned when constructing [`CopyPage`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CopyPageValidationError {
    /// Limit must request at least one record.
    #[error("page limit must be at least 1")]
    ZeroLimit,
    /// Limit exceeds the listing bound.
    #[error("page limit must be at most {max}")]
    LimitTooLarge { max: u32 },
}

/// Page bounds for copy listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CopyPageDto", into = "CopyPageDto")]
pub struct CopyPage {
    limit: u32,
    offset: u32,
}

impl CopyPage {
    /// Validate and construct page bounds.
    ///
    /// # Examples
    /// ```
    /// use circulation::domain::ports::CopyPage;
    ///
    /// let page = CopyPage::new(25, 50).expect("valid page");
    /// assert_eq!(page.limit(), 25);
    /// assert_eq!(page.offset(), 50);
    /// ```
    pub fn new(limit: u32, offset: u32) -> Result<Self, CopyPageValidationError> {
        if limit == 0 {
            return Err(CopyPageValidationError::ZeroLimit);
        }
        if limit > COPY_PAGE_MAX_LIMIT {
            return Err(CopyPageValidationError::LimitTooLarge {
                max: COPY_PAGE_MAX_LIMIT,
            });
        }
        Ok(Self { limit, offset })
    }

    /// Records requested per page.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Records skipped from the start of the listing.
    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl Default for CopyPage {
    fn default() -> Self {
        Self {
            limit: COPY_PAGE_DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct CopyPageDto {
    limit: u32,
    offset: u32,
}

impl From<CopyPage> for CopyPageDto {
    fn from(value: CopyPage) -> Self {
        Self {
            limit: value.limit,
            offset: value.offset,
        }
    }
}

impl TryFrom<CopyPageDto> for CopyPage {
    type Error = CopyPageValidationError;

    fn try_from(value: CopyPageDto) -> Result<Self, Self::Error> {
        Self::new(value.limit, value.offset)
    }
}

/// Errors surfaced by copy store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CopyStoreError {
    /// Store connectivity or transaction failures.
    #[error("copy store connection failed: {message}")]
    Connection { message: String },
    /// A copy with the same id or accession number already exists.
    #[error("copy with accession number {accession_number} already exists")]
    DuplicateCopy { accession_number: String },
    /// The stored status no longer matches the expected prior status.
    #[error("copy {copy_id} changed status concurrently")]
    StatusChanged { copy_id: String },
    /// Catch-all for read or write failures that bubble up from the adapter.
    #[error("copy store query failed: {message}")]
    Query { message: String },
}

impl CopyStoreError {
    /// Helper for connection related adapter errors.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for uniqueness conflicts on insert.
    pub fn duplicate_copy(accession_number: impl Into<String>) -> Self {
        Self::DuplicateCopy {
            accession_number: accession_number.into(),
        }
    }

    /// Helper for lost conditional updates.
    pub fn status_changed(copy_id: impl Into<String>) -> Self {
        Self::StatusChanged {
            copy_id: copy_id.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence port for copy records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CopyStore: Send + Sync {
    /// Persist a newly registered copy.
    ///
    /// Fails with [`CopyStoreError::DuplicateCopy`] when a copy with the
    /// same id or accession number already exists.
    async fn insert(&self, copy: &CopyRecord) -> Result<(), CopyStoreError>;

    /// Fetch a copy by its identifier.
    async fn find_by_id(&self, id: &CopyId) -> Result<Option<CopyRecord>, CopyStoreError>;

    /// List copies in stable registration order.
    async fn list(&self, page: &CopyPage) -> Result<Vec<CopyRecord>, CopyStoreError>;

    /// Replace the stored record only if its status still equals `expected`.
    ///
    /// Fails with [`CopyStoreError::StatusChanged`] when the stored status
    /// differs from `expected` or the copy no longer exists; the caller then
    /// re-reads and re-evaluates its transition guard.
    async fn update_if_status(
        &self,
        expected: &CopyStatus,
        updated: &CopyRecord,
    ) -> Result<(), CopyStoreError>;
}

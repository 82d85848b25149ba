//! Driving port for lending read operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Error;
use crate::domain::activity::ActivityRecord;
use crate::domain::copy::{CopyId, CopyRecord};
use crate::domain::ports::copy_store::CopyPage;

/// Request to fetch one copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCopyRequest {
    pub copy_id: CopyId,
}

/// Response carrying one copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCopyResponse {
    pub copy: CopyRecord,
}

/// Request to list copies for desk screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCopiesRequest {
    pub page: CopyPage,
}

/// Response carrying a page of copies in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCopiesResponse {
    pub copies: Vec<CopyRecord>,
}

/// Request to read a copy's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCopyActivityRequest {
    pub copy_id: CopyId,
}

/// Response carrying a copy's audit trail, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCopyActivityResponse {
    pub events: Vec<ActivityRecord>,
}

/// Driving port for lending read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LendingQuery: Send + Sync {
    /// Fetch one copy by id.
    async fn get_copy(&self, request: GetCopyRequest) -> Result<GetCopyResponse, Error>;

    /// List copies in stable registration order.
    async fn list_copies(&self, request: ListCopiesRequest) -> Result<ListCopiesResponse, Error>;

    /// Read the audit trail for one copy, newest first.
    async fn list_copy_activity(
        &self,
        request: ListCopyActivityRequest,
    ) -> Result<ListCopyActivityResponse, Error>;
}

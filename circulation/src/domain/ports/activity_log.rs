//! Port for the append-only lending activity log.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::activity::ActivityRecord;
use crate::domain::copy::CopyId;

/// Errors surfaced by activity log adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivityLogError {
    /// Log connectivity or write failures.
    #[error("activity log connection failed: {message}")]
    Connection { message: String },
    /// Read failures that bubble up from the adapter.
    #[error("activity log query failed: {message}")]
    Query { message: String },
}

impl ActivityLogError {
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

/// Append-only history of lending events.
///
/// Records are never updated or deleted; the log is the audit trail for a
/// copy's lifecycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Append one event to the log.
    async fn append(&self, record: &ActivityRecord) -> Result<(), ActivityLogError>;

    /// Events for one copy, newest first.
    async fn list_for_copy(&self, copy_id: &CopyId)
    -> Result<Vec<ActivityRecord>, ActivityLogError>;
}

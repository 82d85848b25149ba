//! In-process `ActivityLog` implementation.
//!
//! Entries are held in append order; reads reverse that order so callers see
//! the newest event first. Nothing is ever updated or deleted.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::ports::{ActivityLog, ActivityLogError};
use crate::domain::{ActivityRecord, CopyId};

/// In-memory append-only activity log.
#[derive(Debug, Default)]
pub struct MemoryActivityLog {
    entries: RwLock<Vec<ActivityRecord>>,
}

impl MemoryActivityLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn read_entries(&self) -> Result<RwLockReadGuard<'_, Vec<ActivityRecord>>, ActivityLogError> {
        self.entries
            .read()
            .map_err(|_| ActivityLogError::connection("activity log lock poisoned"))
    }

    fn write_entries(&self) -> Result<RwLockWriteGuard<'_, Vec<ActivityRecord>>, ActivityLogError> {
        self.entries
            .write()
            .map_err(|_| ActivityLogError::connection("activity log lock poisoned"))
    }
}

#[async_trait]
impl ActivityLog for MemoryActivityLog {
    async fn append(&self, record: &ActivityRecord) -> Result<(), ActivityLogError> {
        let mut entries = self.write_entries()?;
        entries.push(record.clone());
        Ok(())
    }

    async fn list_for_copy(
        &self,
        copy_id: &CopyId,
    ) -> Result<Vec<ActivityRecord>, ActivityLogError> {
        let entries = self.read_entries()?;
        Ok(entries
            .iter()
            .rev()
            .filter(|record| record.copy_id() == *copy_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    //! Behaviour coverage for the reference log.

    use chrono::{TimeDelta, Utc};
    use rstest::rstest;

    use super::*;
    use crate::domain::{ActivityKind, UserId};

    #[rstest]
    #[tokio::test]
    async fn lists_only_the_requested_copy_newest_first() {
        let log = MemoryActivityLog::new();
        let copy_id = CopyId::random();
        let other_copy = CopyId::random();
        let user = UserId::random();
        let start = Utc::now();

        let reserve = ActivityRecord::new(copy_id, user.clone(), ActivityKind::Reserve, start);
        let issue = ActivityRecord::new(
            copy_id,
            user.clone(),
            ActivityKind::Issue,
            start + TimeDelta::hours(1),
        );
        let unrelated = ActivityRecord::new(other_copy, user, ActivityKind::Reserve, start);
        for record in [&reserve, &issue, &unrelated] {
            log.append(record).await.expect("append succeeds");
        }

        let listed = log.list_for_copy(&copy_id).await.expect("list succeeds");

        assert_eq!(listed, vec![issue, reserve]);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_copy_lists_nothing() {
        let log = MemoryActivityLog::new();

        let listed = log
            .list_for_copy(&CopyId::random())
            .await
            .expect("list succeeds");

        assert!(listed.is_empty());
    }
}

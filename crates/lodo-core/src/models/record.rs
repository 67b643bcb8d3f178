//! Record model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::SyncStatus;

/// A unique identifier for a record, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new unique record ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The unit of synchronization.
///
/// `sync_status`, `updated_at` and `deleted_at` are private: status changes go
/// through [`Record::set_sync_status`], which owns the timestamp side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier
    pub id: RecordId,
    /// User-visible text
    pub title: String,
    /// Completion flag
    pub completed: bool,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    updated_at: i64,
    deleted_at: Option<i64>,
    sync_status: SyncStatus,
}

impl Record {
    /// Create a new local record, pending its first push
    #[must_use]
    pub fn new(title: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: RecordId::new(),
            title: title.into(),
            completed: false,
            created_at: now_ms,
            updated_at: now_ms,
            deleted_at: None,
            sync_status: SyncStatus::PendingCreate,
        }
    }

    /// Materialize a record exactly as the remote store returned it
    #[must_use]
    pub const fn from_remote(
        id: RecordId,
        title: String,
        completed: bool,
        created_at: i64,
        updated_at: i64,
        deleted_at: Option<i64>,
    ) -> Self {
        Self {
            id,
            title,
            completed,
            created_at,
            updated_at,
            deleted_at,
            sync_status: SyncStatus::Synced,
        }
    }

    /// Rebuild a record from persisted columns.
    ///
    /// Only storage backends should call this; it restores a previously saved
    /// state and performs no transition.
    #[must_use]
    pub const fn restore(
        id: RecordId,
        title: String,
        completed: bool,
        created_at: i64,
        updated_at: i64,
        deleted_at: Option<i64>,
        sync_status: SyncStatus,
    ) -> Self {
        Self {
            id,
            title,
            completed,
            created_at,
            updated_at,
            deleted_at,
            sync_status,
        }
    }

    /// Last content mutation (Unix ms)
    #[must_use]
    pub const fn updated_at(&self) -> i64 {
        self.updated_at
    }

    /// Soft-delete timestamp (Unix ms), if deleted
    #[must_use]
    pub const fn deleted_at(&self) -> Option<i64> {
        self.deleted_at
    }

    /// Current sync status
    #[must_use]
    pub const fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    /// Whether the record is soft-deleted
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Move to `status`, applying its timestamp side effects.
    ///
    /// `PendingUpdate` stamps `updated_at`, `PendingDelete` stamps
    /// `deleted_at`, `PendingRecovery` clears `deleted_at`. `updated_at`
    /// never moves backwards.
    pub fn set_sync_status(&mut self, status: SyncStatus, now_ms: i64) {
        match status {
            SyncStatus::PendingUpdate => self.updated_at = self.updated_at.max(now_ms),
            SyncStatus::PendingDelete => self.deleted_at = Some(now_ms),
            SyncStatus::PendingRecovery => self.deleted_at = None,
            SyncStatus::Synced | SyncStatus::PendingCreate | SyncStatus::Failed => {}
        }
        self.sync_status = status;
    }

    /// Apply a user edit.
    ///
    /// A record that never reached the remote stays `PendingCreate` so its
    /// first push is still a create.
    pub fn apply_edit(&mut self, title: Option<String>, completed: Option<bool>, now_ms: i64) {
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(completed) = completed {
            self.completed = completed;
        }

        let never_pushed = self.sync_status == SyncStatus::PendingCreate;
        self.set_sync_status(SyncStatus::PendingUpdate, now_ms);
        if never_pushed {
            self.set_sync_status(SyncStatus::PendingCreate, now_ms);
        }
    }

    /// Merge a row from the pulled snapshot under last-writer-wins.
    ///
    /// Only `title`, `completed` and `updated_at` are taken from a strictly
    /// newer remote; the local `deleted_at` is kept. A pending delete stays
    /// `PendingDelete` so it is still pushed, anything else becomes `Synced`.
    pub fn merge_pulled(&mut self, remote: &Self) -> bool {
        if remote.updated_at <= self.updated_at {
            return false;
        }

        self.title.clone_from(&remote.title);
        self.completed = remote.completed;
        self.updated_at = remote.updated_at;
        if self.sync_status != SyncStatus::PendingDelete {
            self.sync_status = SyncStatus::Synced;
        }
        true
    }

    /// Last-writer-wins over a full remote row, `deleted_at` included.
    ///
    /// Returns `true` when the remote state was adopted, in which case the
    /// record is `Synced`.
    pub fn adopt_if_newer(&mut self, remote: &Self) -> bool {
        if remote.updated_at <= self.updated_at {
            return false;
        }

        self.title.clone_from(&remote.title);
        self.completed = remote.completed;
        self.updated_at = remote.updated_at;
        self.deleted_at = remote.deleted_at;
        self.sync_status = SyncStatus::Synced;
        true
    }
}

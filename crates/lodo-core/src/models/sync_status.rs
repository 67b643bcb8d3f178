//! Per-record sync status

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which remote operation, if any, is outstanding for a record.
///
/// The integer codes are persisted in the local `records.sync_status` column
/// and never leave the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    PendingCreate,
    PendingUpdate,
    PendingDelete,
    PendingRecovery,
    Failed,
}

impl SyncStatus {
    /// All states, in code order
    pub const ALL: [Self; 6] = [
        Self::Synced,
        Self::PendingCreate,
        Self::PendingUpdate,
        Self::PendingDelete,
        Self::PendingRecovery,
        Self::Failed,
    ];

    /// Integer code stored in the local database
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Synced => 0,
            Self::PendingCreate => 1,
            Self::PendingUpdate => 2,
            Self::PendingDelete => 3,
            Self::PendingRecovery => 4,
            Self::Failed => 5,
        }
    }

    /// Decode a stored integer code
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Synced),
            1 => Some(Self::PendingCreate),
            2 => Some(Self::PendingUpdate),
            3 => Some(Self::PendingDelete),
            4 => Some(Self::PendingRecovery),
            5 => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether the record still has work to push
    #[must_use]
    pub const fn is_pending(self) -> bool {
        !matches!(self, Self::Synced)
    }

    /// Human readable label for detail views
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Synced => "Synced",
            Self::PendingCreate => "Pending create...",
            Self::PendingUpdate => "Pending update...",
            Self::PendingDelete => "Pending delete...",
            Self::PendingRecovery => "Pending recovery...",
            Self::Failed => "Failed...",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Synced => "synced",
            Self::PendingCreate => "pending-create",
            Self::PendingUpdate => "pending-update",
            Self::PendingDelete => "pending-delete",
            Self::PendingRecovery => "pending-recovery",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

//! Data models for lodo

mod record;
mod sync_status;

pub use record::{Record, RecordId};
pub use sync_status::SyncStatus;

//! Remote store client abstraction.
//!
//! The sync engine talks to the authoritative backend only through
//! [`RemoteStore`]. Every operation either returns the record as the remote
//! now holds it, or a [`RemoteError`]; a failed call leaves the remote row
//! unchanged, and repeating a call with the same payload is safe.

mod supabase;

use thiserror::Error;

use crate::models::{Record, RecordId};

pub use supabase::SupabaseRemoteStore;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {0}")]
    Api(String),
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
    #[error("Remote record not found: {0}")]
    NotFound(String),
}

impl RemoteError {
    /// Message suitable for a dismissible notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(error) if error.is_connect() || error.is_timeout() => {
                "Could not reach the server. Changes will sync later.".to_string()
            }
            Self::Http(_) => "The server request failed. Changes will sync later.".to_string(),
            Self::Api(message) => format!("The server rejected the change: {message}"),
            Self::NotFound(id) => format!("Record {id} no longer exists on the server."),
            Self::InvalidConfiguration(_) | Self::InvalidPayload(_) => self.to_string(),
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// CRUD surface of the authoritative store.
///
/// Records returned by the remote are materialized as `Synced`.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// All records that are not soft-deleted remotely
    async fn fetch_all(&self) -> RemoteResult<Vec<Record>>;

    /// A single record by ID, deleted or not
    async fn fetch_one(&self, id: &RecordId) -> RemoteResult<Option<Record>>;

    /// Insert a record, returning the stored representation
    async fn create(&self, record: &Record) -> RemoteResult<Record>;

    /// Overwrite the content and timestamps of an existing record
    async fn update(&self, record: &Record) -> RemoteResult<Record>;

    /// Set `deleted_at` on an existing record
    async fn soft_delete(&self, id: &RecordId, deleted_at_ms: i64) -> RemoteResult<Record>;
}

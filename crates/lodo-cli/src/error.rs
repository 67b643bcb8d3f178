use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] lodo_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No record title provided")]
    EmptyTitle,
    #[error("Record ID cannot be empty")]
    EmptyRecordId,
    #[error("Record not found for id/prefix: {0}")]
    RecordNotFound(String),
    #[error("{0}")]
    AmbiguousRecordId(String),
    #[error("Nothing to edit; pass --title, --done or --undone")]
    NothingToEdit,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Sync is not configured. Run `lodo config init --supabase-url <URL> --supabase-anon-key <KEY>`, or set LODO_SUPABASE_URL and LODO_SUPABASE_ANON_KEY."
    )]
    SyncNotConfigured,
}

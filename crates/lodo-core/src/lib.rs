//! lodo-core - Core library for lodo
//!
//! This crate contains the record model, the local libSQL store, the remote
//! store client and the offline-first sync engine used by every lodo client.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Record, RecordId, SyncStatus};

//! Database layer for lodo

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::{LibSqlRecordRepository, RecordRepository};

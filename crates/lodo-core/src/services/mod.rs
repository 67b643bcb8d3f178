//! Services shared by every lodo client

mod database;

pub use database::RecordService;

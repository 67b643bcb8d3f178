//! Shared record store service used across clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{Database, LibSqlRecordRepository, RecordRepository};
use crate::models::{Record, RecordId};
use crate::Result;

/// Thread-safe owner of the local database.
///
/// Every statement goes through one async mutex, which makes this the single
/// logical write path for the reconciler, the resolver and the sweeper. The
/// lock is held per statement, never across a network call.
#[derive(Clone)]
pub struct RecordService {
    db: Arc<Mutex<Database>>,
}

impl RecordService {
    /// Open the record store at the given filesystem path.
    ///
    /// A file that is not a valid database is moved aside and a fresh store is
    /// created in its place.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = match Database::open(&db_path).await {
            Ok(db) => db,
            Err(error) if Self::is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Local store at {} is unreadable ({}); starting from an empty store",
                    db_path.display(),
                    error
                );
                Self::quarantine_corrupted_db_files(&db_path)?;
                Database::open(&db_path).await?
            }
            Err(error) => return Err(error),
        };

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    fn is_corrupted_db_error(error: &crate::Error) -> bool {
        error
            .to_string()
            .to_ascii_lowercase()
            .contains("file is not a database")
    }

    fn quarantine_corrupted_db_files(db_path: &Path) -> Result<()> {
        if db_path.exists() {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let base_name = db_path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("lodo.db");
            let backup_path = db_path.with_file_name(format!("{base_name}.corrupt-{timestamp}"));

            std::fs::rename(db_path, &backup_path)?;
            tracing::warn!(
                "Moved corrupted local DB file from {} to {}",
                db_path.display(),
                backup_path.display()
            );
        }

        let Some(parent) = db_path.parent() else {
            return Ok(());
        };
        let Some(base_name) = db_path.file_name().and_then(|name| name.to_str()) else {
            return Ok(());
        };
        let sidecar_prefix = format!("{base_name}-");

        for entry in std::fs::read_dir(parent)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.starts_with(&sidecar_prefix) {
                let path = entry.path();
                std::fs::remove_file(&path)?;
                tracing::warn!("Removed stale local DB file {}", path.display());
            }
        }

        Ok(())
    }
}

impl RecordRepository for RecordService {
    async fn insert(&self, record: &Record) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlRecordRepository::new(db.connection())
            .insert(record)
            .await
    }

    async fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        let db = self.db.lock().await;
        LibSqlRecordRepository::new(db.connection()).get(id).await
    }

    async fn save(&self, record: &Record) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlRecordRepository::new(db.connection())
            .save(record)
            .await
    }

    async fn remove(&self, id: &RecordId) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlRecordRepository::new(db.connection())
            .remove(id)
            .await
    }

    async fn list_active(&self) -> Result<Vec<Record>> {
        let db = self.db.lock().await;
        LibSqlRecordRepository::new(db.connection())
            .list_active()
            .await
    }

    async fn list_trashed(&self) -> Result<Vec<Record>> {
        let db = self.db.lock().await;
        LibSqlRecordRepository::new(db.connection())
            .list_trashed()
            .await
    }

    async fn list_pending(&self) -> Result<Vec<Record>> {
        let db = self.db.lock().await;
        LibSqlRecordRepository::new(db.connection())
            .list_pending()
            .await
    }

    async fn list_expired(&self, cutoff_ms: i64) -> Result<Vec<Record>> {
        let db = self.db.lock().await;
        LibSqlRecordRepository::new(db.connection())
            .list_expired(cutoff_ms)
            .await
    }

    async fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        LibSqlRecordRepository::new(db.connection())
            .list_ids_by_prefix(prefix, limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn in_memory_insert_and_list_roundtrip() {
        let service = RecordService::open_in_memory().await.unwrap();

        let record = Record::new("hello core", 1_000);
        service.insert(&record).await.unwrap();

        let records = service.list_active().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "hello core");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn clones_share_the_same_store() {
        let service = RecordService::open_in_memory().await.unwrap();
        let other = service.clone();

        let record = Record::new("shared", 1_000);
        service.insert(&record).await.unwrap();
        assert!(other.get(&record.id).await.unwrap().is_some());
    }

    #[test]
    fn detects_corrupted_db_errors() {
        assert!(RecordService::is_corrupted_db_error(&crate::Error::Database(
            "SQLite failure: file is not a database".to_string()
        )));
        assert!(!RecordService::is_corrupted_db_error(
            &crate::Error::InvalidInput("title cannot be empty".to_string())
        ));
    }

    #[test]
    fn quarantine_moves_db_and_removes_sidecars() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("lodo.db");
        let shm_path = tmp.path().join("lodo.db-shm");
        let wal_path = tmp.path().join("lodo.db-wal");

        std::fs::write(&db_path, b"bad-db").unwrap();
        std::fs::write(&shm_path, b"shm").unwrap();
        std::fs::write(&wal_path, b"wal").unwrap();

        RecordService::quarantine_corrupted_db_files(&db_path).unwrap();

        assert!(!db_path.exists());
        assert!(!shm_path.exists());
        assert!(!wal_path.exists());

        let found_backup = std::fs::read_dir(tmp.path()).unwrap().any(|entry| {
            entry
                .unwrap()
                .file_name()
                .to_string_lossy()
                .starts_with("lodo.db.corrupt-")
        });
        assert!(found_backup);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open_path_recovers_from_garbage_file() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("lodo.db");
        std::fs::create_dir_all(db_path.parent().unwrap()).unwrap();
        std::fs::write(&db_path, vec![7u8; 4096]).unwrap();

        let service = RecordService::open_path(&db_path).await.unwrap();
        assert!(service.list_active().await.unwrap().is_empty());
    }
}

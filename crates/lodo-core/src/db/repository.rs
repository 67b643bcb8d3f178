//! Record repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use crate::error::{Error, Result};
use crate::models::{Record, RecordId, SyncStatus};
use libsql::{Connection, Row, Rows, Value};

const RECORD_COLUMNS: &str =
    "id, title, completed, created_at, updated_at, deleted_at, sync_status";

/// Local record store consumed by the sync engine (async)
#[allow(async_fn_in_trait)]
pub trait RecordRepository {
    /// Insert a new record
    async fn insert(&self, record: &Record) -> Result<()>;

    /// Get a record by ID, deleted or not
    async fn get(&self, id: &RecordId) -> Result<Option<Record>>;

    /// Persist every field of an existing record
    async fn save(&self, record: &Record) -> Result<()>;

    /// Permanently remove a record
    async fn remove(&self, id: &RecordId) -> Result<()>;

    /// Non-deleted records, newest created first
    async fn list_active(&self) -> Result<Vec<Record>>;

    /// Soft-deleted records, newest created first
    async fn list_trashed(&self) -> Result<Vec<Record>>;

    /// Records with an outstanding remote operation, oldest created first
    async fn list_pending(&self) -> Result<Vec<Record>>;

    /// Soft-deleted records whose `deleted_at` is older than `cutoff_ms`
    async fn list_expired(&self, cutoff_ms: i64) -> Result<Vec<Record>>;

    /// IDs starting with `prefix`, most recently updated first
    async fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;
}

/// libSQL implementation of `RecordRepository`
pub struct LibSqlRecordRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlRecordRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn query_records(
        &self,
        filter: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Record>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM records {filter}");
        let rows = self.conn.query(&sql, params).await?;
        collect_records(rows).await
    }
}

/// Parse a record from a database row
fn parse_record(row: &Row) -> Result<Record> {
    let id: String = row.get(0)?;
    let id = id
        .parse::<RecordId>()
        .map_err(|error| Error::Database(format!("invalid record id '{id}': {error}")))?;

    let deleted_at = match row.get_value(5)? {
        Value::Null => None,
        Value::Integer(value) => Some(value),
        other => {
            return Err(Error::Database(format!(
                "invalid deleted_at for record {id}: {other:?}"
            )))
        }
    };

    let code: i64 = row.get(6)?;
    let sync_status = SyncStatus::from_code(code).ok_or_else(|| {
        Error::Database(format!("unknown sync_status {code} for record {id}"))
    })?;

    Ok(Record::restore(
        id,
        row.get(1)?,
        row.get::<i64>(2)? != 0,
        row.get(3)?,
        row.get(4)?,
        deleted_at,
        sync_status,
    ))
}

async fn collect_records(mut rows: Rows) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    while let Some(row) = rows.next().await? {
        records.push(parse_record(&row)?);
    }
    Ok(records)
}

fn deleted_at_value(record: &Record) -> Value {
    record.deleted_at().map_or(Value::Null, Value::Integer)
}

impl RecordRepository for LibSqlRecordRepository<'_> {
    async fn insert(&self, record: &Record) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO records (id, title, completed, created_at, updated_at, deleted_at, sync_status)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                libsql::params![
                    record.id.as_str(),
                    record.title.as_str(),
                    i64::from(record.completed),
                    record.created_at,
                    record.updated_at(),
                    deleted_at_value(record),
                    record.sync_status().code()
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        let mut records = self
            .query_records("WHERE id = ?", libsql::params![id.as_str()])
            .await?;
        Ok(records.pop())
    }

    async fn save(&self, record: &Record) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE records
                 SET title = ?, completed = ?, updated_at = ?, deleted_at = ?, sync_status = ?
                 WHERE id = ?",
                libsql::params![
                    record.title.as_str(),
                    i64::from(record.completed),
                    record.updated_at(),
                    deleted_at_value(record),
                    record.sync_status().code(),
                    record.id.as_str()
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(record.id.to_string()));
        }
        Ok(())
    }

    async fn remove(&self, id: &RecordId) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM records WHERE id = ?",
                libsql::params![id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<Record>> {
        self.query_records(
            "WHERE deleted_at IS NULL ORDER BY created_at DESC, id DESC",
            (),
        )
        .await
    }

    async fn list_trashed(&self) -> Result<Vec<Record>> {
        self.query_records(
            "WHERE deleted_at IS NOT NULL ORDER BY created_at DESC, id DESC",
            (),
        )
        .await
    }

    async fn list_pending(&self) -> Result<Vec<Record>> {
        self.query_records(
            "WHERE sync_status != ? ORDER BY created_at ASC, id ASC",
            libsql::params![SyncStatus::Synced.code()],
        )
        .await
    }

    async fn list_expired(&self, cutoff_ms: i64) -> Result<Vec<Record>> {
        self.query_records(
            "WHERE deleted_at IS NOT NULL AND deleted_at < ? ORDER BY deleted_at ASC",
            libsql::params![cutoff_ms],
        )
        .await
    }

    async fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id FROM records WHERE substr(id, 1, ?) = ? ORDER BY updated_at DESC LIMIT ?",
                libsql::params![prefix.chars().count() as i64, prefix, limit as i64],
            )
            .await?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    const T0: i64 = 1_750_000_000_000;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn record_at(title: &str, created_at: i64) -> Record {
        Record::new(title, created_at)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_and_get() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        let record = record_at("Buy milk", T0);
        repo.insert(&record).await.unwrap();

        let fetched = repo.get(&record.id).await.unwrap().unwrap();
        assert_eq!(fetched, record);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_missing_returns_none() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());
        assert!(repo.get(&RecordId::new()).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_persists_status_and_timestamps() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        let mut record = record_at("Buy milk", T0);
        repo.insert(&record).await.unwrap();

        for status in SyncStatus::ALL {
            record.set_sync_status(status, T0 + 100);
            repo.save(&record).await.unwrap();
            let fetched = repo.get(&record.id).await.unwrap().unwrap();
            assert_eq!(fetched, record);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_missing_is_not_found() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        let error = repo.save(&record_at("ghost", T0)).await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_active_and_trash_split_by_deleted_at() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        let first = record_at("first", T0);
        let second = record_at("second", T0 + 1);
        let mut trashed = record_at("trashed", T0 + 2);
        trashed.set_sync_status(SyncStatus::PendingDelete, T0 + 3);

        for record in [&first, &second, &trashed] {
            repo.insert(record).await.unwrap();
        }

        let active = repo.list_active().await.unwrap();
        let titles: Vec<&str> = active.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);

        let trash = repo.list_trashed().await.unwrap();
        assert_eq!(trash.len(), 1);
        assert_eq!(trash[0].id, trashed.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_pending_skips_synced() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        let pending = record_at("pending", T0);
        let synced = Record::from_remote(RecordId::new(), "synced".into(), false, T0, T0, None);
        repo.insert(&pending).await.unwrap();
        repo.insert(&synced).await.unwrap();

        let listed = repo.list_pending().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, pending.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_expired_uses_strict_cutoff() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        let mut old = record_at("old", T0);
        old.set_sync_status(SyncStatus::PendingDelete, T0);
        let mut at_cutoff = record_at("at cutoff", T0);
        at_cutoff.set_sync_status(SyncStatus::PendingDelete, T0 + 10);
        let live = record_at("live", T0);

        for record in [&old, &at_cutoff, &live] {
            repo.insert(record).await.unwrap();
        }

        let expired = repo.list_expired(T0 + 10).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, old.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remove_deletes_row() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        let record = record_at("gone", T0);
        repo.insert(&record).await.unwrap();
        repo.remove(&record.id).await.unwrap();

        assert!(repo.get(&record.id).await.unwrap().is_none());
        assert!(matches!(
            repo.remove(&record.id).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_status_code_is_rejected() {
        let db = setup().await;
        db.connection()
            .execute(
                "INSERT INTO records (id, title, created_at, updated_at, sync_status)
                 VALUES ('11111111-1111-7111-8111-111111111111', 'x', 1, 1, 9)",
                (),
            )
            .await
            .unwrap();

        let repo = LibSqlRecordRepository::new(db.connection());
        let error = repo.list_active().await.unwrap_err();
        assert!(error.to_string().contains("unknown sync_status 9"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_ids_by_prefix() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        let a = Record::restore(
            "aaaaaaaa-aaaa-7aaa-8aaa-111111111111".parse().unwrap(),
            "a".into(),
            false,
            T0,
            T0,
            None,
            SyncStatus::PendingCreate,
        );
        let b = Record::restore(
            "aaaaaaaa-aaaa-7aaa-8aaa-222222222222".parse().unwrap(),
            "b".into(),
            false,
            T0,
            T0 + 1,
            None,
            SyncStatus::PendingCreate,
        );
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        let both = repo.list_ids_by_prefix("aaaaaaaa", 3).await.unwrap();
        assert_eq!(both, vec![b.id.to_string(), a.id.to_string()]);

        let one = repo
            .list_ids_by_prefix("aaaaaaaa-aaaa-7aaa-8aaa-1", 3)
            .await
            .unwrap();
        assert_eq!(one, vec![a.id.to_string()]);

        for pattern in ["%", "_", "aaaaaaaa%", "a_aaaaaa"] {
            let matched = repo.list_ids_by_prefix(pattern, 3).await.unwrap();
            assert!(matched.is_empty(), "{pattern} matched {matched:?}");
        }
    }
}

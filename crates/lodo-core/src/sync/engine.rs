//! Reconciliation pass and record mutations.

use crate::clock::Clock;
use crate::db::RecordRepository;
use crate::error::{Error, Result};
use crate::models::{Record, RecordId, SyncStatus};
use crate::remote::{RemoteError, RemoteResult, RemoteStore};
use crate::util::normalize_title;

use super::{
    InFlightGuard, RecordChanges, SkipReason, SyncEngine, SyncPass, SyncReport, OFFLINE_MESSAGE,
};

enum Merge {
    Inserted,
    Adopted,
    Unchanged,
}

impl<S, R, C> SyncEngine<S, R, C>
where
    S: RecordRepository,
    R: RemoteStore,
    C: Clock,
{
    /// Pull the remote snapshot, merge it in, then push every pending record.
    ///
    /// A pull failure aborts the pass before anything is committed. Push
    /// failures only mark the affected record `Failed`.
    pub async fn run_sync_pass(&self) -> Result<SyncPass> {
        if !self.connectivity.is_online() {
            self.notice.report(OFFLINE_MESSAGE);
            return Ok(SyncPass::Skipped(SkipReason::Offline));
        }
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("Sync pass already running; skipping");
            return Ok(SyncPass::Skipped(SkipReason::AlreadyRunning));
        };

        let remote_records = match self.remote.fetch_all().await {
            Ok(records) => records,
            Err(error) => {
                tracing::warn!("Sync pull failed: {error}");
                self.notice.report(error.user_message());
                return Err(Error::Pull(error));
            }
        };

        let mut report = SyncReport {
            pulled: remote_records.len(),
            ..SyncReport::default()
        };
        for remote in remote_records {
            match self.merge_remote(remote).await? {
                Merge::Inserted => report.inserted += 1,
                Merge::Adopted => report.adopted += 1,
                Merge::Unchanged => {}
            }
        }

        for record in self.store.list_pending().await? {
            let record = self.push(record).await?;
            match record.sync_status() {
                SyncStatus::Synced => report.pushed += 1,
                SyncStatus::Failed => report.failed += 1,
                _ => {}
            }
        }

        tracing::info!(
            "Sync pass complete: pulled {}, inserted {}, adopted {}, pushed {}, failed {}",
            report.pulled,
            report.inserted,
            report.adopted,
            report.pushed,
            report.failed
        );
        Ok(SyncPass::Completed(report))
    }

    async fn merge_remote(&self, remote: Record) -> Result<Merge> {
        let Some(mut local) = self.store.get(&remote.id).await? else {
            self.store.insert(&remote).await?;
            return Ok(Merge::Inserted);
        };

        if local.merge_pulled(&remote) {
            self.store.save(&local).await?;
            tracing::debug!("Adopted newer remote state for record {}", local.id);
            Ok(Merge::Adopted)
        } else {
            Ok(Merge::Unchanged)
        }
    }

    /// Send a pending record to the remote according to its status.
    pub(super) async fn push(&self, record: Record) -> Result<Record> {
        let result = match record.sync_status() {
            SyncStatus::Synced => return Ok(record),
            SyncStatus::Failed => return self.resolve(record).await,
            SyncStatus::PendingCreate => self.remote.create(&record).await,
            SyncStatus::PendingUpdate | SyncStatus::PendingRecovery => {
                self.remote.update(&record).await
            }
            SyncStatus::PendingDelete => {
                let deleted_at = record
                    .deleted_at()
                    .unwrap_or_else(|| self.clock.now_ms());
                match self.remote.soft_delete(&record.id, deleted_at).await {
                    // Never reached the remote: create it already deleted.
                    Err(RemoteError::NotFound(_)) => {
                        tracing::debug!(
                            "Record {} missing remotely; creating it as deleted",
                            record.id
                        );
                        self.remote.create(&record).await
                    }
                    result => result,
                }
            }
        };
        self.commit_push(record, result).await
    }

    /// Record the outcome of a remote write locally.
    pub(super) async fn commit_push(
        &self,
        mut record: Record,
        result: RemoteResult<Record>,
    ) -> Result<Record> {
        let now = self.clock.now_ms();
        match result {
            Ok(_) => {
                tracing::debug!(
                    "Pushed record {} ({})",
                    record.id,
                    record.sync_status()
                );
                record.set_sync_status(SyncStatus::Synced, now);
            }
            Err(error) => {
                tracing::warn!(
                    "Push of record {} ({}) failed: {error}",
                    record.id,
                    record.sync_status()
                );
                self.notice.report(error.user_message());
                record.set_sync_status(SyncStatus::Failed, now);
            }
        }
        self.store.save(&record).await?;
        Ok(record)
    }

    async fn push_if_online(&self, record: Record) -> Result<Record> {
        if self.connectivity.is_online() {
            self.push(record).await
        } else {
            Ok(record)
        }
    }

    async fn load(&self, id: &RecordId) -> Result<Record> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Record {id}")))
    }

    /// Create a record locally and push it when online.
    pub async fn create_record(&self, title: &str) -> Result<Record> {
        let title = normalize_title(title)
            .ok_or_else(|| Error::InvalidInput("Title cannot be empty".to_string()))?;
        let record = Record::new(title, self.clock.now_ms());
        self.store.insert(&record).await?;
        tracing::debug!("Created record {}", record.id);
        self.push_if_online(record).await
    }

    /// Edit a record's content.
    pub async fn update_record(&self, id: &RecordId, changes: RecordChanges) -> Result<Record> {
        let mut record = self.load(id).await?;
        if record.is_deleted() {
            return Err(Error::InvalidInput(format!(
                "Record {id} is in the trash; recover it first"
            )));
        }
        if changes.is_empty() {
            return Ok(record);
        }

        let title = match changes.title {
            Some(title) => Some(
                normalize_title(&title)
                    .ok_or_else(|| Error::InvalidInput("Title cannot be empty".to_string()))?,
            ),
            None => None,
        };
        record.apply_edit(title, changes.completed, self.clock.now_ms());
        self.store.save(&record).await?;
        self.push_if_online(record).await
    }

    /// Soft-delete a record. Deleting a trashed record is a no-op.
    pub async fn delete_record(&self, id: &RecordId) -> Result<Record> {
        let mut record = self.load(id).await?;
        if record.is_deleted() {
            return Ok(record);
        }
        record.set_sync_status(SyncStatus::PendingDelete, self.clock.now_ms());
        self.store.save(&record).await?;
        self.push_if_online(record).await
    }

    /// Bring a soft-deleted record back. Recovering a live record is a no-op.
    pub async fn recover_record(&self, id: &RecordId) -> Result<Record> {
        let mut record = self.load(id).await?;
        if !record.is_deleted() {
            return Ok(record);
        }
        record.set_sync_status(SyncStatus::PendingRecovery, self.clock.now_ms());
        self.store.save(&record).await?;
        self.push_if_online(record).await
    }

    pub async fn get_record(&self, id: &RecordId) -> Result<Option<Record>> {
        self.store.get(id).await
    }

    /// Records not in the trash, newest first.
    pub async fn list_records(&self) -> Result<Vec<Record>> {
        self.store.list_active().await
    }

    /// Soft-deleted records, newest first.
    pub async fn list_trash(&self) -> Result<Vec<Record>> {
        self.store.list_trashed().await
    }

    /// Full IDs starting with `prefix`, at most `limit` of them.
    pub async fn find_ids(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        self.store.list_ids_by_prefix(prefix, limit).await
    }
}

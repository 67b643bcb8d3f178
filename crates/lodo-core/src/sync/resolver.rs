//! Recovery of records whose last remote write failed.

use crate::clock::Clock;
use crate::db::RecordRepository;
use crate::error::{Error, Result};
use crate::models::{Record, RecordId, SyncStatus};
use crate::remote::RemoteStore;

use super::SyncEngine;

impl<S, R, C> SyncEngine<S, R, C>
where
    S: RecordRepository,
    R: RemoteStore,
    C: Clock,
{
    /// Re-probe the remote for a `Failed` record and retry the right write.
    ///
    /// Records in any other status, or any record while offline, come back
    /// unchanged.
    pub async fn resolve_record(&self, id: &RecordId) -> Result<Record> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Record {id}")))?;
        self.resolve(record).await
    }

    pub(super) async fn resolve(&self, mut record: Record) -> Result<Record> {
        if record.sync_status() != SyncStatus::Failed || !self.connectivity.is_online() {
            return Ok(record);
        }

        let remote = match self.remote.fetch_one(&record.id).await {
            Ok(remote) => remote,
            Err(error) => {
                tracing::warn!("Could not probe record {}: {error}", record.id);
                self.notice.report(error.user_message());
                return Ok(record);
            }
        };

        let now = self.clock.now_ms();
        match remote {
            None => {
                tracing::debug!("Record {} missing remotely; recreating", record.id);
                record.set_sync_status(SyncStatus::PendingCreate, now);
                self.store.save(&record).await?;
                let result = self.remote.create(&record).await;
                self.commit_push(record, result).await
            }
            Some(remote) if record.adopt_if_newer(&remote) => {
                tracing::debug!("Record {} resolved in favor of remote", record.id);
                self.store.save(&record).await?;
                Ok(record)
            }
            Some(_) => {
                tracing::debug!("Record {} resolved in favor of local", record.id);
                record.set_sync_status(SyncStatus::PendingUpdate, now);
                self.store.save(&record).await?;
                let result = self.remote.update(&record).await;
                self.commit_push(record, result).await
            }
        }
    }
}

//! Purging of soft-deleted records past the retention window.

use crate::clock::Clock;
use crate::db::RecordRepository;
use crate::remote::RemoteStore;

use super::SyncEngine;

impl<S, R, C> SyncEngine<S, R, C>
where
    S: RecordRepository,
    R: RemoteStore,
    C: Clock,
{
    /// Permanently remove local records soft-deleted before the retention
    /// cutoff. Returns how many were removed.
    ///
    /// Local only and best effort: store failures are logged and skipped.
    pub async fn sweep_expired(&self) -> usize {
        let cutoff = self.clock.now_ms().saturating_sub(self.config.retention_ms());
        let expired = match self.store.list_expired(cutoff).await {
            Ok(expired) => expired,
            Err(error) => {
                tracing::warn!("Retention sweep could not list expired records: {error}");
                return 0;
            }
        };

        let mut removed = 0;
        for record in expired {
            match self.store.remove(&record.id).await {
                Ok(()) => removed += 1,
                Err(error) => {
                    tracing::warn!("Retention sweep could not remove {}: {error}", record.id);
                }
            }
        }

        if removed > 0 {
            tracing::info!("Retention sweep removed {removed} expired records");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{EngineConfig, RETENTION_WINDOW};
    use crate::services::RecordService;
    use crate::state::Connectivity;
    use crate::sync::testing::{engine, Calls, FakeRemote, FaultyStore, T0};

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[tokio::test(flavor = "multi_thread")]
    async fn six_day_old_delete_is_purged() {
        let (engine, clock) = engine(false).await;
        let old = engine.create_record("old").await.unwrap();
        engine.delete_record(&old.id).await.unwrap();

        clock.advance(DAY * 2);
        let recent = engine.create_record("recent").await.unwrap();
        engine.delete_record(&recent.id).await.unwrap();
        let live = engine.create_record("live").await.unwrap();

        clock.advance(DAY * 4);
        let removed = engine.sweep_expired().await;

        assert_eq!(removed, 1);
        assert!(engine.get_record(&old.id).await.unwrap().is_none());
        assert!(engine.get_record(&recent.id).await.unwrap().is_some());
        assert!(engine.get_record(&live.id).await.unwrap().is_some());
        assert_eq!(engine.remote().calls(), Calls::default());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_within_window_survives_sweep_and_recovers() {
        let (engine, clock) = engine(false).await;
        let record = engine.create_record("keep").await.unwrap();
        engine.delete_record(&record.id).await.unwrap();

        clock.advance(DAY * 4);
        assert_eq!(engine.sweep_expired().await, 0);

        let recovered = engine.recover_record(&record.id).await.unwrap();
        assert_eq!(recovered.deleted_at(), None);
        assert_eq!(engine.list_records().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_exactly_at_window_edge_is_kept() {
        let (engine, clock) = engine(false).await;
        let record = engine.create_record("edge").await.unwrap();
        engine.delete_record(&record.id).await.unwrap();

        clock.advance(RETENTION_WINDOW);
        assert_eq!(engine.sweep_expired().await, 0);
        assert!(engine.get_record(&record.id).await.unwrap().is_some());

        clock.advance(Duration::from_millis(1));
        assert_eq!(engine.sweep_expired().await, 1);
        assert!(engine.get_record(&record.id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn retention_window_is_configurable() {
        let (engine, clock) = engine(false).await;
        let engine = engine.with_config(EngineConfig {
            retention: Duration::from_secs(60),
        });
        let record = engine.create_record("short lived").await.unwrap();
        engine.delete_record(&record.id).await.unwrap();

        clock.advance(Duration::from_secs(61));
        assert_eq!(engine.sweep_expired().await, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn store_failures_are_skipped() {
        let store = FaultyStore::new(RecordService::open_in_memory().await.unwrap());
        let clock = ManualClock::new(T0);
        let engine = SyncEngine::new(
            store,
            FakeRemote::new(),
            clock.clone(),
            Connectivity::offline(),
        );
        let record = engine.create_record("stuck").await.unwrap();
        engine.delete_record(&record.id).await.unwrap();
        clock.advance(DAY * 6);

        engine.store().fail_list_expired(true);
        assert_eq!(engine.sweep_expired().await, 0);

        engine.store().fail_list_expired(false);
        engine.store().fail_remove(true);
        assert_eq!(engine.sweep_expired().await, 0);
        assert!(engine.get_record(&record.id).await.unwrap().is_some());

        engine.store().fail_remove(false);
        assert_eq!(engine.sweep_expired().await, 1);
    }
}

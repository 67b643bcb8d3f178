//! In-memory test doubles for the sync engine.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::clock::ManualClock;
use crate::db::RecordRepository;
use crate::models::{Record, RecordId};
use crate::remote::{RemoteError, RemoteResult, RemoteStore};
use crate::services::RecordService;
use crate::state::Connectivity;
use crate::{Error, Result};

use super::SyncEngine;

pub const T0: i64 = 1_750_000_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub fetch_all: usize,
    pub fetch_one: usize,
    pub create: usize,
    pub update: usize,
    pub soft_delete: usize,
}

impl Calls {
    pub const fn writes(&self) -> usize {
        self.create + self.update + self.soft_delete
    }
}

/// Remote store kept in a map, with call counters and failure switches.
#[derive(Default)]
pub struct FakeRemote {
    records: Mutex<HashMap<RecordId, Record>>,
    calls: Mutex<Calls>,
    fail_pull: AtomicBool,
    fail_probe: AtomicBool,
    failing_writes: Mutex<HashSet<RecordId>>,
    gate: Option<Arc<Notify>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// `fetch_all` waits for a permit on `gate` before answering.
    pub fn with_gate(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn seed(&self, record: &Record) {
        self.records
            .lock()
            .unwrap()
            .insert(record.id, canonical(record, record.deleted_at()));
    }

    pub fn get(&self, id: &RecordId) -> Option<Record> {
        self.records.lock().unwrap().get(id).cloned()
    }

    pub fn calls(&self) -> Calls {
        *self.calls.lock().unwrap()
    }

    pub fn fail_pull(&self, fail: bool) {
        self.fail_pull.store(fail, Ordering::SeqCst);
    }

    pub fn fail_probe(&self, fail: bool) {
        self.fail_probe.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes_for(&self, id: RecordId) {
        self.failing_writes.lock().unwrap().insert(id);
    }

    fn count(&self, bump: impl FnOnce(&mut Calls)) {
        bump(&mut self.calls.lock().unwrap());
    }

    fn check_write(&self, id: &RecordId) -> RemoteResult<()> {
        if self.failing_writes.lock().unwrap().contains(id) {
            return Err(RemoteError::Api("simulated outage (503)".to_string()));
        }
        Ok(())
    }
}

fn canonical(record: &Record, deleted_at: Option<i64>) -> Record {
    Record::from_remote(
        record.id,
        record.title.clone(),
        record.completed,
        record.created_at,
        record.updated_at(),
        deleted_at,
    )
}

impl RemoteStore for FakeRemote {
    async fn fetch_all(&self) -> RemoteResult<Vec<Record>> {
        self.count(|calls| calls.fetch_all += 1);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_pull.load(Ordering::SeqCst) {
            return Err(RemoteError::Api("simulated outage (503)".to_string()));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|record| !record.is_deleted())
            .cloned()
            .collect())
    }

    async fn fetch_one(&self, id: &RecordId) -> RemoteResult<Option<Record>> {
        self.count(|calls| calls.fetch_one += 1);
        if self.fail_probe.load(Ordering::SeqCst) {
            return Err(RemoteError::Api("simulated outage (503)".to_string()));
        }
        Ok(self.get(id))
    }

    async fn create(&self, record: &Record) -> RemoteResult<Record> {
        self.count(|calls| calls.create += 1);
        self.check_write(&record.id)?;
        let stored = canonical(record, record.deleted_at());
        self.records.lock().unwrap().insert(record.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, record: &Record) -> RemoteResult<Record> {
        self.count(|calls| calls.update += 1);
        self.check_write(&record.id)?;
        let mut records = self.records.lock().unwrap();
        let existing = records
            .get_mut(&record.id)
            .ok_or_else(|| RemoteError::NotFound(record.id.to_string()))?;
        *existing = canonical(record, record.deleted_at());
        Ok(existing.clone())
    }

    async fn soft_delete(&self, id: &RecordId, deleted_at_ms: i64) -> RemoteResult<Record> {
        self.count(|calls| calls.soft_delete += 1);
        self.check_write(id)?;
        let mut records = self.records.lock().unwrap();
        let existing = records
            .get_mut(id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        *existing = canonical(existing, Some(deleted_at_ms));
        Ok(existing.clone())
    }
}

/// Local store wrapper whose sweeper-facing calls can be made to fail.
pub struct FaultyStore {
    inner: RecordService,
    fail_remove: AtomicBool,
    fail_list_expired: AtomicBool,
}

impl FaultyStore {
    pub const fn new(inner: RecordService) -> Self {
        Self {
            inner,
            fail_remove: AtomicBool::new(false),
            fail_list_expired: AtomicBool::new(false),
        }
    }

    pub fn fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }

    pub fn fail_list_expired(&self, fail: bool) {
        self.fail_list_expired.store(fail, Ordering::SeqCst);
    }
}

impl RecordRepository for FaultyStore {
    async fn insert(&self, record: &Record) -> Result<()> {
        self.inner.insert(record).await
    }

    async fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        self.inner.get(id).await
    }

    async fn save(&self, record: &Record) -> Result<()> {
        self.inner.save(record).await
    }

    async fn remove(&self, id: &RecordId) -> Result<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(Error::Database("disk I/O error".to_string()));
        }
        self.inner.remove(id).await
    }

    async fn list_active(&self) -> Result<Vec<Record>> {
        self.inner.list_active().await
    }

    async fn list_trashed(&self) -> Result<Vec<Record>> {
        self.inner.list_trashed().await
    }

    async fn list_pending(&self) -> Result<Vec<Record>> {
        self.inner.list_pending().await
    }

    async fn list_expired(&self, cutoff_ms: i64) -> Result<Vec<Record>> {
        if self.fail_list_expired.load(Ordering::SeqCst) {
            return Err(Error::Database("disk I/O error".to_string()));
        }
        self.inner.list_expired(cutoff_ms).await
    }

    async fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        self.inner.list_ids_by_prefix(prefix, limit).await
    }
}

pub type TestEngine = SyncEngine<RecordService, FakeRemote, ManualClock>;

/// Engine over an in-memory store and a fresh fake remote, clock at `T0`.
pub async fn engine(online: bool) -> (TestEngine, ManualClock) {
    engine_with(FakeRemote::new(), online).await
}

pub async fn engine_with(remote: FakeRemote, online: bool) -> (TestEngine, ManualClock) {
    let store = RecordService::open_in_memory().await.unwrap();
    let clock = ManualClock::new(T0);
    let engine = SyncEngine::new(store, remote, clock.clone(), Connectivity::new(online));
    (engine, clock)
}

//! Offline-first synchronization engine.
//!
//! [`SyncEngine`] owns the reconciliation pass (pull, merge-in, push-out),
//! the per-record mutation operations, the conflict resolver for `Failed`
//! records and the retention sweeper. Local state is always committed before
//! any remote call, so a failed or interrupted push never loses an edit.

mod engine;
mod resolver;
mod retention;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::db::RecordRepository;
use crate::remote::RemoteStore;
use crate::state::{Connectivity, ErrorNotice, SyncState};

/// Message reported when a sync is requested without connectivity
pub const OFFLINE_MESSAGE: &str = "No internet connection.";

/// Why a pass did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyRunning,
    Offline,
}

/// Counts gathered during one completed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records returned by the remote snapshot
    pub pulled: usize,
    /// Remote records that were new locally
    pub inserted: usize,
    /// Local records replaced by a strictly newer remote state
    pub adopted: usize,
    /// Pending records that reached `Synced`
    pub pushed: usize,
    /// Pending records left `Failed`
    pub failed: usize,
}

/// Outcome of [`SyncEngine::run_sync_pass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPass {
    Skipped(SkipReason),
    Completed(SyncReport),
}

/// User edit to an existing record. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordChanges {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl RecordChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }
}

/// Sync engine over a local store `S`, a remote store `R` and a clock `C`.
pub struct SyncEngine<S, R, C> {
    store: S,
    remote: R,
    clock: C,
    connectivity: Connectivity,
    notice: ErrorNotice,
    config: EngineConfig,
    in_flight: AtomicBool,
}

impl<S, R, C> SyncEngine<S, R, C>
where
    S: RecordRepository,
    R: RemoteStore,
    C: Clock,
{
    pub fn new(store: S, remote: R, clock: C, connectivity: Connectivity) -> Self {
        Self {
            store,
            remote,
            clock,
            connectivity,
            notice: ErrorNotice::new(),
            config: EngineConfig::default(),
            in_flight: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing notice (e.g. one a UI already observes).
    #[must_use]
    pub fn with_notice(mut self, notice: ErrorNotice) -> Self {
        self.notice = notice;
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    pub const fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub const fn notice(&self) -> &ErrorNotice {
        &self.notice
    }

    /// Coarse state for status indicators.
    pub fn state(&self) -> SyncState {
        if !self.connectivity.is_online() {
            SyncState::Offline
        } else if self.in_flight.load(Ordering::SeqCst) {
            SyncState::Syncing
        } else if self.notice.current().is_some() {
            SyncState::Error
        } else {
            SyncState::Synced
        }
    }
}

/// Holds the in-flight flag for the lifetime of a pass.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

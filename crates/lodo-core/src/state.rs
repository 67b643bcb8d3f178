//! Shared cross-platform state types.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Coarse sync state for status indicators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Offline,
    Syncing,
    Synced,
    Error,
}

/// Network reachability signal consumed by the sync engine.
///
/// Cloning shares the flag, so whoever watches the network can flip it while
/// the engine reads it.
#[derive(Clone, Debug)]
pub struct Connectivity {
    online: Arc<AtomicBool>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn online() -> Self {
        Self::new(true)
    }

    pub fn offline() -> Self {
        Self::new(false)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::online()
    }
}

/// Most recent user-facing error, shown once and cleared on acknowledgment.
#[derive(Clone, Debug, Default)]
pub struct ErrorNotice {
    message: Arc<Mutex<Option<String>>>,
}

impl ErrorNotice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending message.
    pub fn report(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("Error notice: {message}");
        *self.message.lock().unwrap_or_else(PoisonError::into_inner) = Some(message);
    }

    /// Peek at the pending message without clearing it.
    pub fn current(&self) -> Option<String> {
        self.message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Take the pending message, clearing it.
    pub fn acknowledge(&self) -> Option<String> {
        self.message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_clones_share_flag() {
        let signal = Connectivity::offline();
        let watcher = signal.clone();
        assert!(!signal.is_online());

        watcher.set_online(true);
        assert!(signal.is_online());
    }

    #[test]
    fn notice_keeps_latest_message_until_acknowledged() {
        let notice = ErrorNotice::new();
        assert_eq!(notice.current(), None);

        notice.report("first");
        notice.report("second");
        assert_eq!(notice.current().as_deref(), Some("second"));

        assert_eq!(notice.acknowledge().as_deref(), Some("second"));
        assert_eq!(notice.acknowledge(), None);
    }
}

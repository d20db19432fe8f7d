//! Per-source mutual exclusion.
//!
//! Two requests that resolve to the same source id would otherwise write the
//! same acquisition path concurrently. Holding a [`SourceGuard`] across
//! acquire, tag and finalize serializes them. Map entries are removed when
//! the last holder or waiter lets go, so the map only holds ids in use.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct SourceLocks {
    entries: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `source_id`.
    pub async fn lock(&self, source_id: &str) -> SourceGuard<'_> {
        let entry = {
            let mut entries = self.entries.lock();
            entries
                .entry(source_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let guard = entry.lock_owned().await;
        SourceGuard {
            locks: self,
            source_id: source_id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of ids currently locked or awaited
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive hold on one source id; released on drop.
pub struct SourceGuard<'a> {
    locks: &'a SourceLocks,
    source_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SourceGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        // Waiters hold a clone of the Arc, so a count of 1 means only the map
        // refers to it.
        let mut entries = self.locks.entries.lock();
        if entries
            .get(&self.source_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            entries.remove(&self.source_id);
        }
    }
}

// ── Doorphone snapshot store ──
//
// Last successfully fetched doorphone list, with O(1) lookups by id and
// push-based change notification via `watch` channels. A failed refresh
// never touches it, so consumers keep the previous list.

mod refresh;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;

use ufanet_api::{Doorphone, DoorphoneId};

pub use refresh::SnapshotDiff;

/// Reactive storage for one account's doorphones.
pub struct DoorphoneStore {
    /// Primary storage: doorphone id -> descriptor.
    by_id: DashMap<DoorphoneId, Arc<Doorphone>>,

    /// Full snapshot in portal order, rebuilt on every applied refresh.
    snapshot: watch::Sender<Arc<Vec<Arc<Doorphone>>>>,

    /// When the last refresh was applied.
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl DoorphoneStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let (last_refresh, _) = watch::channel(None);

        Self {
            by_id: DashMap::new(),
            snapshot,
            last_refresh,
        }
    }

    /// Look up a doorphone by id.
    pub fn get(&self, id: &DoorphoneId) -> Option<Arc<Doorphone>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Current snapshot, in the order the portal returned it.
    pub fn snapshot(&self) -> Arc<Vec<Arc<Doorphone>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<Doorphone>>>> {
        self.snapshot.subscribe()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Drop everything (account unload). Returns the removed doorphones.
    pub fn clear(&self) -> Vec<Arc<Doorphone>> {
        let removed = self.snapshot.send_replace(Arc::new(Vec::new()));
        self.by_id.clear();
        self.last_refresh.send_replace(None);
        removed.iter().cloned().collect()
    }
}

impl Default for DoorphoneStore {
    fn default() -> Self {
        Self::new()
    }
}

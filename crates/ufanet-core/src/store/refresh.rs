// ── Refresh application logic ──
//
// Applies a freshly fetched doorphone list to the store with
// upsert-then-prune, reporting what changed so the host can register
// and deregister entities incrementally.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use ufanet_api::{Doorphone, DoorphoneId};

use super::DoorphoneStore;

/// What a refresh changed, relative to the previous snapshot.
#[derive(Debug, Default, Clone)]
pub struct SnapshotDiff {
    /// Ids not present before.
    pub added: Vec<Arc<Doorphone>>,
    /// Known ids whose portal data changed (e.g. renamed).
    pub updated: Vec<Arc<Doorphone>>,
    /// Ids no longer returned by the portal.
    pub removed: Vec<Arc<Doorphone>>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

impl DoorphoneStore {
    /// Apply a full doorphone list.
    ///
    /// Upserts every incoming doorphone, then prunes ids missing from the
    /// list. This avoids the brief empty state a clear-then-insert would
    /// expose to subscribers. Duplicate ids keep their first occurrence.
    pub fn apply_snapshot(&self, incoming: Vec<Doorphone>) -> SnapshotDiff {
        let mut diff = SnapshotDiff::default();
        let mut seen: HashSet<DoorphoneId> = HashSet::with_capacity(incoming.len());
        let mut ordered = Vec::with_capacity(incoming.len());

        for doorphone in incoming {
            if !seen.insert(doorphone.id.clone()) {
                continue;
            }
            let doorphone = Arc::new(doorphone);
            match self.by_id.insert(doorphone.id.clone(), Arc::clone(&doorphone)) {
                None => diff.added.push(Arc::clone(&doorphone)),
                Some(previous) if *previous != *doorphone => {
                    diff.updated.push(Arc::clone(&doorphone));
                }
                Some(_) => {}
            }
            ordered.push(doorphone);
        }

        // Collect first: removing while iterating a DashMap deadlocks.
        let stale: Vec<DoorphoneId> = self
            .by_id
            .iter()
            .filter(|entry| !seen.contains(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        for id in stale {
            if let Some((_, doorphone)) = self.by_id.remove(&id) {
                diff.removed.push(doorphone);
            }
        }

        self.snapshot.send_replace(Arc::new(ordered));
        self.last_refresh.send_replace(Some(Utc::now()));
        diff
    }
}

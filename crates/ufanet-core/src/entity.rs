// ── Host-facing entity interface ──
//
// The capability set a home-automation host needs from a lock, plus the
// registration callback the refresh loop reports into. Hosts bind these
// to their own entity registry.

use std::future::Future;

use serde::Serialize;

use crate::doorphone::DoorphoneController;

/// Result of a single open request.
///
/// Opening never fails loudly: the host's dispatch loop only ever sees
/// one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OpenOutcome {
    /// The portal confirmed the door was released.
    Opened,
    /// The portal answered but did not confirm (`result` false or absent).
    Rejected,
    /// The request failed (login, transport, or unexpected status).
    Failed { reason: String },
}

impl OpenOutcome {
    pub fn is_opened(&self) -> bool {
        matches!(self, Self::Opened)
    }
}

/// A controllable lock as seen by the host.
pub trait LockEntity {
    /// Human-readable name.
    fn name(&self) -> &str;

    /// Stable registry key. Pure function of the underlying device id.
    fn unique_id(&self) -> String;

    /// Current lock state.
    fn is_locked(&self) -> bool;

    /// Release the lock.
    fn open(&self) -> impl Future<Output = OpenOutcome> + Send;
}

/// Host callback receiving entity registrations from the refresh loop.
///
/// `add_entities` receives new doorphones and doorphones whose portal
/// data changed; a unique id the host already knows replaces the old
/// entity. `remove_entities` receives unique ids.
pub trait EntitySink: Send + Sync {
    fn add_entities(&self, entities: Vec<DoorphoneController>);

    fn remove_entities(&self, unique_ids: &[String]);
}

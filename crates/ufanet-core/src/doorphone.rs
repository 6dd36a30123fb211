// ── Doorphone lock entity ──
//
// One controller per doorphone. Doorphones are stateless actuators: the
// portal reports no locked/unlocked state, so the entity is perpetually
// unlocked and "open" is the only action.

use std::sync::Arc;

use tracing::{debug, error, info};

use ufanet_api::{Doorphone, DoorphoneId, SessionClient};

use crate::entity::{LockEntity, OpenOutcome};

/// Prefix of every doorphone's registry key.
pub const UNIQUE_ID_PREFIX: &str = "ufanet_doorphone_";

/// Registry key for a doorphone id.
pub fn unique_id_for(id: &DoorphoneId) -> String {
    format!("{UNIQUE_ID_PREFIX}{id}")
}

/// Host-visible control surface for a single doorphone.
///
/// Cheap to clone; every controller of an account shares one
/// [`SessionClient`].
#[derive(Debug, Clone)]
pub struct DoorphoneController {
    client: Arc<SessionClient>,
    doorphone: Arc<Doorphone>,
}

impl DoorphoneController {
    pub fn new(client: Arc<SessionClient>, doorphone: impl Into<Arc<Doorphone>>) -> Self {
        Self {
            client,
            doorphone: doorphone.into(),
        }
    }

    /// The descriptor this controller was built from.
    pub fn doorphone(&self) -> &Doorphone {
        &self.doorphone
    }

    pub fn id(&self) -> &DoorphoneId {
        &self.doorphone.id
    }
}

impl LockEntity for DoorphoneController {
    fn name(&self) -> &str {
        self.doorphone.display_name()
    }

    fn unique_id(&self) -> String {
        unique_id_for(&self.doorphone.id)
    }

    fn is_locked(&self) -> bool {
        false
    }

    async fn open(&self) -> OpenOutcome {
        debug!(id = %self.id(), "unlocking doorphone");
        match self.client.open_doorphone(self.id()).await {
            Ok(true) => {
                info!(name = self.name(), id = %self.id(), "doorphone opened");
                OpenOutcome::Opened
            }
            Ok(false) => {
                error!(
                    name = self.name(),
                    id = %self.id(),
                    "portal did not confirm doorphone open"
                );
                OpenOutcome::Rejected
            }
            Err(e) => {
                error!(name = self.name(), id = %self.id(), error = %e, "failed to open doorphone");
                OpenOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

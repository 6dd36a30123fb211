// Doorphone endpoints
//
// `GET /api/v0/skud/shared` lists every doorphone shared with the
// account; `GET /api/v0/skud/shared/{id}/open/` releases one lock.
// Both go through the session helper and its one-shot retry.

use tracing::debug;
use url::Url;

use crate::client::SessionClient;
use crate::error::{Error, Operation};
use crate::models::{Doorphone, DoorphoneId, OpenResponse};

/// Doorphone list endpoint.
pub const DOORPHONES_PATH: &str = "/api/v0/skud/shared";

impl SessionClient {
    /// List all doorphones the account has access to, in portal order.
    ///
    /// Logs in first if there is no session yet.
    pub async fn list_doorphones(&self) -> Result<Vec<Doorphone>, Error> {
        let url = self.endpoint(DOORPHONES_PATH)?;
        debug!("listing doorphones");
        let resp = self.get_with_session(url, Operation::Fetch).await?;
        let doorphones: Vec<Doorphone> = Self::parse_json(resp, Operation::Fetch).await?;
        debug!(count = doorphones.len(), "fetched doorphones");
        Ok(doorphones)
    }

    /// Open a doorphone and return whether the portal confirmed it.
    ///
    /// The id is not checked against the last listing. A response
    /// without `result` counts as `false`.
    pub async fn open_doorphone(&self, id: &DoorphoneId) -> Result<bool, Error> {
        let url = self.open_url(id)?;
        debug!(%id, "opening doorphone");
        let resp = self.get_with_session(url, Operation::Open).await?;
        let body: OpenResponse = Self::parse_json(resp, Operation::Open).await?;
        Ok(body.opened())
    }

    /// `{base}/api/v0/skud/shared/{id}/open/`, with `id` percent-encoded.
    fn open_url(&self, id: &DoorphoneId) -> Result<Url, Error> {
        let mut url = self.endpoint(DOORPHONES_PATH)?;
        url.path_segments_mut()
            .map_err(|()| Operation::Open.error(None, "portal URL cannot carry a path"))?
            .push(id.as_str())
            .push("open")
            .push("");
        Ok(url)
    }
}

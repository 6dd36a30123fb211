// Portal authentication
//
// Form-encoded login against `/login/`. On success the portal sets the
// session cookies in the client's jar; subsequent requests carry them
// automatically.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::{SessionClient, preview};
use crate::error::{Error, Operation};

/// Login form endpoint.
pub const LOGIN_PATH: &str = "/login/";

/// Where the portal would send a browser after login. The form requires
/// it even though the client never follows it by hand.
pub const LOGIN_NEXT: &str = "/office/skud/";

/// Account credentials for the portal.
///
/// `contract` is the subscriber contract number printed on the Ufanet
/// agreement; it doubles as the login name.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub contract: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(contract: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl SessionClient {
    /// Submit the login form once.
    ///
    /// `POST /login/` with `next`, `contract`, `password`. Only HTTP 200
    /// counts as success. Session bookkeeping is the caller's job; see
    /// [`authenticate`](SessionClient::authenticate).
    pub(crate) async fn login(&self) -> Result<(), Error> {
        let url = self.endpoint(LOGIN_PATH)?;
        let credentials = self.credentials();

        debug!(%url, contract = %credentials.contract, "logging in");

        let form = [
            ("next", LOGIN_NEXT),
            ("contract", credentials.contract.as_str()),
            ("password", credentials.password.expose_secret()),
        ];

        let resp = self
            .http()
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Operation::Login.transport(&e))?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(Operation::Login.error(
                Some(status.as_u16()),
                format!("portal rejected login: {}", preview(&body)),
            ));
        }

        debug!("login successful");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials::new("100200300", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("100200300"));
        assert!(!rendered.contains("hunter2"));
    }
}

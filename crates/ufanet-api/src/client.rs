// Portal session client
//
// Wraps `reqwest::Client` with the portal's cookie-session lifecycle:
// lazy login, reactive re-authentication on 401, and a single retry of
// the rejected call. Endpoint methods (login, doorphones) live in
// separate files as inherent impls to keep this module focused on
// session and transport mechanics.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use reqwest::StatusCode;
use reqwest::cookie::{CookieStore, Jar};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::Credentials;
use crate::error::{Error, Operation};
use crate::transport::TransportConfig;

/// Production portal root.
pub const DEFAULT_BASE_URL: &str = "https://dom.ufanet.ru";

/// Longest response-body excerpt carried in error messages.
const BODY_PREVIEW_LEN: usize = 200;

/// Local view of the server-side session.
///
/// The portal has no refresh tokens, so expiry is only ever discovered
/// through a 401. `generation` counts successful logins and `attempts`
/// counts finished logins of either outcome. A caller snapshots both as
/// a [`Ticket`] before queueing on the gate, so it can tell whether a
/// login finished while it waited and share that login's result instead
/// of sending its own.
#[derive(Debug, Default)]
struct Session {
    /// Held for the whole login request: at most one login in flight.
    /// Guards the failure of the latest attempt, if it failed.
    login_gate: Mutex<Option<FailedLogin>>,
    attempts: AtomicU64,
    generation: AtomicU64,
    established: AtomicBool,
}

/// Rejection of the latest login, replayed to the callers that queued
/// behind it.
#[derive(Debug, Clone)]
struct FailedLogin {
    status: Option<u16>,
    message: String,
}

impl FailedLogin {
    fn from_error(err: &Error) -> Option<Self> {
        match err {
            Error::Authentication { status, message } => Some(Self {
                status: *status,
                message: message.clone(),
            }),
            _ => None,
        }
    }

    fn to_error(&self) -> Error {
        Operation::Login.error(self.status, self.message.clone())
    }
}

/// Session counters as a caller saw them before waiting for a login.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    generation: u64,
    attempts: u64,
}

/// Authenticated client for one Ufanet account.
///
/// Share it behind an `Arc`: every doorphone of the account goes through
/// the same session. All methods take `&self`.
#[derive(Debug)]
pub struct SessionClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    session: Session,
    /// Cookie jar reference for inspecting the session cookies.
    cookie_jar: Option<Arc<Jar>>,
}

impl SessionClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// If the config doesn't already include a cookie jar, one is created
    /// automatically (the portal session lives in cookies).
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config.cookie_jar.clone();
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            credentials,
            session: Session::default(),
            cookie_jar,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for giving it a cookie store; without
    /// one the portal will answer 401 after every login.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
            session: Session::default(),
            cookie_jar: None,
        }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The portal base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The credentials this client logs in with.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Whether a session is currently believed valid.
    ///
    /// `true` after a successful login until the portal rejects a call
    /// with 401 or [`invalidate_session`](Self::invalidate_session) runs.
    pub fn has_session(&self) -> bool {
        self.session.established.load(Ordering::SeqCst)
    }

    /// Forget the current session; the next call logs in again.
    pub fn invalidate_session(&self) {
        debug!("session invalidated");
        self.session.established.store(false, Ordering::SeqCst);
    }

    /// The `Cookie` header value the jar would send to the portal.
    ///
    /// `None` for clients built with [`with_client`](Self::with_client)
    /// or before the portal set any cookie.
    pub fn cookie_header(&self) -> Option<String> {
        let jar = self.cookie_jar.as_ref()?;
        let cookies = jar.cookies(&self.base_url)?;
        cookies.to_str().ok().map(String::from)
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Log in with the stored credentials.
    ///
    /// A call that has to wait for another task's in-flight login does
    /// not log in a second time: it shares that login's result, success
    /// or failure. Fails with [`Error::Authentication`]; never retries.
    pub async fn authenticate(&self) -> Result<(), Error> {
        self.login_after(self.ticket()).await.map(|_| ())
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            generation: self.session.generation.load(Ordering::SeqCst),
            attempts: self.session.attempts.load(Ordering::SeqCst),
        }
    }

    /// Return a ticket for a usable session, logging in first if there
    /// is none.
    async fn ensure_session(&self) -> Result<Ticket, Error> {
        let ticket = self.ticket();
        if self.has_session() {
            return Ok(ticket);
        }
        let generation = self.login_after(ticket).await?;
        Ok(Ticket { generation, ..ticket })
    }

    /// Log in unless a login sent after `ticket` was taken already
    /// settled the question.
    async fn login_after(&self, ticket: Ticket) -> Result<u64, Error> {
        let mut last_failure = self.session.login_gate.lock().await;

        let current = self.session.generation.load(Ordering::SeqCst);
        if current != ticket.generation && self.has_session() {
            trace!(generation = current, "reusing session from concurrent login");
            return Ok(current);
        }
        if self.session.attempts.load(Ordering::SeqCst) != ticket.attempts {
            if let Some(failed) = last_failure.as_ref() {
                debug!("concurrent login was rejected, not retrying");
                return Err(failed.to_error());
            }
        }

        let result = self.login().await;
        self.session.attempts.fetch_add(1, Ordering::SeqCst);
        if let Err(err) = result {
            *last_failure = FailedLogin::from_error(&err);
            return Err(err);
        }
        *last_failure = None;

        self.session.established.store(true, Ordering::SeqCst);
        let generation = self.session.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "session established");
        Ok(generation)
    }

    /// Mark the session generation `seen` as rejected by the portal.
    ///
    /// A newer generation is left alone: a concurrent caller already
    /// replaced the session this request was using.
    fn expire(&self, seen: u64) {
        if self.session.generation.load(Ordering::SeqCst) == seen {
            self.session.established.store(false, Ordering::SeqCst);
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a portal path (`path` starts with `/`).
    ///
    /// Concatenates rather than joins so a base URL with a path prefix
    /// (reverse proxy) keeps its prefix.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET with the one-shot re-authentication
    /// policy.
    ///
    /// A 401 triggers exactly one re-login followed by exactly one
    /// retry. A second 401 fails with `op`'s error category. Any other
    /// response is returned as-is for the caller to interpret.
    pub(crate) async fn get_with_session(
        &self,
        url: Url,
        op: Operation,
    ) -> Result<reqwest::Response, Error> {
        let ticket = self.ensure_session().await?;

        let resp = self.send_get(&url, op).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        warn!(%url, "session expired, re-authenticating");
        self.expire(ticket.generation);
        let generation = self.login_after(ticket).await?;

        let resp = self.send_get(&url, op).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            self.expire(generation);
            return Err(op.error(
                Some(StatusCode::UNAUTHORIZED.as_u16()),
                "session rejected again after re-authentication",
            ));
        }
        Ok(resp)
    }

    async fn send_get(&self, url: &Url, op: Operation) -> Result<reqwest::Response, Error> {
        debug!("GET {}", url);
        self.http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| op.transport(&e))
    }

    /// Require HTTP 200 and decode the JSON body.
    pub(crate) async fn parse_json<T: DeserializeOwned>(
        resp: reqwest::Response,
        op: Operation,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(op.error(
                Some(status.as_u16()),
                format!("unexpected response: {}", preview(&body)),
            ));
        }

        let body = resp.text().await.map_err(|e| op.transport(&e))?;
        serde_json::from_str(&body).map_err(|e| {
            op.error(
                Some(status.as_u16()),
                format!("invalid response body: {e} (body preview: {:?})", preview(&body)),
            )
        })
    }
}

/// Truncate a body for inclusion in an error message (char-boundary safe).
pub(crate) fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

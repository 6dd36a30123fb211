// ── Core error types ──
//
// User-facing errors from ufanet-core. The `From<ufanet_api::Error>`
// impl keeps the portal's three failure categories (login, list, open)
// intact so callers can tell a credential problem from a flaky portal.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Portal errors ────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        message: String,
        /// HTTP status code, `None` when the portal was unreachable.
        status: Option<u16>,
    },

    #[error("Could not fetch doorphones: {message}")]
    FetchFailed {
        message: String,
        status: Option<u16>,
    },

    #[error("Could not open doorphone: {message}")]
    OpenFailed {
        message: String,
        status: Option<u16>,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Doorphone not found: {id}")]
    DoorphoneNotFound { id: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Account is already set up; unload it first")]
    AlreadySetUp,
}

impl CoreError {
    /// HTTP status code behind a portal error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed { status, .. }
            | Self::FetchFailed { status, .. }
            | Self::OpenFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns `true` if the portal never answered (connection refused,
    /// DNS failure, timeout).
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed { status: None, .. }
                | Self::FetchFailed { status: None, .. }
                | Self::OpenFailed { status: None, .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ufanet_api::Error> for CoreError {
    fn from(err: ufanet_api::Error) -> Self {
        match err {
            ufanet_api::Error::Authentication { status, message } => {
                CoreError::AuthenticationFailed { message, status }
            }
            ufanet_api::Error::Fetch { status, message } => {
                CoreError::FetchFailed { message, status }
            }
            ufanet_api::Error::Open { status, message } => {
                CoreError::OpenFailed { message, status }
            }
            ufanet_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ufanet_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
        }
    }
}

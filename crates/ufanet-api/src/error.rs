use thiserror::Error;

/// Top-level error type for the `ufanet-api` crate.
///
/// Every portal operation fails into exactly one category: the login,
/// the doorphone list, or the open command. Transport failures
/// (connection refused, timeouts) are folded into the category of the
/// operation that triggered them; `status` is `None` in that case.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (bad contract/password) or the portal is unreachable.
    #[error("Authentication failed{}: {message}", fmt_status(.status))]
    Authentication { status: Option<u16>, message: String },

    // ── Doorphone operations ────────────────────────────────────────
    /// Listing doorphones failed after the one-shot re-authentication.
    #[error("Failed to fetch doorphones{}: {message}", fmt_status(.status))]
    Fetch { status: Option<u16>, message: String },

    /// Opening a doorphone failed after the one-shot re-authentication.
    #[error("Failed to open doorphone{}: {message}", fmt_status(.status))]
    Open { status: Option<u16>, message: String },

    // ── Client construction ─────────────────────────────────────────
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),
}

#[allow(clippy::ref_option)]
fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl Error {
    /// HTTP status code that caused the failure, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. }
            | Self::Fetch { status, .. }
            | Self::Open { status, .. } => *status,
            Self::InvalidUrl(_) | Self::Tls(_) => None,
        }
    }

    /// Returns `true` if the portal answered 401.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Returns `true` if no response was received at all (connection
    /// refused, DNS failure, timeout). Such failures are worth retrying
    /// on the next refresh cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Authentication { status: None, .. }
                | Self::Fetch { status: None, .. }
                | Self::Open { status: None, .. }
        )
    }
}

/// Which portal operation a request belongs to.
///
/// Used by the request helpers to fold transport and status failures
/// into the right [`Error`] category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Login,
    Fetch,
    Open,
}

impl Operation {
    pub(crate) fn error(self, status: Option<u16>, message: impl Into<String>) -> Error {
        let message = message.into();
        match self {
            Self::Login => Error::Authentication { status, message },
            Self::Fetch => Error::Fetch { status, message },
            Self::Open => Error::Open { status, message },
        }
    }

    /// Fold a `reqwest` failure into this operation's category.
    pub(crate) fn transport(self, err: &reqwest::Error) -> Error {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else if err.is_connect() {
            format!("cannot connect to portal: {err}")
        } else {
            err.to_string()
        };
        self.error(err.status().map(|s| s.as_u16()), message)
    }
}

// ── Runtime account configuration ──
//
// These types describe *how* to reach the portal for one account.
// They carry credential data and connection tuning, but never touch disk.
// The CLI (or any other host) constructs an `AccountConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use ufanet_api::{Credentials, DEFAULT_BASE_URL, TlsMode, TransportConfig};

/// Default doorphone list refresh cadence.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). The production portal has a public cert.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed test portals / proxies).
    DangerAcceptInvalid,
}

/// Configuration for one Ufanet account.
///
/// Built by the host, passed to [`Account`](crate::Account) -- core never
/// reads config files.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Portal root (defaults to `https://dom.ufanet.ru`).
    pub base_url: Url,
    /// Contract number used as the login name.
    pub contract: String,
    pub password: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How often the doorphone list is refreshed. `ZERO` = never.
    pub refresh_interval: Duration,
}

impl AccountConfig {
    /// Config for the production portal with default tuning.
    pub fn new(contract: impl Into<String>, password: SecretString) -> Self {
        Self {
            base_url: default_base_url(),
            contract: contract.into(),
            password,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    pub(crate) fn credentials(&self) -> Credentials {
        Credentials {
            contract: self.contract.clone(),
            password: self.password.clone(),
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
            cookie_jar: None,
        }
    }
}

/// The production portal URL.
pub fn default_base_url() -> Url {
    #[allow(clippy::expect_used)]
    Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL")
}

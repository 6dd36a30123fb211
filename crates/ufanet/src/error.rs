//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use ufanet_config::ConfigError;
use ufanet_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const OPEN: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Ufanet portal")]
    #[diagnostic(
        code(ufanet::connection_failed),
        help(
            "{message}\n\
             Check network access, or point --base-url at another portal.\n\
             Slow connections may need a larger --timeout."
        )
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(ufanet::auth_failed),
        help(
            "Verify your contract number and password.\n\
             Run: ufanet config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(ufanet::no_credentials),
        help(
            "Configure credentials with: ufanet config init\n\
             Or set UFANET_CONTRACT and UFANET_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Portal ───────────────────────────────────────────────────────
    #[error("Portal request failed: {message}")]
    #[diagnostic(code(ufanet::portal_error))]
    Portal { message: String },

    // ── Doorphones ───────────────────────────────────────────────────
    #[error("Doorphone '{identifier}' not found")]
    #[diagnostic(
        code(ufanet::not_found),
        help("Run: ufanet doors list to see available doorphones")
    )]
    NotFound { identifier: String },

    #[error("Doorphone '{id}' did not confirm the open command")]
    #[diagnostic(code(ufanet::open_rejected))]
    OpenRejected { id: String },

    #[error("Could not open doorphone '{id}': {reason}")]
    #[diagnostic(code(ufanet::open_failed))]
    OpenFailed { id: String, reason: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ufanet::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(ufanet::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: ufanet config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(ufanet::no_config),
        help(
            "Create one with: ufanet config init\n\
             Expected at: {path}\n\
             Or pass --contract with UFANET_PASSWORD set."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(ufanet::config))]
    Config(Box<ConfigError>),

    #[error("Internal error: {0}")]
    #[diagnostic(code(ufanet::internal))]
    Internal(String),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::OpenRejected { .. } | Self::OpenFailed { .. } => exit_code::OPEN,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        if err.is_unreachable() {
            return CliError::ConnectionFailed {
                message: err.to_string(),
            };
        }

        match err {
            CoreError::AuthenticationFailed { message, .. } => CliError::AuthFailed { message },

            err @ (CoreError::FetchFailed { .. } | CoreError::OpenFailed { .. }) => {
                CliError::Portal {
                    message: err.to_string(),
                }
            }

            CoreError::DoorphoneNotFound { id } => CliError::NotFound { identifier: id },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            err @ CoreError::AlreadySetUp => CliError::Internal(err.to_string()),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}

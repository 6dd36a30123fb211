//! CLI configuration: thin wrapper around `ufanet_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--contract, --base-url, etc.).

use std::time::Duration;

use secrecy::SecretString;

use ufanet_core::{AccountConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use ufanet_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Build an `AccountConfig` from the config file, profile, and CLI overrides.
///
/// Works without any config file when `--contract` and a password
/// (flag or `UFANET_PASSWORD`) are given.
pub fn build_account_config(global: &GlobalOpts) -> Result<AccountConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    resolve_account(global, &cfg, &profile_name)
}

/// Translate the named profile (if any) + global flags into an `AccountConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_account(
    global: &GlobalOpts,
    cfg: &Config,
    profile_name: &str,
) -> Result<AccountConfig, CliError> {
    let profile = cfg.profiles.get(profile_name);

    // 1. Contract (flag > env > profile)
    let contract = global
        .contract
        .clone()
        .or_else(|| profile.map(|p| p.contract.clone()))
        .filter(|c| !c.trim().is_empty());
    let Some(contract) = contract else {
        return Err(match profile {
            Some(_) => CliError::NoCredentials {
                profile: profile_name.into(),
            },
            None => CliError::NoConfig {
                path: config_path().display().to_string(),
            },
        });
    };

    // 2. Password (flag/env > profile credential chain)
    let password = match (&global.password, profile) {
        (Some(pw), _) => SecretString::from(pw.clone()),
        (None, Some(p)) => ufanet_config::resolve_password(p, profile_name)?,
        (None, None) => {
            return Err(CliError::NoCredentials {
                profile: profile_name.into(),
            });
        }
    };

    let mut account = AccountConfig::new(contract, password);

    // 3. Portal URL (flag > env > profile > production)
    if let Some(raw) = global
        .base_url
        .as_deref()
        .or_else(|| profile.and_then(|p| p.base_url.as_deref()))
    {
        account.base_url = raw.parse().map_err(|_| CliError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {raw}"),
        })?;
    }

    // 4. TLS verification
    let profile_insecure = profile
        .and_then(|p| p.insecure)
        .unwrap_or(cfg.defaults.insecure);
    account.tls = if global.insecure || profile_insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ca_path) = profile.and_then(|p| p.ca_cert.clone()) {
        TlsVerification::CustomCa(ca_path)
    } else {
        TlsVerification::SystemDefaults
    };

    // 5. Timings
    account.timeout = Duration::from_secs(global.timeout);
    account.refresh_interval = Duration::from_secs(
        profile
            .and_then(|p| p.refresh_interval)
            .unwrap_or(cfg.defaults.refresh_interval),
    );

    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use secrecy::ExposeSecret;

    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["ufanet"];
        argv.extend_from_slice(args);
        argv.push("login");
        Cli::try_parse_from(argv)
            .unwrap_or_else(|e| panic!("parse failed: {e}"))
            .global
    }

    fn config_with_profile() -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                contract: "100200300".into(),
                password: Some("from-file".into()),
                base_url: Some("https://portal.example".into()),
                refresh_interval: Some(60),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn flags_override_profile() {
        let g = global(&[
            "--contract",
            "u1",
            "--password",
            "p1",
            "--base-url",
            "http://127.0.0.1:9000",
            "-k",
        ]);
        let account = resolve_account(&g, &config_with_profile(), "default")
            .unwrap_or_else(|e| panic!("resolve failed: {e}"));

        assert_eq!(account.contract, "u1");
        assert_eq!(account.password.expose_secret(), "p1");
        assert_eq!(account.base_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(account.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(account.refresh_interval, Duration::from_secs(60));
    }

    #[test]
    fn missing_profile_without_flags_points_at_config_file() {
        let g = global(&["--password", "p1"]);
        let err = resolve_account(&g, &Config::default(), "default").unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn flags_alone_are_enough() {
        let g = global(&["--contract", "u1", "--password", "p1"]);
        let account = resolve_account(&g, &Config::default(), "default")
            .unwrap_or_else(|e| panic!("resolve failed: {e}"));

        assert_eq!(account.base_url.as_str(), "https://dom.ufanet.ru/");
        assert_eq!(account.tls, TlsVerification::SystemDefaults);
        assert_eq!(account.timeout, Duration::from_secs(30));
    }

    #[test]
    fn invalid_base_url_is_a_usage_error() {
        let g = global(&["--contract", "u1", "--password", "p1", "--base-url", "nope"]);
        let err = resolve_account(&g, &Config::default(), "default").unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "base_url"));
    }
}

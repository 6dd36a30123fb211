//! Shared helpers for command handlers.

use ufanet_core::Account;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

/// Build an account from flags + config and load the doorphone list.
pub async fn connect(global: &GlobalOpts) -> Result<Account, CliError> {
    let account = Account::new(config::build_account_config(global)?)?;
    account.refresh().await?;
    tracing::debug!(
        doorphones = account.doorphones().len(),
        "doorphone list loaded"
    );
    Ok(account)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

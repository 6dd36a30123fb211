//! `ufanet login`: validate credentials without keeping a session.

use ufanet_core::Account;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let account_config = config::build_account_config(global)?;
    Account::validate(&account_config).await?;

    if !global.quiet {
        eprintln!(
            "✓ Logged in to {} as contract {}",
            account_config.base_url, account_config.contract
        );
    }
    Ok(())
}

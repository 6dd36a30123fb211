//! `ufanet watch`: run the account lifecycle until Ctrl-C.
//!
//! Acts as a minimal host: a sink that prints registrations, the
//! account's own refresh task, and an unload on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use ufanet_core::{Account, DoorphoneController, EntitySink, LockEntity};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config;
use crate::error::CliError;

/// Sink that reports entity changes on stdout.
struct PrintSink {
    quiet: bool,
}

impl EntitySink for PrintSink {
    fn add_entities(&self, entities: Vec<DoorphoneController>) {
        for entity in entities {
            info!(unique_id = %entity.unique_id(), name = entity.name(), "entity added");
            if !self.quiet {
                println!("+ {} ({})", entity.name(), entity.unique_id());
            }
        }
    }

    fn remove_entities(&self, unique_ids: &[String]) {
        for unique_id in unique_ids {
            info!(%unique_id, "entity removed");
            if !self.quiet {
                println!("- {unique_id}");
            }
        }
    }
}

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut account_config = config::build_account_config(global)?;
    if let Some(secs) = args.interval {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        account_config.refresh_interval = Duration::from_secs(secs);
    }

    let interval = account_config.refresh_interval;
    let account = Account::new(account_config)?;
    account
        .setup(Arc::new(PrintSink {
            quiet: global.quiet,
        }))
        .await?;

    if !global.quiet {
        eprintln!(
            "Watching {} doorphone(s), refreshing every {}s. Press Ctrl-C to stop.",
            account.doorphones().len(),
            interval.as_secs()
        );
    }

    let shutdown = tokio::signal::ctrl_c().await;
    account.unload().await;
    shutdown?;
    Ok(())
}

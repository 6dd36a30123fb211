//! Doorphone command handlers.

use serde::Serialize;
use tabled::Tabled;

use ufanet_core::{DoorphoneController, DoorphoneId, LockEntity, OpenOutcome};

use crate::cli::{DoorsArgs, DoorsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Views ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Tabled)]
struct DoorphoneRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Entity ID")]
    unique_id: String,
    #[tabled(rename = "Locked")]
    is_locked: bool,
}

impl From<&DoorphoneController> for DoorphoneRow {
    fn from(c: &DoorphoneController) -> Self {
        Self {
            id: c.id().to_string(),
            name: c.name().to_owned(),
            unique_id: c.unique_id(),
            is_locked: c.is_locked(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenReport {
    id: String,
    name: String,
    #[serde(flatten)]
    outcome: OpenOutcome,
}

fn open_detail(report: &OpenReport) -> String {
    match &report.outcome {
        OpenOutcome::Opened => format!("✓ Opened {} ({})", report.name, report.id),
        OpenOutcome::Rejected => format!("✗ {} ({}) did not open", report.name, report.id),
        OpenOutcome::Failed { reason } => {
            format!("✗ {} ({}) failed: {reason}", report.name, report.id)
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: DoorsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let account = util::connect(global).await?;

    match args.command {
        DoorsCommand::List => {
            let rows: Vec<DoorphoneRow> = account
                .controllers()
                .iter()
                .map(DoorphoneRow::from)
                .collect();
            if rows.is_empty() && !global.quiet {
                eprintln!("No doorphones are shared with this contract.");
            }
            let out = output::render_list(&global.output, &rows, Clone::clone, |r| r.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DoorsCommand::Open { id } => {
            let id = DoorphoneId::from(id);
            let controller = account
                .controller(&id)
                .ok_or_else(|| CliError::NotFound {
                    identifier: id.to_string(),
                })?;

            let report = OpenReport {
                id: id.to_string(),
                name: controller.name().to_owned(),
                outcome: controller.open().await,
            };
            let out = output::render_single(&global.output, &report, open_detail, |r| {
                r.id.clone()
            });
            output::print_output(&out, global.quiet);

            match report.outcome {
                OpenOutcome::Opened => Ok(()),
                OpenOutcome::Rejected => Err(CliError::OpenRejected { id: report.id }),
                OpenOutcome::Failed { reason } => Err(CliError::OpenFailed {
                    id: report.id,
                    reason,
                }),
            }
        }
    }
}

//! Command implementations for pollguard.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus helpers shared between commands.

mod force_reset;
mod run;
mod status;

use crate::cli::Command;
use crate::config::Config;
use crate::error::Result;
use crate::exit_codes;
use crate::remote::{ReconcileReport, TelegramApi};
use std::path::Path;
use tracing::info;

pub use force_reset::cmd_force_reset;
pub use run::cmd_run;
pub use status::cmd_status;

/// Dispatch a command to its implementation.
///
/// Returns the process exit code on success; for `run` that is the
/// supervised child's exit code. `status` loads its own config so that a
/// broken file is reported instead of failing the command.
pub fn dispatch(config_path: &Path, command: Command) -> Result<i32> {
    match command {
        Command::Run(args) => cmd_run(&Config::load_or_default(config_path)?, args),
        Command::Status => cmd_status(config_path).map(|()| exit_codes::SUCCESS),
        Command::ForceReset(args) => {
            cmd_force_reset(&Config::load_or_default(config_path)?, args)
                .map(|()| exit_codes::SUCCESS)
        }
    }
}

/// Build the bot API client if the credential is available.
fn remote_client(config: &Config) -> Option<TelegramApi> {
    config
        .credential()
        .map(|token| TelegramApi::new(&config.api_base_url, &token, config.remote_timeout()))
}

fn log_reconcile(report: &ReconcileReport) {
    info!(
        webhook_cleared = report.webhook_cleared,
        backlog_drained = report.backlog_drained,
        discarded_updates = report.discarded_updates,
        last_update_id = ?report.last_update_id,
        warnings = report.warnings.len(),
        "remote reconciliation finished"
    );
}

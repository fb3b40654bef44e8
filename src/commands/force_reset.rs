//! Implementation of `pollguard force-reset`.
//!
//! Operator override for a stuck deployment: resets the remote subscription
//! and clears the lock regardless of owner or age. Running processes are
//! not touched; stop them first or they will fail their next renewal.

use super::{log_reconcile, remote_client};
use crate::cli::ForceResetArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::remote::{Reconciler, RemoteApi};
use tracing::warn;

/// Execute the `pollguard force-reset` command.
pub fn cmd_force_reset(config: &Config, args: ForceResetArgs) -> Result<()> {
    if !args.yes {
        return Err(Error::UserError(
            "refusing to reset without --yes flag.\n\n\
             This clears the poller lock even if another instance holds it.\n\
             Review the current state with `pollguard status`, then run\n\
             `pollguard force-reset --yes`."
                .to_string(),
        ));
    }

    match remote_client(config) {
        Some(api) => {
            let report = Reconciler::from_config(config).reconcile(&api);
            log_reconcile(&report);
            println!(
                "Remote reset: webhook {}, {} pending update(s) discarded",
                if report.webhook_cleared {
                    "cleared"
                } else {
                    "NOT cleared"
                },
                report.discarded_updates
            );
            for warning in &report.warnings {
                println!("  Warning: {}", warning);
            }
            if let Ok(bot) = api.get_me() {
                println!(
                    "Bot: @{}",
                    bot.username.as_deref().unwrap_or(&bot.first_name)
                );
            }
        }
        None => {
            warn!(
                token_env = %config.token_env,
                "bot credential not set, skipping remote reset"
            );
            println!(
                "Remote reset skipped: {} is not set",
                config.token_env
            );
        }
    }

    let manager = config.lock_manager();
    match manager.force_clear()? {
        Some(previous) => println!("Cleared lock held by {}", previous),
        None => println!("No lock to clear ({})", manager.store().path().display()),
    }

    Ok(())
}

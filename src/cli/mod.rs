//! CLI argument parsing for pollguard.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pollguard: single-instance guard for long-polling bot workers.
///
/// Ensures at most one process polls the bot API at a time:
/// - A lock file records the current holder and refreshes while it runs
/// - Stale locks are taken over after the configured threshold
/// - Remote webhook and update backlog are reset before polling starts
#[derive(Parser, Debug)]
#[command(name = "pollguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file (optional; defaults apply if missing).
    #[arg(long, global = true, default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for pollguard.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Acquire the lock, reset the remote, and supervise a poller process.
    ///
    /// Exits with code 4 if another live instance holds the lock.
    /// The lock is released when the child exits or on SIGINT/SIGTERM.
    Run(RunArgs),

    /// Show lock, process, port, and remote status.
    ///
    /// Read-only; always exits 0.
    Status,

    /// Clear the lock and reset the remote unconditionally.
    ///
    /// Requires --yes. Does not stop any running process.
    ForceReset(ForceResetArgs),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Command to run as the poller, after `--`.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Arguments for the `force-reset` command.
#[derive(Parser, Debug)]
pub struct ForceResetArgs {
    /// Confirm the reset (required for safety).
    #[arg(long)]
    pub yes: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_status_defaults() {
        let cli = Cli::try_parse_from(["pollguard", "status"]).unwrap();
        assert!(matches!(cli.command, Command::Status));
        assert_eq!(cli.config, PathBuf::from("pollguard.yaml"));
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_global_options_after_subcommand() {
        let cli =
            Cli::try_parse_from(["pollguard", "status", "--config", "ops/bot.yaml", "-v"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("ops/bot.yaml"));
        assert!(cli.verbose);
    }

    #[test]
    fn parse_run_with_separator() {
        let cli =
            Cli::try_parse_from(["pollguard", "run", "--", "node", "bot.js", "--port", "3000"])
                .unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.command, vec!["node", "bot.js", "--port", "3000"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_without_separator() {
        let cli = Cli::try_parse_from(["pollguard", "run", "python3", "bot.py"]).unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.command, vec!["python3", "bot.py"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_requires_command() {
        assert!(Cli::try_parse_from(["pollguard", "run"]).is_err());
    }

    #[test]
    fn parse_force_reset() {
        let cli = Cli::try_parse_from(["pollguard", "force-reset", "--yes"]).unwrap();
        if let Command::ForceReset(args) = cli.command {
            assert!(args.yes);
        } else {
            panic!("Expected ForceReset command");
        }

        let cli = Cli::try_parse_from(["pollguard", "force-reset"]).unwrap();
        if let Command::ForceReset(args) = cli.command {
            assert!(!args.yes);
        } else {
            panic!("Expected ForceReset command");
        }
    }

    #[test]
    fn parse_unknown_command_fails() {
        assert!(Cli::try_parse_from(["pollguard", "claim"]).is_err());
    }
}

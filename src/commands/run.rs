//! Implementation of `pollguard run`.
//!
//! Acquires the lock, resets the remote subscription, then supervises the
//! poller command until it exits. While the child runs, the lock timestamp
//! is renewed every heartbeat interval so other instances see it as fresh.
//!
//! The lock is released on every exit path once acquired: child exit,
//! SIGINT/SIGTERM, spawn failure, or loss of ownership.

use super::{log_reconcile, remote_client};
use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::exit_codes;
use crate::identity::InstanceIdentity;
use crate::lock::{Clock, LockGuard, RenewOutcome};
use crate::remote::Reconciler;
use std::process::{Child, Command, ExitStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How often the child's status and the shutdown flag are checked.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Execute the `pollguard run` command. Returns the child's exit code.
pub fn cmd_run(config: &Config, args: RunArgs) -> Result<i32> {
    // Before acquiring: a signal during startup must still release the lock.
    let shutdown = shutdown_flag()?;
    run_guarded(config, &args.command, &shutdown)
}

/// Acquire, reconcile and supervise `command`, stopping early once
/// `shutdown` is set.
pub(crate) fn run_guarded(
    config: &Config,
    command: &[String],
    shutdown: &AtomicBool,
) -> Result<i32> {
    let manager = config.lock_manager();
    let guard = manager.acquire(InstanceIdentity::generate())?;

    if let Some(previous) = guard.previous() {
        println!("Took over stale lock from {}", previous);
    }
    println!(
        "Lock acquired: {} ({})",
        guard.identity(),
        manager.store().path().display()
    );

    match remote_client(config) {
        Some(api) => log_reconcile(&Reconciler::from_config(config).reconcile(&api)),
        None => warn!(
            token_env = %config.token_env,
            "bot credential not set, skipping remote reconciliation"
        ),
    }

    if shutdown.load(Ordering::Relaxed) {
        info!("shutdown requested before the poller started");
        guard.release()?;
        return Ok(exit_codes::SUCCESS);
    }

    let code = supervise(command, &guard, config.heartbeat_interval(), shutdown)?;

    guard.release()?;
    Ok(code)
}

/// Register SIGINT/SIGTERM handlers that set the returned flag.
fn shutdown_flag() -> Result<Arc<AtomicBool>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGTERM, signal_hook::consts::SIGINT] {
        signal_hook::flag::register(signal, Arc::clone(&shutdown)).map_err(|e| {
            Error::Supervise(format!("failed to register signal handler: {}", e))
        })?;
    }
    Ok(shutdown)
}

/// Run `command` to completion while renewing the lock held by `guard`.
///
/// # Errors
///
/// `Error::Supervise` if the command cannot be started or observed, or if
/// another instance takes the lock while the child is running (the child
/// is killed first).
pub(crate) fn supervise<C: Clock>(
    command: &[String],
    guard: &LockGuard<'_, C>,
    heartbeat: Duration,
    shutdown: &AtomicBool,
) -> Result<i32> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| Error::UserError("no poller command given".to_string()))?;

    let mut child = Command::new(program)
        .args(args)
        .spawn()
        .map_err(|e| Error::Supervise(format!("failed to start '{}': {}", program, e)))?;
    info!(pid = child.id(), command = %command.join(" "), "poller started");

    let mut last_renewal = Instant::now();
    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| Error::Supervise(format!("failed to poll child process: {}", e)))?
        {
            info!(status = %status, "poller exited");
            return Ok(exit_code(status));
        }

        if shutdown.load(Ordering::Relaxed) {
            info!("shutdown requested, stopping poller");
            let status = stop(&mut child)?;
            return Ok(exit_code(status));
        }

        if last_renewal.elapsed() >= heartbeat {
            last_renewal = Instant::now();
            match guard.renew() {
                Ok(RenewOutcome::Renewed) => {}
                Ok(RenewOutcome::Lost { current }) => {
                    stop(&mut child)?;
                    let holder = current
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "no one".to_string());
                    return Err(Error::Supervise(format!(
                        "lock ownership lost (now held by {}); poller stopped",
                        holder
                    )));
                }
                // Transient store trouble; the lock stays fresh until the threshold.
                Err(e) => warn!(error = %e, "heartbeat renewal failed, retrying next interval"),
            }
        }

        thread::sleep(POLL_INTERVAL);
    }
}

fn stop(child: &mut Child) -> Result<ExitStatus> {
    if let Err(e) = child.kill() {
        // Already exited between the last poll and now.
        warn!(pid = child.id(), error = %e, "failed to kill poller");
    }
    child
        .wait()
        .map_err(|e| Error::Supervise(format!("failed to reap child process: {}", e)))
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

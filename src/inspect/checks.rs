//! Individual status checks.

use super::{CheckOutcome, Finding, ProcessTable, StatusReport};
use crate::error::Error;
use crate::lock::{Clock, LockManager, LockRecord, LockState, format_age};
use crate::remote::RemoteApi;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::net::TcpListener;
use std::path::Path;

const FORCE_RESET_HINT: &str = "pollguard force-reset --yes";

/// Report whether the config file was usable.
pub fn check_config(path: &Path, error: Option<&Error>, report: &mut StatusReport) {
    let finding = match error {
        None if path.exists() => Finding::new(
            "config",
            CheckOutcome::Ok,
            &format!("loaded {}", path.display()),
        ),
        None => Finding::new(
            "config",
            CheckOutcome::Ok,
            &format!("{} not found, using defaults", path.display()),
        ),
        Some(e) => Finding::new(
            "config",
            CheckOutcome::Fail,
            &format!("cannot use {}; checks below ran with defaults", path.display()),
        )
        .with_detail("Error", e)
        .with_advice("Fix the config file before `pollguard run`, which refuses to start with it"),
    };

    report.findings.push(finding);
}

/// Check the lock record. Returns the record for the checks that need its pid.
pub fn check_lock<C: Clock>(
    manager: &LockManager<C>,
    report: &mut StatusReport,
) -> Option<LockRecord> {
    let now = manager.now();

    let state = match manager.state() {
        Ok(state) => state,
        Err(e) => {
            report.findings.push(
                Finding::new("lock", CheckOutcome::Fail, "cannot read lock store")
                    .with_detail("Error", e),
            );
            return None;
        }
    };

    let finding = match &state {
        LockState::Absent if manager.store().path().exists() => Finding::new(
            "lock",
            CheckOutcome::Warn,
            "lock file exists but is unreadable; the next instance will replace it",
        ),
        LockState::Absent => Finding::new(
            "lock",
            CheckOutcome::Ok,
            "no lock record (poller is not running)",
        ),
        LockState::Fresh(record) => lock_details(
            Finding::new("lock", CheckOutcome::Ok, "held by a live instance"),
            record,
            now,
        ),
        LockState::Stale(record) => lock_details(
            Finding::new(
                "lock",
                CheckOutcome::Warn,
                &format!(
                    "stale (older than {}); the next instance will take it over",
                    format_age(manager.stale_threshold())
                ),
            ),
            record,
            now,
        )
        .with_advice(&format!("Clear it now with `{}`", FORCE_RESET_HINT)),
    };

    report.findings.push(finding);
    report.lock_present = state.record().is_some();
    state.record().cloned()
}

fn lock_details(finding: Finding, record: &LockRecord, now: DateTime<Utc>) -> Finding {
    finding
        .with_detail("Instance", &record.instance_id)
        .with_detail("PID", record.pid)
        .with_detail(
            "Acquired",
            record.acquired_at().format("%Y-%m-%d %H:%M:%S UTC"),
        )
        .with_detail("Age", format_age(record.age_at(now)))
}

/// Check whether the recorded holder pid is observable on this host.
pub fn check_process(
    record: Option<&LockRecord>,
    processes: &dyn ProcessTable,
    report: &mut StatusReport,
) {
    let Some(record) = record else {
        report.findings.push(Finding::new(
            "process",
            CheckOutcome::Unknown,
            "no recorded holder pid",
        ));
        return;
    };

    let finding = match processes.is_running(record.pid) {
        Some(true) => Finding::new(
            "process",
            CheckOutcome::Ok,
            &format!("process {} is running", record.pid),
        ),
        Some(false) => Finding::new(
            "process",
            CheckOutcome::Warn,
            &format!("process {} not found (orphaned lock)", record.pid),
        )
        .with_advice(&format!(
            "The lock will be taken over once stale, or clear it with `{}`",
            FORCE_RESET_HINT
        )),
        None => Finding::new(
            "process",
            CheckOutcome::Unknown,
            &format!(
                "cannot determine whether process {} is running on this platform",
                record.pid
            ),
        ),
    };

    report.findings.push(finding);
}

/// Whether a TCP port can be bound locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortStatus {
    Free,
    InUse,
    Unknown(String),
}

/// Probe `port` by binding it on loopback and on all interfaces.
pub fn probe_port(port: u16) -> PortStatus {
    for addr in ["127.0.0.1", "0.0.0.0"] {
        match TcpListener::bind((addr, port)) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::AddrInUse => return PortStatus::InUse,
            Err(e) => return PortStatus::Unknown(format!("bind {}:{}: {}", addr, port, e)),
        }
    }
    PortStatus::Free
}

/// Check whether the application port is already bound.
pub fn check_port(port: u16, report: &mut StatusReport) {
    let finding = match probe_port(port) {
        PortStatus::Free => Finding::new("port", CheckOutcome::Ok, &format!("port {} is free", port)),
        PortStatus::InUse => Finding::new(
            "port",
            CheckOutcome::Warn,
            &format!("port {} is in use by another process", port),
        )
        .with_advice("The application may already be running"),
        PortStatus::Unknown(reason) => Finding::new(
            "port",
            CheckOutcome::Unknown,
            &format!("cannot probe port {}", port),
        )
        .with_detail("Error", reason),
    };

    report.findings.push(finding);
}

/// Check that the bot credential is configured. Never prints its value.
pub fn check_credential(token_env: &str, present: bool, report: &mut StatusReport) {
    let finding = if present {
        Finding::new(
            "credential",
            CheckOutcome::Ok,
            &format!("{} is set", token_env),
        )
    } else {
        Finding::new(
            "credential",
            CheckOutcome::Fail,
            &format!("{} is not set", token_env),
        )
        .with_advice(&format!("Export {} before starting the poller", token_env))
    };

    report.findings.push(finding);
}

/// Query the remote service for bot identity and webhook state.
pub fn check_remote(remote: Option<&dyn RemoteApi>, report: &mut StatusReport) {
    let Some(remote) = remote else {
        report.findings.push(Finding::new(
            "remote",
            CheckOutcome::Unknown,
            "skipped (no credential)",
        ));
        return;
    };

    let bot = match remote.get_me() {
        Ok(user) => Finding::new(
            "remote",
            CheckOutcome::Ok,
            &format!(
                "bot reachable: @{}",
                user.username.as_deref().unwrap_or(&user.first_name)
            ),
        )
        .with_detail("Bot ID", user.id),
        Err(e) => Finding::new("remote", CheckOutcome::Warn, "bot API unreachable")
            .with_detail("Error", e),
    };
    report.findings.push(bot);

    let webhook = match remote.webhook_info() {
        Ok(info) if info.is_set() => {
            let mut finding = Finding::new(
                "webhook",
                CheckOutcome::Warn,
                "webhook is registered; polling will conflict with it",
            )
            .with_detail("URL", &info.url)
            .with_detail("Pending updates", info.pending_update_count);
            if let Some(error) = &info.last_error_message {
                finding = finding.with_detail("Last error", error);
            }
            finding.with_advice(&format!("Remove it with `{}`", FORCE_RESET_HINT))
        }
        Ok(info) => Finding::new("webhook", CheckOutcome::Ok, "no webhook registered")
            .with_detail("Pending updates", info.pending_update_count),
        Err(e) => Finding::new("webhook", CheckOutcome::Warn, "cannot read webhook info")
            .with_detail("Error", e),
    };
    report.findings.push(webhook);
}

/// List other processes that look like poller runtimes.
///
/// Advisory only: the report suggests a kill command but never runs it.
/// Lock acquisition does not depend on this check.
pub fn check_competitors(
    name: &str,
    processes: &dyn ProcessTable,
    holder_pid: Option<u32>,
    report: &mut StatusReport,
) {
    if name.trim().is_empty() {
        return;
    }

    let own_pid = std::process::id();
    let Some(found) = processes.find_by_name(name) else {
        report.findings.push(Finding::new(
            "competitors",
            CheckOutcome::Unknown,
            &format!("cannot enumerate '{}' processes on this platform", name),
        ));
        return;
    };

    let others: Vec<_> = found.into_iter().filter(|p| p.pid != own_pid).collect();
    if others.is_empty() {
        report.findings.push(Finding::new(
            "competitors",
            CheckOutcome::Ok,
            &format!("no '{}' processes found", name),
        ));
        return;
    }

    let mut finding = Finding::new(
        "competitors",
        CheckOutcome::Warn,
        &format!("{} '{}' process(es) running (advisory)", others.len(), name),
    );
    for process in &others {
        let role = if Some(process.pid) == holder_pid {
            " (lock holder)"
        } else {
            ""
        };
        finding = finding.with_detail("PID", format!("{}{}", process.pid, role));
    }
    let pids: Vec<String> = others.iter().map(|p| p.pid.to_string()).collect();
    report
        .findings
        .push(finding.with_advice(&kill_hint(&pids)));
}

#[cfg(windows)]
fn kill_hint(pids: &[String]) -> String {
    let args: Vec<String> = pids.iter().map(|p| format!("/PID {}", p)).collect();
    format!("If these are stuck pollers, stop them manually: taskkill /F {}", args.join(" "))
}

#[cfg(not(windows))]
fn kill_hint(pids: &[String]) -> String {
    format!("If these are stuck pollers, stop them manually: kill {}", pids.join(" "))
}

//! Read-only liveness inspection behind `pollguard status`.
//!
//! Reports:
//! - Whether the config file loaded (defaults are used when it did not)
//! - Lock record presence, holder, age and staleness
//! - Whether the recorded pid is observable on this host (best effort)
//! - Whether the expected application port is bound
//! - Whether the bot credential is configured
//! - Remote bot identity and webhook registration (when a credential exists)
//! - Other processes matching the poller's runtime name (advisory only)
//!
//! Nothing here writes to the lock store or the remote service. Each check
//! records its own outcome; a failing check never stops the others.

mod checks;
mod display;
mod process;


pub use checks::*;
pub use display::*;
pub use process::{ProcessInfo, ProcessTable, SystemProcessTable};

use crate::error::Error;
use crate::lock::{Clock, LockManager};
use crate::remote::RemoteApi;
use std::path::{Path, PathBuf};

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Ok,
    Warn,
    Fail,
    /// The check could not determine an answer.
    Unknown,
}

impl std::fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckOutcome::Ok => write!(f, "OK"),
            CheckOutcome::Warn => write!(f, "WARN"),
            CheckOutcome::Fail => write!(f, "FAIL"),
            CheckOutcome::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Result of one check, with optional detail lines and advice.
#[derive(Debug, Clone)]
pub struct Finding {
    /// Check name (`lock`, `process`, `port`, ...).
    pub check: String,
    pub outcome: CheckOutcome,
    pub summary: String,
    /// Labelled detail lines, printed in order.
    pub details: Vec<(String, String)>,
    /// Suggested operator action.
    pub advice: Option<String>,
}

impl Finding {
    pub fn new(check: &str, outcome: CheckOutcome, summary: &str) -> Self {
        Self {
            check: check.to_string(),
            outcome,
            summary: summary.to_string(),
            details: Vec::new(),
            advice: None,
        }
    }

    pub fn with_detail(mut self, label: &str, value: impl ToString) -> Self {
        self.details.push((label.to_string(), value.to_string()));
        self
    }

    pub fn with_advice(mut self, advice: &str) -> Self {
        self.advice = Some(advice.to_string());
        self
    }
}

/// Everything `status` found.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub host: String,
    pub lock_path: PathBuf,
    /// A lock record (fresh or stale) was present.
    pub lock_present: bool,
    pub findings: Vec<Finding>,
}

impl StatusReport {
    pub fn new(host: String, lock_path: PathBuf) -> Self {
        Self {
            host,
            lock_path,
            lock_present: false,
            findings: Vec::new(),
        }
    }

    pub fn finding(&self, check: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.check == check)
    }

    pub fn count(&self, outcome: CheckOutcome) -> usize {
        self.findings.iter().filter(|f| f.outcome == outcome).count()
    }
}

/// Inputs for a status run beyond the lock manager.
pub struct InspectInputs<'a> {
    pub config_path: &'a Path,
    /// Why the config file could not be used; the checks then run on defaults.
    pub config_error: Option<&'a Error>,
    pub port: u16,
    pub token_env: &'a str,
    pub credential_present: bool,
    /// Client for remote checks; `None` skips them.
    pub remote: Option<&'a dyn RemoteApi>,
    pub processes: &'a dyn ProcessTable,
    /// Process name listed as a potential competitor; empty disables.
    pub competitor_process_name: &'a str,
}

/// Run every check and collect the findings.
pub fn inspect<C: Clock>(manager: &LockManager<C>, inputs: &InspectInputs<'_>) -> StatusReport {
    let mut report = StatusReport::new(host_name(), manager.store().path().to_path_buf());

    check_config(inputs.config_path, inputs.config_error, &mut report);
    let record = check_lock(manager, &mut report);
    check_process(record.as_ref(), inputs.processes, &mut report);
    check_port(inputs.port, &mut report);
    check_credential(inputs.token_env, inputs.credential_present, &mut report);
    check_remote(inputs.remote, &mut report);
    check_competitors(
        inputs.competitor_process_name,
        inputs.processes,
        record.as_ref().map(|r| r.pid),
        &mut report,
    );

    report
}

fn host_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

//! Takeover reconciliation against the remote service.

use super::{MAX_UPDATES_PER_CALL, RemoteApi};
use crate::config::{Config, DrainPolicy};
use std::fmt;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Reconciliation step that produced a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStep {
    DeleteWebhook,
    DrainBacklog,
}

impl fmt::Display for ReconcileStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileStep::DeleteWebhook => write!(f, "delete webhook"),
            ReconcileStep::DrainBacklog => write!(f, "drain backlog"),
        }
    }
}

/// A remote failure during reconciliation. Logged, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileWarning {
    pub step: ReconcileStep,
    pub message: String,
}

impl fmt::Display for ReconcileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

/// What reconciliation observed and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// `deleteWebhook` succeeded (including "nothing to delete").
    pub webhook_cleared: bool,

    /// The backlog step completed.
    pub backlog_drained: bool,

    /// Updates seen and acknowledged without processing.
    pub discarded_updates: u64,

    /// Highest update id acknowledged.
    pub last_update_id: Option<i64>,

    pub warnings: Vec<ReconcileWarning>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, step: ReconcileStep, message: String) {
        warn!(step = %step, error = %message, "remote reconciliation step failed, continuing");
        self.warnings.push(ReconcileWarning { step, message });
    }
}

/// Clears remote subscription state so a new poller starts clean.
///
/// Runs once per successful acquisition, before the poller starts. Every
/// failure degrades to a warning in the report: starting with possibly
/// stale remote state beats not starting at all.
#[derive(Debug, Clone)]
pub struct Reconciler {
    policy: DrainPolicy,
    max_drain_batches: u32,
    settle_delay: Duration,
}

impl Reconciler {
    pub fn new(policy: DrainPolicy, max_drain_batches: u32, settle_delay: Duration) -> Self {
        Self {
            policy,
            max_drain_batches: max_drain_batches.max(1),
            settle_delay,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.drain_policy,
            config.max_drain_batches,
            config.settle_delay(),
        )
    }

    /// Delete the webhook, then drain the backlog.
    pub fn reconcile(&self, api: &dyn RemoteApi) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        match api.delete_webhook() {
            Ok(()) => report.webhook_cleared = true,
            Err(e) => report.warn(ReconcileStep::DeleteWebhook, e.to_string()),
        }

        let drained = match self.policy {
            DrainPolicy::LatestOnly => self.drain_latest_only(api, &mut report),
            DrainPolicy::Full => self.drain_full(api, &mut report),
        };
        match drained {
            Ok(()) => report.backlog_drained = true,
            Err(message) => report.warn(ReconcileStep::DrainBacklog, message),
        }

        info!(
            webhook_cleared = report.webhook_cleared,
            backlog_drained = report.backlog_drained,
            discarded = report.discarded_updates,
            policy = self.policy.as_str(),
            "remote reconciliation finished"
        );

        if !self.settle_delay.is_zero() {
            info!(delay = ?self.settle_delay, "waiting for remote state to settle");
            thread::sleep(self.settle_delay);
        }

        report
    }

    /// Forget everything but the newest update, then acknowledge it.
    fn drain_latest_only(
        &self,
        api: &dyn RemoteApi,
        report: &mut ReconcileReport,
    ) -> std::result::Result<(), String> {
        let updates = api
            .get_updates(-1, MAX_UPDATES_PER_CALL)
            .map_err(|e| e.to_string())?;

        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            api.get_updates(last + 1, 1).map_err(|e| e.to_string())?;
            report.discarded_updates += updates.len() as u64;
            report.last_update_id = Some(last);
        }

        Ok(())
    }

    /// Page through the backlog, acknowledging each page with the next call.
    fn drain_full(
        &self,
        api: &dyn RemoteApi,
        report: &mut ReconcileReport,
    ) -> std::result::Result<(), String> {
        let mut offset = 0;

        for _ in 0..self.max_drain_batches {
            let updates = api
                .get_updates(offset, MAX_UPDATES_PER_CALL)
                .map_err(|e| e.to_string())?;

            let Some(last) = updates.iter().map(|u| u.update_id).max() else {
                return Ok(());
            };

            report.discarded_updates += updates.len() as u64;
            report.last_update_id = Some(last);
            offset = last + 1;
        }

        // Acknowledge the final page even when the batch budget ran out.
        api.get_updates(offset, 1).map_err(|e| e.to_string())?;
        Err(format!(
            "backlog not fully drained after {} batches",
            self.max_drain_batches
        ))
    }
}

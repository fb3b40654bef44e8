//! Single-instance lock for the poller.
//!
//! # Lock File
//!
//! One lock file per deployment (default `.pollguard/poller.lock`). It holds
//! a pretty-printed JSON record:
//! - `instanceId`: opaque id of the holder, unique per process start
//! - `pid`: OS process id of the holder (informational)
//! - `timestamp`: epoch milliseconds of acquisition or last renewal
//!
//! # Staleness
//!
//! A record whose age is strictly greater than the configured threshold is
//! stale and may be overwritten by any instance without checking whether the
//! old holder is still running. Age equal to the threshold is still fresh.
//!
//! # Layers
//!
//! - [`store::LockStore`] reads and writes the single slot atomically.
//! - [`manager::LockManager`] applies the ownership and staleness policy.
//! - [`guard::LockGuard`] releases a held lock when dropped.

pub mod guard;
pub mod manager;
pub mod store;


pub use guard::LockGuard;
pub use manager::{AcquireOutcome, LockManager, RenewOutcome};
pub use store::LockStore;

use crate::identity::InstanceIdentity;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The persisted lock record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRecord {
    /// Instance id of the holder.
    pub instance_id: String,

    /// Process id of the holder; may be dead or in another pid namespace.
    pub pid: u32,

    /// Acquisition or last renewal time, epoch milliseconds.
    pub timestamp: i64,
}

impl LockRecord {
    /// Create a record claiming the lock for `identity` at `now`.
    pub fn new(identity: &InstanceIdentity, now: DateTime<Utc>) -> Self {
        Self {
            instance_id: identity.instance_id.clone(),
            pid: identity.pid,
            timestamp: now.timestamp_millis(),
        }
    }

    /// Whether this record belongs to `identity`.
    pub fn is_owned_by(&self, identity: &InstanceIdentity) -> bool {
        self.instance_id == identity.instance_id
    }

    /// Acquisition time as a UTC timestamp.
    pub fn acquired_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Age of the record relative to `now`.
    ///
    /// A timestamp in the future (clock skew between writers) counts as age zero.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        let age = Duration::milliseconds(now.timestamp_millis().saturating_sub(self.timestamp));
        age.max(Duration::zero())
    }

    /// Whether the record is older than `threshold` at `now`.
    pub fn is_stale_at(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.age_at(now) > threshold
    }

    /// Serialize to the on-disk JSON form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for LockRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (pid {}, acquired {})",
            self.instance_id,
            self.pid,
            self.acquired_at().format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Classified state of the lock slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    /// No record exists (or the record was unreadable).
    Absent,
    /// A record exists and is within the staleness threshold.
    Fresh(LockRecord),
    /// A record exists but is older than the threshold.
    Stale(LockRecord),
}

impl LockState {
    /// Classify an optional record at `now`.
    pub fn classify(record: Option<LockRecord>, now: DateTime<Utc>, threshold: Duration) -> Self {
        match record {
            None => LockState::Absent,
            Some(record) if record.is_stale_at(now, threshold) => LockState::Stale(record),
            Some(record) => LockState::Fresh(record),
        }
    }

    /// The record, if any.
    pub fn record(&self) -> Option<&LockRecord> {
        match self {
            LockState::Absent => None,
            LockState::Fresh(record) | LockState::Stale(record) => Some(record),
        }
    }
}

/// Source of the current time for age computations.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Format a duration as a short human-readable age.
pub fn format_age(age: Duration) -> String {
    let seconds = age.num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

/// Convert a std duration to a chrono duration, saturating on overflow.
pub(crate) fn to_chrono(duration: std::time::Duration) -> Duration {
    Duration::from_std(duration).unwrap_or(Duration::MAX)
}

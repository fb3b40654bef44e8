//! Ownership and staleness policy on top of the lock store.

use super::{Clock, LockGuard, LockRecord, LockState, LockStore, SystemClock, format_age, to_chrono};
use crate::error::{Error, Result};
use crate::identity::InstanceIdentity;
use chrono::Duration;
use std::fmt;
use tracing::{debug, info, warn};

/// Result of an acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The caller now holds the lock.
    ///
    /// `previous` is the stale record that was overwritten, if any.
    Acquired { previous: Option<LockRecord> },

    /// A fresh record belongs to another instance.
    Rejected { holder: LockRecord, age: Duration },
}

impl AcquireOutcome {
    pub fn is_acquired(&self) -> bool {
        matches!(self, AcquireOutcome::Acquired { .. })
    }
}

impl fmt::Display for AcquireOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireOutcome::Acquired { previous: None } => write!(f, "acquired"),
            AcquireOutcome::Acquired {
                previous: Some(previous),
            } => write!(f, "acquired (took over from {})", previous.instance_id),
            AcquireOutcome::Rejected { holder, age } => write!(
                f,
                "held by {}, age {}",
                holder.instance_id,
                format_age(*age)
            ),
        }
    }
}

/// Result of a heartbeat renewal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewOutcome {
    /// The timestamp was rewritten.
    Renewed,
    /// The slot no longer belongs to the caller; nothing was written.
    Lost { current: Option<LockRecord> },
}

/// Acquires, renews and releases the single-instance lock.
///
/// Every read-decide-write runs under the store's slot lock, so concurrent
/// acquirers and renewals are serialized across threads and processes.
/// Acquisition is decided from the store alone. A stale record is
/// overwritten without checking whether its pid is still running, so a
/// holder that stopped renewing can be superseded while still alive; it
/// learns this on its next [`LockManager::renew`].
#[derive(Debug)]
pub struct LockManager<C: Clock = SystemClock> {
    store: LockStore,
    stale_threshold: Duration,
    clock: C,
}

impl LockManager<SystemClock> {
    pub fn new(store: LockStore, stale_threshold: std::time::Duration) -> Self {
        Self::with_clock(store, stale_threshold, SystemClock)
    }
}

impl<C: Clock> LockManager<C> {
    pub fn with_clock(store: LockStore, stale_threshold: std::time::Duration, clock: C) -> Self {
        Self {
            store,
            stale_threshold: to_chrono(stale_threshold),
            clock,
        }
    }

    pub fn store(&self) -> &LockStore {
        &self.store
    }

    pub fn stale_threshold(&self) -> Duration {
        self.stale_threshold
    }

    /// Current time according to the manager's clock.
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Classify the current slot without modifying it.
    pub fn state(&self) -> Result<LockState> {
        let record = self.store.read()?;
        Ok(LockState::classify(
            record,
            self.clock.now(),
            self.stale_threshold,
        ))
    }

    /// Try to take the lock for `identity`.
    ///
    /// - absent: write a new record, `Acquired`
    /// - stale: overwrite it (forced takeover), `Acquired { previous }`
    /// - fresh and ours: refresh the timestamp, `Acquired`
    /// - fresh and someone else's: `Rejected`
    ///
    /// # Errors
    ///
    /// Store failures are returned as `Error::StoreIo` and are never
    /// reported as `Rejected`.
    pub fn try_acquire(&self, identity: &InstanceIdentity) -> Result<AcquireOutcome> {
        let _slot = self.store.lock_slot()?;
        let now = self.clock.now();
        let state = LockState::classify(self.store.read()?, now, self.stale_threshold);

        let previous = match state {
            LockState::Absent => None,
            LockState::Fresh(holder) if holder.is_owned_by(identity) => {
                debug!(instance_id = %identity.instance_id, "lock already held by this instance");
                None
            }
            LockState::Fresh(holder) => {
                let age = holder.age_at(now);
                info!(
                    holder = %holder.instance_id,
                    holder_pid = holder.pid,
                    age = %format_age(age),
                    "lock is held by another instance"
                );
                return Ok(AcquireOutcome::Rejected { holder, age });
            }
            LockState::Stale(previous) => {
                warn!(
                    previous = %previous.instance_id,
                    previous_pid = previous.pid,
                    age = %format_age(previous.age_at(now)),
                    threshold = %format_age(self.stale_threshold),
                    "taking over stale lock"
                );
                Some(previous)
            }
        };

        self.store.write(&LockRecord::new(identity, now))?;
        info!(instance_id = %identity.instance_id, pid = identity.pid, "lock acquired");

        Ok(AcquireOutcome::Acquired { previous })
    }

    /// Acquire the lock and return a guard that releases it on drop.
    ///
    /// # Errors
    ///
    /// `Error::LockRejected` when a live instance holds the lock, or
    /// `Error::StoreIo` when the store cannot be read or written.
    pub fn acquire(&self, identity: InstanceIdentity) -> Result<LockGuard<'_, C>> {
        match self.try_acquire(&identity)? {
            AcquireOutcome::Acquired { previous } => Ok(LockGuard::new(self, identity, previous)),
            rejected => Err(Error::LockRejected(rejected.to_string())),
        }
    }

    /// Rewrite the timestamp if `identity` still owns the lock.
    pub fn renew(&self, identity: &InstanceIdentity) -> Result<RenewOutcome> {
        let _slot = self.store.lock_slot()?;
        match self.store.read()? {
            Some(record) if record.is_owned_by(identity) => {
                self.store.write(&LockRecord::new(identity, self.clock.now()))?;
                debug!(instance_id = %identity.instance_id, "lock renewed");
                Ok(RenewOutcome::Renewed)
            }
            current => {
                warn!(
                    instance_id = %identity.instance_id,
                    current = current.as_ref().map(|r| r.instance_id.as_str()).unwrap_or("<none>"),
                    "lock ownership lost, not renewing"
                );
                Ok(RenewOutcome::Lost { current })
            }
        }
    }

    /// Clear the lock if `identity` owns it.
    ///
    /// Returns `true` when the record was removed. Someone else's record is
    /// never touched.
    pub fn release(&self, identity: &InstanceIdentity) -> Result<bool> {
        let _slot = self.store.lock_slot()?;
        match self.store.read()? {
            Some(record) if record.is_owned_by(identity) => {
                self.store.clear()?;
                info!(instance_id = %identity.instance_id, "lock released");
                Ok(true)
            }
            Some(record) => {
                debug!(
                    instance_id = %identity.instance_id,
                    holder = %record.instance_id,
                    "not releasing lock owned by another instance"
                );
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// Clear the slot regardless of owner or age.
    ///
    /// Operator override; returns the discarded record.
    pub fn force_clear(&self) -> Result<Option<LockRecord>> {
        let _slot = self.store.lock_slot()?;
        let previous = self.store.read()?;
        self.store.clear()?;
        if let Some(record) = &previous {
            warn!(
                previous = %record.instance_id,
                previous_pid = record.pid,
                "lock force-cleared"
            );
        }
        Ok(previous)
    }
}

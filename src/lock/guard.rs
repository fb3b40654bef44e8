//! RAII guard for a held lock.

use super::{Clock, LockManager, LockRecord, RenewOutcome};
use crate::error::Result;
use crate::identity::InstanceIdentity;
use tracing::warn;

/// Holds the lock for one instance.
///
/// When dropped, the lock is released if this instance still owns it.
/// A record taken over by another instance is left alone.
#[derive(Debug)]
pub struct LockGuard<'a, C: Clock> {
    manager: &'a LockManager<C>,
    identity: InstanceIdentity,
    /// Stale record overwritten by this acquisition, if any.
    previous: Option<LockRecord>,
    released: bool,
}

impl<'a, C: Clock> LockGuard<'a, C> {
    pub(super) fn new(
        manager: &'a LockManager<C>,
        identity: InstanceIdentity,
        previous: Option<LockRecord>,
    ) -> Self {
        Self {
            manager,
            identity,
            previous,
            released: false,
        }
    }

    pub fn identity(&self) -> &InstanceIdentity {
        &self.identity
    }

    pub fn previous(&self) -> Option<&LockRecord> {
        self.previous.as_ref()
    }

    /// Refresh the heartbeat timestamp.
    pub fn renew(&self) -> Result<RenewOutcome> {
        self.manager.renew(&self.identity)
    }

    /// Release explicitly, surfacing store errors.
    ///
    /// Returns `true` if the record was removed.
    pub fn release(mut self) -> Result<bool> {
        self.released = true;
        self.manager.release(&self.identity)
    }
}

impl<C: Clock> Drop for LockGuard<'_, C> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.manager.release(&self.identity)
        {
            warn!(
                instance_id = %self.identity.instance_id,
                error = %e,
                "failed to release lock"
            );
        }
    }
}

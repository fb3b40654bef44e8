//! Instance identity for lock ownership.
//!
//! Every process start gets a fresh `instance_id`; the OS pid is captured
//! alongside it for diagnostics only. Ownership checks compare instance ids,
//! never pids, because pids are reused and may be unverifiable from another
//! namespace.

use chrono::Utc;
use std::fmt;

/// Identity of the running instance as written into the lock record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceIdentity {
    /// Opaque unique id: `<pid>-<epoch-ms>-<random hex>`.
    pub instance_id: String,

    /// OS process id of this instance.
    pub pid: u32,
}

impl InstanceIdentity {
    /// Generate an identity for the current process.
    ///
    /// Uses only local entropy and the wall clock, so it cannot fail.
    pub fn generate() -> Self {
        let pid = std::process::id();
        let random = uuid::Uuid::new_v4().simple().to_string();
        Self {
            instance_id: format!("{}-{}-{}", pid, Utc::now().timestamp_millis(), &random[..8]),
            pid,
        }
    }

    /// Build an identity from known parts.
    pub fn new(instance_id: impl Into<String>, pid: u32) -> Self {
        Self {
            instance_id: instance_id.into(),
            pid,
        }
    }
}

impl fmt::Display for InstanceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pid {})", self.instance_id, self.pid)
    }
}

//! Best-effort view of the host's process table.

use sysinfo::{Pid, System};

/// A process visible on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
}

/// Host process lookups. `None` means the platform could not tell.
pub trait ProcessTable {
    fn is_running(&self, pid: u32) -> Option<bool>;

    /// Processes whose name matches `name` (case-insensitive, ignoring a
    /// trailing `.exe`).
    fn find_by_name(&self, name: &str) -> Option<Vec<ProcessInfo>>;
}

/// Process table snapshot taken through `sysinfo`.
pub struct SystemProcessTable {
    system: Option<System>,
}

impl SystemProcessTable {
    /// Take a snapshot of every process on the host.
    pub fn snapshot() -> Self {
        let system = sysinfo::IS_SUPPORTED_SYSTEM.then(System::new_all);
        Self { system }
    }
}

impl ProcessTable for SystemProcessTable {
    fn is_running(&self, pid: u32) -> Option<bool> {
        let system = self.system.as_ref()?;
        Some(system.process(Pid::from_u32(pid)).is_some())
    }

    fn find_by_name(&self, name: &str) -> Option<Vec<ProcessInfo>> {
        let system = self.system.as_ref()?;
        let wanted = normalize_name(name);

        let mut matches: Vec<ProcessInfo> = system
            .processes()
            .iter()
            .filter_map(|(pid, process)| {
                let process_name = process.name().to_string_lossy().to_string();
                (normalize_name(&process_name) == wanted).then(|| ProcessInfo {
                    pid: pid.as_u32(),
                    name: process_name,
                })
            })
            .collect();
        matches.sort_by_key(|p| p.pid);
        Some(matches)
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    lower
        .strip_suffix(".exe")
        .map(str::to_string)
        .unwrap_or(lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("node.exe"), "node");
        assert_eq!(normalize_name("Node"), "node");
        assert_eq!(normalize_name(" node "), "node");
    }

    #[test]
    fn test_snapshot_sees_current_process() {
        let table = SystemProcessTable::snapshot();
        if sysinfo::IS_SUPPORTED_SYSTEM {
            assert_eq!(table.is_running(std::process::id()), Some(true));
        } else {
            assert_eq!(table.is_running(std::process::id()), None);
        }
    }
}

//! Host process services - Liveness, window focus and runtime presence

use std::sync::Mutex;

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::trace;

use super::HostProcesses;
use crate::platform;

/// Host process services backed by the platform layer and `sysinfo`.
pub struct SystemProcesses {
    /// Process table, refreshed on demand
    system: Mutex<System>,
    /// Lowercased process names that belong to the compatibility layer
    runtime_names: Vec<String>,
}

impl SystemProcesses {
    pub fn new(runtime_names: &[String]) -> Self {
        Self {
            system: Mutex::new(System::new()),
            runtime_names: runtime_names.iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    /// Get PIDs of all processes whose name is one of the runtime's
    pub fn find_runtime_processes(&self) -> Vec<u32> {
        let mut system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::everything(),
        );

        system
            .processes()
            .iter()
            .filter(|(_, proc)| {
                let name = proc.name().to_string_lossy().to_lowercase();
                self.runtime_names
                    .iter()
                    .any(|n| matches_runtime_name(&name, n))
            })
            .map(|(pid, _)| pid.as_u32())
            .collect()
    }
}

/// Linux reports at most 15 bytes of a process name, so a name of exactly
/// that length also matches any runtime name it starts.
fn matches_runtime_name(process_name: &str, runtime_name: &str) -> bool {
    const COMM_LEN: usize = 15;
    process_name == runtime_name
        || (process_name.len() == COMM_LEN && runtime_name.starts_with(process_name))
}

impl HostProcesses for SystemProcesses {
    fn is_alive(&self, pid: u32) -> bool {
        platform::is_process_running(pid)
    }

    fn focus_any_window_of(&self, pid: u32) -> bool {
        platform::focus_process_windows(pid)
    }

    fn runtime_active(&self) -> bool {
        let pids = self.find_runtime_processes();
        trace!("Found {} runtime processes", pids.len());
        !pids.is_empty()
    }
}

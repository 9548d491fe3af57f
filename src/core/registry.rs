//! Running-instance registry - Which programs of a workspace are currently running
//!
//! One registry exists per workspace. Keys are normalized executable paths,
//! values are process handles or a pending marker while a launch is in flight.
//! Every read-modify-write happens under a single table lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use super::paths::normalize_key;
use crate::runtime::HostProcesses;

/// Handle stored for a running program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceHandle {
    /// Operating system process ID
    Pid(u32),
    /// Launch in flight, or a launcher that exposes no process ID
    Pending,
}

impl InstanceHandle {
    fn from_pid(pid: Option<u32>) -> Self {
        pid.map(Self::Pid).unwrap_or(Self::Pending)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    /// Path as it was registered, for display
    path: PathBuf,
    handle: InstanceHandle,
    /// Identifies the registration that created this entry
    token: u64,
}

/// Per-workspace table of running programs
pub struct Registry {
    entries: Mutex<HashMap<String, Entry>>,
    host: Arc<dyn HostProcesses>,
    next_token: AtomicU64,
}

impl Registry {
    pub fn new(host: Arc<dyn HostProcesses>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            host,
            next_token: AtomicU64::new(1),
        }
    }

    /// Lock the table. A panic elsewhere never leaves entries half-written,
    /// so a poisoned lock is still safe to use.
    fn table(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn new_entry(&self, path: &Path, handle: InstanceHandle) -> Entry {
        Entry {
            path: path.to_path_buf(),
            handle,
            token: self.next_token.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Check whether a program is running, dropping the entry if its process is gone
    pub fn is_running(&self, path: &Path) -> bool {
        let key = normalize_key(path);
        let mut table = self.table();
        let Some(entry) = table.get(&key) else {
            return false;
        };

        match entry.handle {
            InstanceHandle::Pending => true,
            InstanceHandle::Pid(pid) => {
                if self.host.is_alive(pid) {
                    true
                } else {
                    debug!("Dropping stale entry for {:?} (PID {} exited)", entry.path, pid);
                    table.remove(&key);
                    false
                }
            }
        }
    }

    /// Record a program as running, replacing any existing entry
    pub fn register(&self, path: &Path, pid: Option<u32>) {
        let entry = self.new_entry(path, InstanceHandle::from_pid(pid));
        debug!("Registered {:?} as {:?}", path, entry.handle);
        self.table().insert(normalize_key(path), entry);
    }

    /// Remove a program's entry. Does nothing if there is none.
    pub fn unregister(&self, path: &Path) {
        if self.table().remove(&normalize_key(path)).is_some() {
            debug!("Unregistered {:?}", path);
        }
    }

    /// Try to raise a window of the running instance.
    ///
    /// Returns false when nothing is registered, the launch is still pending,
    /// or the process has no window that could be focused.
    pub fn focus_existing(&self, path: &Path) -> bool {
        let handle = self.table().get(&normalize_key(path)).map(|e| e.handle);

        match handle {
            Some(InstanceHandle::Pid(pid)) => {
                let focused = self.host.focus_any_window_of(pid);
                debug!("Focus PID {} for {:?}: {}", pid, path, focused);
                focused
            }
            _ => false,
        }
    }

    /// [`Registry::focus_existing`] on the blocking pool.
    ///
    /// Window focusing shells out to desktop tools and waits for them.
    pub async fn focus_existing_off_thread(self: &Arc<Self>, path: &Path) -> bool {
        let registry = Arc::clone(self);
        let path_owned = path.to_path_buf();
        match tokio::task::spawn_blocking(move || registry.focus_existing(&path_owned)).await {
            Ok(focused) => focused,
            Err(e) => {
                warn!("Focus task for {:?} failed: {}", path, e);
                false
            }
        }
    }

    /// Clear the whole table when no runtime process exists at all.
    ///
    /// Covers a crashed compatibility layer, where per-entry liveness checks
    /// would only fire when each program happens to be looked up again.
    pub fn cleanup_stale(&self) {
        if self.host.runtime_active() {
            return;
        }

        let mut table = self.table();
        if !table.is_empty() {
            info!(
                "Runtime is not active, clearing {} registry entries",
                table.len()
            );
            table.clear();
        }
    }

    /// Atomically check that a program is not running and register it as pending.
    ///
    /// Returns `None` when a launch is in flight or a live process holds the entry.
    /// The returned guard removes its own entry when dropped.
    pub fn acquire(self: &Arc<Self>, path: &Path) -> Option<Registration> {
        let key = normalize_key(path);
        let mut table = self.table();

        if let Some(existing) = table.get(&key) {
            match existing.handle {
                InstanceHandle::Pending => return None,
                InstanceHandle::Pid(pid) if self.host.is_alive(pid) => return None,
                InstanceHandle::Pid(pid) => {
                    debug!("Replacing stale entry for {:?} (PID {})", existing.path, pid);
                }
            }
        }

        let entry = self.new_entry(path, InstanceHandle::Pending);
        let token = entry.token;
        table.insert(key.clone(), entry);

        Some(Registration {
            registry: Arc::clone(self),
            key,
            token,
        })
    }

    /// Get the handle registered for a program
    pub fn handle(&self, path: &Path) -> Option<InstanceHandle> {
        self.table().get(&normalize_key(path)).map(|e| e.handle)
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    fn update_pid(&self, key: &str, token: u64, pid: u32) {
        if let Some(entry) = self.table().get_mut(key) {
            if entry.token == token {
                entry.handle = InstanceHandle::Pid(pid);
            }
        }
    }

    fn release(&self, key: &str, token: u64) {
        let mut table = self.table();
        if table.get(key).is_some_and(|e| e.token == token) {
            table.remove(key);
            debug!("Released registration {} for {}", token, key);
        }
    }
}

/// Registration held for the duration of one run
pub struct Registration {
    registry: Arc<Registry>,
    key: String,
    token: u64,
}

impl Registration {
    /// Attach the launched process to the entry
    pub fn set_pid(&self, pid: u32) {
        self.registry.update_pid(&self.key, self.token, pid);
    }

}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.release(&self.key, self.token);
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("token", &self.token)
            .finish()
    }
}

//! Runtime collaborators - The compatibility layer and host services the core drives
//!
//! Each collaborator is a trait so a workspace can be assembled with the real
//! Wine-backed implementations or with in-memory doubles.

mod file_type;
mod shortcut;
mod system;
mod wine;

pub use file_type::FileCommand;
pub use shortcut::{windows_path_to_host, LnkResolver};
pub use system::SystemProcesses;
pub use wine::WineLauncher;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;

/// A single request to start a program through the runtime.
#[derive(Debug, Clone, Default)]
pub struct LaunchRequest {
    /// Host path of the executable or shortcut to invoke
    pub target: PathBuf,
    /// Arguments passed to the program
    pub arguments: Vec<String>,
    /// Environment overrides layered over the inherited environment
    pub environment: HashMap<String, String>,
    /// Ask the runtime for verbose diagnostics (installer runs)
    pub diagnostics: bool,
}

impl LaunchRequest {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn with_arguments(mut self, args: Vec<String>) -> Self {
        self.arguments = args;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

/// Starts processes inside the compatibility layer.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Start the program. Returns once the process exists, not when it exits.
    async fn spawn(&self, request: LaunchRequest) -> Result<Box<dyn LaunchedProcess>>;
}

/// A process started by a [`ProcessLauncher`].
#[async_trait]
pub trait LaunchedProcess: Send {
    /// Operating system process ID, if the launcher exposes one.
    fn pid(&self) -> Option<u32>;

    /// Wait for the process to finish and return its exit code.
    ///
    /// Callers never need to drain output for this to complete.
    async fn wait(&mut self) -> Result<i32>;
}

/// Resolves shortcut files to the executable they point at.
#[async_trait]
pub trait ShortcutResolver: Send + Sync {
    /// Resolve `shortcut` to a host path, interpreting Windows paths relative to `context_root`.
    async fn resolve(&self, shortcut: &Path, context_root: &Path) -> Result<PathBuf>;
}

/// Produces a textual description of a file's type.
#[async_trait]
pub trait FileTypeIdentifier: Send + Sync {
    async fn identify(&self, path: &Path) -> Result<String>;
}

/// Host process services used by the running-instance registry.
pub trait HostProcesses: Send + Sync {
    /// Check whether a process is still alive.
    fn is_alive(&self, pid: u32) -> bool;

    /// Bring any window of the process to the foreground. Returns false if none was found.
    fn focus_any_window_of(&self, pid: u32) -> bool;

    /// Whether any process of the compatibility layer is running at all.
    fn runtime_active(&self) -> bool;
}

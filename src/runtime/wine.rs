//! Wine process launching - Spawning programs inside a workspace prefix

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use chrono::Local;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::{LaunchRequest, LaunchedProcess, ProcessLauncher};
use crate::core::WorkspaceSettings;
use crate::error::{Error, Result};

/// Launches programs with `wine start /wait /unix`, which accepts both
/// executables and shortcut files and only returns once the program exits.
pub struct WineLauncher {
    /// Runtime binary (`wine`, or an absolute path to a bundled build)
    runtime_binary: PathBuf,
    /// Workspace root, exported as `WINEPREFIX`
    prefix: PathBuf,
    /// Environment applied to every launch
    base_environment: Vec<(String, String)>,
    /// `WINEDEBUG` channels for diagnostic runs
    debug_channels: String,
    /// Where diagnostic runs write the runtime's stderr
    logs_directory: PathBuf,
}

impl WineLauncher {
    pub fn new(prefix: impl Into<PathBuf>, settings: &WorkspaceSettings) -> Self {
        Self {
            runtime_binary: settings.runtime_binary.clone(),
            prefix: prefix.into(),
            base_environment: settings.environment.clone(),
            debug_channels: settings.installer_debug_channels.clone(),
            logs_directory: settings.get_logs_directory(),
        }
    }

    /// Open a fresh log file for a diagnostic run
    fn open_diagnostic_log(&self, target: &Path) -> Result<(PathBuf, std::fs::File)> {
        std::fs::create_dir_all(&self.logs_directory)
            .map_err(|e| Error::io_with_path(e, &self.logs_directory))?;

        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "program".to_string());
        let log_path = self.logs_directory.join(format!(
            "{}-{}.log",
            stem,
            Local::now().format("%Y%m%d-%H%M%S")
        ));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| Error::io_with_path(e, &log_path))?;
        Ok((log_path, file))
    }
}

#[async_trait]
impl ProcessLauncher for WineLauncher {
    async fn spawn(&self, request: LaunchRequest) -> Result<Box<dyn LaunchedProcess>> {
        let program = request
            .target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| request.target.display().to_string());

        info!(
            "Launching {:?} in prefix {:?} (diagnostics: {})",
            request.target, self.prefix, request.diagnostics
        );

        let mut cmd = Command::new(&self.runtime_binary);
        cmd.arg("start")
            .arg("/wait")
            .arg("/unix")
            .arg(&request.target)
            .args(&request.arguments);

        if let Some(parent) = request.target.parent() {
            cmd.current_dir(parent);
        }

        cmd.env("WINEPREFIX", &self.prefix);
        for (key, value) in &self.base_environment {
            cmd.env(key, value);
        }
        for (key, value) in &request.environment {
            cmd.env(key, value);
        }

        // Output is never read; completion is observed through the exit status
        cmd.stdin(Stdio::null()).stdout(Stdio::null());
        if request.diagnostics {
            cmd.env("WINEDEBUG", &self.debug_channels);
            match self.open_diagnostic_log(&request.target) {
                Ok((log_path, file)) => {
                    info!("Writing runtime diagnostics to {:?}", log_path);
                    cmd.stderr(Stdio::from(file));
                }
                Err(e) => {
                    warn!("Diagnostics requested but no log file available: {}", e);
                    cmd.stderr(Stdio::null());
                }
            }
        } else {
            cmd.stderr(Stdio::null());
        }

        // Detach from our process group so a terminal interrupt does not take the program down
        #[cfg(unix)]
        {
            unsafe {
                cmd.pre_exec(|| {
                    libc::setsid();
                    Ok(())
                });
            }
        }

        let child = cmd.spawn().map_err(|e| Error::LaunchFailed {
            program: program.clone(),
            message: format!("could not start {:?}: {}", self.runtime_binary, e),
            exit_code: None,
        })?;

        debug!("Spawned runtime process with PID {:?}", child.id());
        Ok(Box::new(WineProcess { child, program }))
    }
}

/// A running `wine start` process.
struct WineProcess {
    child: Child,
    program: String,
}

#[async_trait]
impl LaunchedProcess for WineProcess {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(&mut self) -> Result<i32> {
        let status = self.child.wait().await.map_err(|e| Error::LaunchFailed {
            program: self.program.clone(),
            message: format!("lost track of process: {}", e),
            exit_code: None,
        })?;
        // Killed by a signal: no code, report as failure
        Ok(status.code().unwrap_or(-1))
    }
}

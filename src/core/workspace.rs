//! Workspace - One Wine prefix with its registry, watcher and services

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use super::launcher::Launcher;
use super::program::{DiscoveredProgram, Program};
use super::registry::Registry;
use super::settings::WorkspaceSettings;
use super::watcher::{ChangeCallback, DesktopWatcher, WatchTarget};
use crate::discovery::{Classifier, Discovery};
use crate::error::{Error, Result};
use crate::runtime::{
    FileCommand, FileTypeIdentifier, HostProcesses, LnkResolver, ProcessLauncher, ShortcutResolver,
    SystemProcesses, WineLauncher,
};

/// Directory of the `C:` drive inside a prefix
pub const SYSTEM_DRIVE: &str = "drive_c";

/// Per-user directories that never hold a real user's desktop
const SHARED_ACCOUNTS: &[&str] = &["Public", "Default"];

const PROGRAM_FILES: &[&str] = &["Program Files", "Program Files (x86)"];

const PUBLIC_DESKTOP: &str = "users/Public/Desktop";

const START_MENU: &str = "ProgramData/Microsoft/Windows/Start Menu";

/// External services a workspace drives
#[derive(Clone)]
pub struct WorkspaceServices {
    pub process_launcher: Arc<dyn ProcessLauncher>,
    pub resolver: Arc<dyn ShortcutResolver>,
    pub identifier: Arc<dyn FileTypeIdentifier>,
    pub host: Arc<dyn HostProcesses>,
}

impl WorkspaceServices {
    /// Wine, `lnk` parsing, `file` and the host process table
    pub fn system(root: &Path, settings: &WorkspaceSettings) -> Self {
        Self {
            process_launcher: Arc::new(WineLauncher::new(root, settings)),
            resolver: Arc::new(LnkResolver::new()),
            identifier: Arc::new(FileCommand::new()),
            host: Arc::new(SystemProcesses::new(&settings.runtime_process_names)),
        }
    }
}

/// An isolated environment for running Windows programs.
///
/// Owns the running-instance registry and at most one desktop watcher.
/// Neither outlives the workspace.
pub struct Workspace {
    root: PathBuf,
    settings: WorkspaceSettings,
    registry: Arc<Registry>,
    process_launcher: Arc<dyn ProcessLauncher>,
    resolver: Arc<dyn ShortcutResolver>,
    classifier: Classifier,
    watcher: Mutex<Option<DesktopWatcher>>,
}

impl Workspace {
    /// Open a workspace directory with its stored settings and the system services
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::Config {
                message: format!("workspace {:?} is not a directory", root),
            });
        }
        let root = std::fs::canonicalize(root).map_err(|e| Error::io_with_path(e, root))?;

        let settings = WorkspaceSettings::load(&root)?;
        let services = WorkspaceServices::system(&root, &settings);
        let workspace = Self::with_services(root, settings, services);
        workspace.cleanup_stale();

        info!("Opened workspace {:?}", workspace.root);
        Ok(workspace)
    }

    /// Build a workspace from explicit services
    pub fn with_services(root: impl Into<PathBuf>, settings: WorkspaceSettings, services: WorkspaceServices) -> Self {
        let classifier = Classifier::new(services.identifier).with_stub_size_limit(settings.stub_size_limit);
        Self {
            root: root.into(),
            registry: Arc::new(Registry::new(services.host)),
            process_launcher: services.process_launcher,
            resolver: services.resolver,
            classifier,
            settings,
            watcher: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &WorkspaceSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn process_launcher(&self) -> &Arc<dyn ProcessLauncher> {
        &self.process_launcher
    }

    pub fn resolver(&self) -> &Arc<dyn ShortcutResolver> {
        &self.resolver
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn drive_c(&self) -> PathBuf {
        self.root.join(SYSTEM_DRIVE)
    }

    pub fn program_files_directories(&self) -> Vec<PathBuf> {
        let drive = self.drive_c();
        PROGRAM_FILES.iter().map(|dir| drive.join(dir)).collect()
    }

    pub fn public_desktop(&self) -> PathBuf {
        self.drive_c().join(PUBLIC_DESKTOP)
    }

    pub fn start_menu(&self) -> PathBuf {
        self.drive_c().join(START_MENU)
    }

    /// Desktop folders of real users.
    ///
    /// Skips shared accounts and any user or desktop directory that is a
    /// symbolic link, since Wine links those to folders on the host.
    pub fn user_desktops(&self) -> Vec<PathBuf> {
        let users = self.drive_c().join("users");
        let entries = match std::fs::read_dir(&users) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot list {:?}: {}", users, e);
                return Vec::new();
            }
        };

        let mut desktops: Vec<PathBuf> = entries
            .flatten()
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                !SHARED_ACCOUNTS.iter().any(|s| s.eq_ignore_ascii_case(&name))
            })
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir() && !t.is_symlink()))
            .map(|entry| entry.path().join("Desktop"))
            .filter(|desktop| {
                std::fs::symlink_metadata(desktop).is_ok_and(|m| m.is_dir() && !m.file_type().is_symlink())
            })
            .collect();
        desktops.sort();
        desktops
    }

    /// Every directory that may receive shortcuts from an installer
    pub fn shortcut_directories(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.public_desktop(), self.start_menu()];
        dirs.extend(self.user_desktops());
        dirs
    }

    fn watch_targets(&self) -> Vec<WatchTarget> {
        let start_menu = self.start_menu();
        self.shortcut_directories()
            .into_iter()
            .map(|path| {
                let recursive = path == start_menu;
                WatchTarget::new(path, recursive)
            })
            .collect()
    }

    fn lock_watcher(&self) -> MutexGuard<'_, Option<DesktopWatcher>> {
        self.watcher.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start watching the shortcut directories. Does nothing if already watching.
    pub fn start_watching(&self, callback: ChangeCallback) -> Result<()> {
        let mut watcher = self.lock_watcher();
        if watcher.is_some() {
            debug!("Already watching {:?}", self.root);
            return Ok(());
        }

        *watcher = Some(DesktopWatcher::start(
            &self.watch_targets(),
            self.settings.quiet_period(),
            callback,
        )?);
        Ok(())
    }

    /// Stop watching. Does nothing if not watching.
    pub fn stop_watching(&self) {
        if let Some(mut watcher) = self.lock_watcher().take() {
            watcher.stop();
        }
    }

    pub fn is_watching(&self) -> bool {
        self.lock_watcher().is_some()
    }

    /// Find programs installed into this workspace
    pub async fn discover_programs(&self) -> Vec<DiscoveredProgram> {
        Discovery::new(
            &self.root,
            self.shortcut_directories(),
            self.program_files_directories(),
            self.classifier.clone(),
            Arc::clone(&self.resolver),
        )
        .with_depths(self.settings.shortcut_scan_depth, self.settings.program_scan_depth)
        .discover()
        .await
    }

    /// Launcher for a program of this workspace
    pub fn launcher_for(&self, program: Program) -> Arc<Launcher> {
        Arc::new(Launcher::new(program))
    }

    /// Clear the registry if the runtime is not running at all
    pub fn cleanup_stale(&self) {
        self.registry.cleanup_stale();
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.stop_watching();
    }
}

//! Workspace settings management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Settings file name inside a workspace root
pub const SETTINGS_FILE: &str = "winedock.json";

/// Per-workspace settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    // Runtime
    /// Compatibility layer binary used to start programs
    pub runtime_binary: PathBuf,
    /// Process names that indicate the runtime is active
    pub runtime_process_names: Vec<String>,
    /// Environment variables applied to every launch
    pub environment: Vec<(String, String)>,
    /// `WINEDEBUG` channels used when running installers
    pub installer_debug_channels: String,

    // Watching
    /// Quiet period after the last filesystem event before notifying
    pub quiet_period_ms: u64,

    // Discovery
    /// Maximum depth below each shortcut directory
    pub shortcut_scan_depth: usize,
    /// Maximum depth below each Program Files directory
    pub program_scan_depth: usize,
    /// Executables at or above this size are never stubs
    pub stub_size_limit: u64,

    // Advanced
    /// Custom directory for runtime diagnostic logs
    pub logs_directory: Option<PathBuf>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            // Runtime
            runtime_binary: PathBuf::from("wine"),
            runtime_process_names: vec![
                "wineserver".to_string(),
                "wine".to_string(),
                "wine64".to_string(),
                "wine-preloader".to_string(),
                "wine64-preloader".to_string(),
            ],
            environment: Vec::new(),
            installer_debug_channels: "+loaddll,+module,warn+all".to_string(),

            // Watching
            quiet_period_ms: 500,

            // Discovery
            shortcut_scan_depth: 5,
            program_scan_depth: 3,
            stub_size_limit: 50_000,

            // Advanced
            logs_directory: None,
        }
    }
}

impl WorkspaceSettings {
    /// Load settings for a workspace, falling back to defaults when no file exists
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(SETTINGS_FILE);
        if !path.exists() {
            debug!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
        let mut settings: Self = serde_json::from_str(&contents).map_err(|e| Error::Config {
            message: format!("invalid settings file {:?}: {}", path, e),
        })?;
        settings.validate();
        info!("Loaded workspace settings from {:?}", path);
        Ok(settings)
    }

    /// Write settings into the workspace root
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = root.join(SETTINGS_FILE);
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| Error::io_with_path(e, &path))?;
        Ok(())
    }

    /// Get the logs directory, using default if not set
    pub fn get_logs_directory(&self) -> PathBuf {
        self.logs_directory.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("winedock")
                .join("logs")
        })
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }

    /// Validate settings and fix any invalid values
    pub fn validate(&mut self) {
        self.quiet_period_ms = self.quiet_period_ms.max(50);
        self.shortcut_scan_depth = self.shortcut_scan_depth.clamp(1, 16);
        self.program_scan_depth = self.program_scan_depth.clamp(1, 16);
        if self.stub_size_limit == 0 {
            self.stub_size_limit = Self::default().stub_size_limit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = WorkspaceSettings::load(temp.path()).unwrap();
        assert_eq!(settings.quiet_period(), Duration::from_millis(500));
        assert_eq!(settings.shortcut_scan_depth, 5);
        assert_eq!(settings.program_scan_depth, 3);
        assert_eq!(settings.stub_size_limit, 50_000);
    }

    #[test]
    fn test_save_and_load_keeps_changes() {
        let temp = TempDir::new().unwrap();
        let settings = WorkspaceSettings {
            runtime_binary: PathBuf::from("/opt/wine/bin/wine64"),
            environment: vec![("DXVK_HUD".to_string(), "fps".to_string())],
            ..Default::default()
        };
        settings.save(temp.path()).unwrap();

        let loaded = WorkspaceSettings::load(temp.path()).unwrap();
        assert_eq!(loaded.runtime_binary, PathBuf::from("/opt/wine/bin/wine64"));
        assert_eq!(loaded.environment, settings.environment);
    }

    #[test]
    fn test_partial_file_fills_defaults_and_validates() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(SETTINGS_FILE),
            r#"{ "quiet_period_ms": 1, "program_scan_depth": 99 }"#,
        )
        .unwrap();

        let loaded = WorkspaceSettings::load(temp.path()).unwrap();
        assert_eq!(loaded.quiet_period_ms, 50);
        assert_eq!(loaded.program_scan_depth, 16);
        assert_eq!(loaded.shortcut_scan_depth, 5);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(SETTINGS_FILE), "{ not json").unwrap();
        assert!(matches!(
            WorkspaceSettings::load(temp.path()),
            Err(Error::Config { .. })
        ));
    }
}

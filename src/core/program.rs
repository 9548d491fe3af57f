//! Programs - What a launcher runs and what discovery finds

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for a launcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LauncherId(pub Uuid);

impl LauncherId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LauncherId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LauncherId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A program inside a workspace that can be launched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Display name
    pub name: String,
    /// Host path to the executable or shortcut
    pub path: PathBuf,
    /// Command line arguments
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Environment variables to set for this program only
    #[serde(default)]
    pub environment: Vec<(String, String)>,
}

impl Program {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Program named after its file
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(String::new(), path)
    }

    pub fn with_arguments(mut self, args: Vec<String>) -> Self {
        self.arguments = args;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.push((key.into(), value.into()));
        self
    }

    /// Get the display name, falling back to the file name
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Unknown")
        } else {
            &self.name
        }
    }
}

/// A program found by a discovery pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredProgram {
    /// Cleaned display name
    pub name: String,
    /// Resolved executable path
    pub path: PathBuf,
    /// Whether a shortcut led to this program
    pub from_shortcut: bool,
}

impl From<DiscoveredProgram> for Program {
    fn from(discovered: DiscoveredProgram) -> Self {
        Program::new(discovered.name, discovered.path)
    }
}

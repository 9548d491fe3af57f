//! File type identification through the host `file` utility

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::FileTypeIdentifier;
use crate::error::{Error, Result};

/// Runs `file -b` on the target and returns its description.
#[derive(Debug, Clone)]
pub struct FileCommand {
    program: PathBuf,
}

impl FileCommand {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("file"),
        }
    }

    /// Use a specific `file` binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FileCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileTypeIdentifier for FileCommand {
    async fn identify(&self, path: &Path) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-b")
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::Classification {
                path: path.to_path_buf(),
                message: format!("could not run {:?}: {}", self.program, e),
            })?;

        if !output.status.success() {
            return Err(Error::Classification {
                path: path.to_path_buf(),
                message: format!(
                    "{:?} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let description = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if description.is_empty() {
            return Err(Error::Classification {
                path: path.to_path_buf(),
                message: "empty description".to_string(),
            });
        }
        Ok(description)
    }
}

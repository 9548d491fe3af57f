//! Bounded recursive directory scanning

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::classifier::has_extension;

/// Finds files with one extension below a root, down to a fixed depth.
///
/// Files directly inside the root are at depth 1. Symbolic links are
/// followed, but the depth bound holds regardless of link structure and
/// link cycles are reported and skipped.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    extension: String,
    max_depth: usize,
}

impl DirectoryScanner {
    pub fn new(extension: impl Into<String>, max_depth: usize) -> Self {
        Self {
            extension: extension.into(),
            max_depth,
        }
    }

    /// Scan a root on the blocking pool
    pub async fn scan(&self, root: &Path) -> Vec<PathBuf> {
        let scanner = self.clone();
        let root = root.to_path_buf();
        match tokio::task::spawn_blocking(move || scanner.scan_blocking(&root)).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Directory scan task failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Scan a root on the current thread.
    ///
    /// A missing root yields nothing. Unreadable subdirectories are logged
    /// and skipped without stopping the walk.
    pub fn scan_blocking(&self, root: &Path) -> Vec<PathBuf> {
        if !root.is_dir() {
            debug!("Skipping missing scan root {:?}", root);
            return Vec::new();
        }

        let mut found = Vec::new();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(self.max_depth)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(
                        "Skipping unreadable entry {:?} during scan of {:?}: {}",
                        e.path(),
                        root,
                        e
                    );
                    continue;
                }
            };

            if entry.file_type().is_file() && has_extension(entry.path(), &self.extension) {
                found.push(entry.into_path());
            }
        }

        debug!(
            "Found {} .{} files below {:?} (depth {})",
            found.len(),
            self.extension,
            root,
            self.max_depth
        );
        found
    }
}

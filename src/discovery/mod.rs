//! Program discovery - Finding what an installer just put into a workspace
//!
//! A pass scans shortcut directories first and resolves every shortcut, then
//! scans Program Files for executables that no shortcut already covered.
//! Failures along the way only shrink the result; a pass never errors.

pub mod classifier;
pub mod naming;
pub mod scanner;

pub use classifier::{installer_name, is_uninstaller, Classifier};
pub use naming::clean_program_name;
pub use scanner::DirectoryScanner;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::core::paths::normalize_key;
use crate::core::DiscoveredProgram;
use crate::runtime::ShortcutResolver;
use classifier::{EXECUTABLE_EXTENSION, SHORTCUT_EXTENSION};

/// Default depth below each shortcut directory
pub const SHORTCUT_SCAN_DEPTH: usize = 5;

/// Default depth below each Program Files directory
pub const PROGRAM_SCAN_DEPTH: usize = 3;

/// One configured discovery pass over a workspace
pub struct Discovery {
    /// Workspace root, used to interpret shortcut targets
    root: PathBuf,
    shortcut_roots: Vec<PathBuf>,
    program_roots: Vec<PathBuf>,
    shortcut_scanner: DirectoryScanner,
    program_scanner: DirectoryScanner,
    classifier: Classifier,
    resolver: Arc<dyn ShortcutResolver>,
}

impl Discovery {
    pub fn new(
        root: impl Into<PathBuf>,
        shortcut_roots: Vec<PathBuf>,
        program_roots: Vec<PathBuf>,
        classifier: Classifier,
        resolver: Arc<dyn ShortcutResolver>,
    ) -> Self {
        Self {
            root: root.into(),
            shortcut_roots,
            program_roots,
            shortcut_scanner: DirectoryScanner::new(SHORTCUT_EXTENSION, SHORTCUT_SCAN_DEPTH),
            program_scanner: DirectoryScanner::new(EXECUTABLE_EXTENSION, PROGRAM_SCAN_DEPTH),
            classifier,
            resolver,
        }
    }

    /// Override the scan depths
    pub fn with_depths(mut self, shortcut_depth: usize, program_depth: usize) -> Self {
        self.shortcut_scanner = DirectoryScanner::new(SHORTCUT_EXTENSION, shortcut_depth);
        self.program_scanner = DirectoryScanner::new(EXECUTABLE_EXTENSION, program_depth);
        self
    }

    /// Run the pass.
    ///
    /// Shortcut entries come first. No two entries share a resolved path, and
    /// an executable reached through a shortcut is reported only once, as the
    /// shortcut entry.
    pub async fn discover(&self) -> Vec<DiscoveredProgram> {
        let mut programs = Vec::new();
        let mut seen = HashSet::new();

        for root in &self.shortcut_roots {
            for shortcut in self.shortcut_scanner.scan(root).await {
                let target = match self.resolver.resolve(&shortcut, &self.root).await {
                    Ok(target) => target,
                    Err(e) => {
                        debug!("Skipping shortcut {:?}: {}", shortcut, e);
                        continue;
                    }
                };

                if self.classifier.is_uninstaller(&shortcut)
                    || self.classifier.is_uninstaller(&target)
                {
                    debug!("Skipping uninstaller shortcut {:?}", shortcut);
                    continue;
                }
                if !seen.insert(normalize_key(&target)) {
                    debug!("{:?} already discovered, skipping {:?}", target, shortcut);
                    continue;
                }
                programs.push(DiscoveredProgram {
                    name: clean_program_name(&shortcut),
                    path: target,
                    from_shortcut: true,
                });
            }
        }
        let shortcut_count = programs.len();

        for root in &self.program_roots {
            for executable in self.program_scanner.scan(root).await {
                if self.classifier.is_uninstaller(&executable) {
                    debug!("Skipping uninstaller {:?}", executable);
                    continue;
                }
                if !seen.insert(normalize_key(&executable)) {
                    continue;
                }
                if self.classifier.is_stub(&executable).await {
                    debug!("Skipping runtime stub {:?}", executable);
                    continue;
                }
                programs.push(DiscoveredProgram {
                    name: clean_program_name(&executable),
                    path: executable,
                    from_shortcut: false,
                });
            }
        }

        info!(
            "Discovered {} programs ({} from shortcuts) in {:?}",
            programs.len(),
            shortcut_count,
            self.root
        );
        programs
    }
}

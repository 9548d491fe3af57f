//! Installer, uninstaller and stub heuristics
//!
//! All checks are pure functions of a file's path, name and content. Name
//! checks run first so the slower content checks only happen when needed.

use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use crate::runtime::FileTypeIdentifier;

/// Extension of Windows executables
pub const EXECUTABLE_EXTENSION: &str = "exe";

/// Extension of Windows shell links
pub const SHORTCUT_EXTENSION: &str = "lnk";

/// Executables at or above this size are never stubs
pub const DEFAULT_STUB_SIZE_LIMIT: u64 = 50_000;

const UNINSTALLER_KEYWORDS: &[&str] = &["uninstall", "unins"];

const INSTALLER_KEYWORDS: &[&str] = &["setup", "install", "installer"];

/// Lowercased `file` descriptions of common installer technologies
const INSTALLER_SIGNATURES: &[&str] = &[
    "nullsoft installer",
    "inno setup",
    "installshield",
    "wise installer",
    "msi installer",
    "windows installer",
];

/// Places where the runtime drops placeholder executables
const STUB_LOCATIONS: &[&str] = &[
    "/windows/system32/",
    "/windows/syswow64/",
    "/windows/command/",
    "/program files/internet explorer/",
    "/program files (x86)/internet explorer/",
    "/program files/windows media player/",
    "/program files (x86)/windows media player/",
    "/program files/windows nt/",
    "/program files (x86)/windows nt/",
];

const STUB_MARKERS: &[&[u8]] = &[b"stub", b"STUB"];

/// One pattern per installer keyword, longest keyword first, each matching
/// the keyword together with a separator on either side.
static INSTALLER_TOKEN_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let mut keywords = INSTALLER_KEYWORDS.to_vec();
    keywords.sort_by(|a, b| b.len().cmp(&a.len()));
    keywords
        .into_iter()
        .map(|keyword| {
            Regex::new(&format!(r"(?i)(?:[_\- ]{0}|{0}[_\- ])", regex::escape(keyword)))
                .expect("installer keyword pattern is valid")
        })
        .collect()
});

/// Case-insensitive extension check
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Lowercased file name without extension
fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Whether the file name marks an uninstaller
pub fn is_uninstaller(path: &Path) -> bool {
    let base = base_name(path);
    UNINSTALLER_KEYWORDS.iter().any(|k| base.contains(k))
}

/// Derive a program name from an installer's file name.
///
/// `NetFile_Setup.exe` becomes `NetFile`, `install_chrome.exe` becomes
/// `chrome`. Falls back to the file name when nothing is left.
pub fn installer_name(path: &Path) -> String {
    let mut name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    for pattern in INSTALLER_TOKEN_PATTERNS.iter() {
        loop {
            let stripped = pattern.replace_all(&name, "").into_owned();
            if stripped == name {
                break;
            }
            name = stripped;
        }
    }

    let trimmed = name.trim_matches(|c: char| c == '_' || c == '-' || c.is_whitespace());
    if trimmed.is_empty() {
        file_name(path)
    } else {
        trimmed.to_string()
    }
}

fn contains_stub_marker(bytes: &[u8]) -> bool {
    STUB_MARKERS
        .iter()
        .any(|marker| bytes.windows(marker.len()).any(|w| w == *marker))
}

/// Heuristic classifier for executables in a workspace
#[derive(Clone)]
pub struct Classifier {
    identifier: Arc<dyn FileTypeIdentifier>,
    stub_size_limit: u64,
}

impl Classifier {
    pub fn new(identifier: Arc<dyn FileTypeIdentifier>) -> Self {
        Self {
            identifier,
            stub_size_limit: DEFAULT_STUB_SIZE_LIMIT,
        }
    }

    pub fn with_stub_size_limit(mut self, limit: u64) -> Self {
        self.stub_size_limit = limit;
        self
    }

    pub fn is_uninstaller(&self, path: &Path) -> bool {
        is_uninstaller(path)
    }

    /// Whether the file is a small placeholder executable shipped by the runtime.
    ///
    /// Checks extension, size and location before reading any content.
    pub async fn is_stub(&self, path: &Path) -> bool {
        if !has_extension(path, EXECUTABLE_EXTENSION) {
            return false;
        }

        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) => {
                debug!("Cannot stat {:?} for stub check: {}", path, e);
                return false;
            }
        };
        if !metadata.is_file() || metadata.len() >= self.stub_size_limit {
            return false;
        }

        let location = path.to_string_lossy().replace('\\', "/").to_lowercase();
        if !STUB_LOCATIONS.iter().any(|l| location.contains(l)) {
            return false;
        }

        match tokio::fs::read(path).await {
            Ok(bytes) => contains_stub_marker(&bytes),
            Err(e) => {
                debug!("Cannot read {:?} for stub check: {}", path, e);
                false
            }
        }
    }

    /// Whether the file is an installer.
    ///
    /// The file name decides when it carries a keyword; uninstaller keywords
    /// win over installer keywords. Otherwise the file type description is
    /// matched against known installer technologies. A file that cannot be
    /// identified is not an installer.
    pub async fn is_installer(&self, path: &Path) -> bool {
        let base = base_name(path);
        if UNINSTALLER_KEYWORDS.iter().any(|k| base.contains(k)) {
            return false;
        }
        if INSTALLER_KEYWORDS.iter().any(|k| base.contains(k)) {
            return true;
        }

        match self.identifier.identify(path).await {
            Ok(description) => {
                let description = description.to_lowercase();
                let matched = INSTALLER_SIGNATURES.iter().any(|s| description.contains(s));
                debug!("{:?} identified as {:?} (installer: {})", path, description, matched);
                matched
            }
            Err(e) => {
                debug!("Treating {:?} as not an installer: {}", path, e);
                false
            }
        }
    }
}

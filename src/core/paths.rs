//! Path normalization used for lookup keys and de-duplication

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without touching the filesystem
pub fn lexically_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Case-folded absolute form of a path.
///
/// Programs inside a prefix live on a case-insensitive Windows namespace, so
/// `Game.EXE` and `game.exe` name the same executable.
pub fn normalize_key(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    lexically_normalize(&absolute)
        .to_string_lossy()
        .replace('\\', "/")
        .to_lowercase()
}

/// Find an existing path that matches `path` up to ASCII case.
///
/// Shortcut targets are written against a case-insensitive namespace while
/// the host filesystem usually is not. Exact matches win over folded ones.
pub fn find_case_insensitive(path: &Path) -> Option<PathBuf> {
    if path.exists() {
        return Some(path.to_path_buf());
    }

    let mut found = PathBuf::new();
    for component in path.components() {
        let Component::Normal(name) = component else {
            found.push(component.as_os_str());
            continue;
        };

        let exact = found.join(name);
        if exact.exists() {
            found = exact;
            continue;
        }

        let wanted = name.to_string_lossy();
        let dir = if found.as_os_str().is_empty() {
            Path::new(".")
        } else {
            found.as_path()
        };
        let matched = std::fs::read_dir(dir)
            .ok()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name())
            .find(|candidate| candidate.to_string_lossy().eq_ignore_ascii_case(&wanted))?;
        found.push(matched);
    }
    Some(found)
}

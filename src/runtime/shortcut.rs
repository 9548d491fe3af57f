//! Shortcut resolution - Following `.lnk` files to their target executables

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::ShortcutResolver;
use crate::core::paths::{find_case_insensitive, lexically_normalize};
use crate::error::{Error, Result};

/// Reads Windows shell links with the `lnk` crate and maps their target into the prefix.
#[derive(Debug, Default, Clone, Copy)]
pub struct LnkResolver;

impl LnkResolver {
    pub fn new() -> Self {
        Self
    }

    fn resolve_blocking(shortcut: &Path, context_root: &Path) -> Result<PathBuf> {
        let link = lnk::ShellLink::open(shortcut).map_err(|e| Error::ShortcutResolution {
            path: shortcut.to_path_buf(),
            message: format!("unreadable shell link: {:?}", e),
        })?;

        let absolute = link
            .link_info()
            .as_ref()
            .and_then(|info| info.local_base_path().clone());

        let target = if let Some(windows_path) = absolute {
            windows_path_to_host(context_root, &windows_path).ok_or_else(|| {
                Error::ShortcutResolution {
                    path: shortcut.to_path_buf(),
                    message: format!("target {} is not a drive path", windows_path),
                }
            })?
        } else if let Some(relative) = link.relative_path() {
            let base = shortcut.parent().unwrap_or(context_root);
            lexically_normalize(&base.join(relative.replace('\\', "/")))
        } else {
            return Err(Error::ShortcutResolution {
                path: shortcut.to_path_buf(),
                message: "link has no target path".to_string(),
            });
        };

        let target = match find_case_insensitive(&target) {
            Some(found) if found.is_file() => found,
            _ => {
                return Err(Error::ShortcutResolution {
                    path: shortcut.to_path_buf(),
                    message: format!("target {:?} does not exist", target),
                })
            }
        };

        debug!("Resolved {:?} -> {:?}", shortcut, target);
        Ok(target)
    }
}

#[async_trait]
impl ShortcutResolver for LnkResolver {
    async fn resolve(&self, shortcut: &Path, context_root: &Path) -> Result<PathBuf> {
        let shortcut_owned = shortcut.to_path_buf();
        let root = context_root.to_path_buf();
        tokio::task::spawn_blocking(move || Self::resolve_blocking(&shortcut_owned, &root))
            .await
            .map_err(|e| Error::ShortcutResolution {
                path: shortcut.to_path_buf(),
                message: format!("resolver task failed: {}", e),
            })?
    }
}

/// Map a Windows drive path onto the host filesystem of a prefix.
///
/// `C:` lives in `drive_c`; every other letter goes through the prefix's
/// `dosdevices` links. Returns `None` for paths without a drive letter.
pub fn windows_path_to_host(prefix: &Path, windows_path: &str) -> Option<PathBuf> {
    let normalized = windows_path.trim().replace('\\', "/");
    let mut chars = normalized.chars();
    let letter = chars.next()?.to_ascii_lowercase();
    if !letter.is_ascii_alphabetic() || chars.next()? != ':' {
        return None;
    }

    let mut host = if letter == 'c' {
        prefix.join("drive_c")
    } else {
        prefix.join("dosdevices").join(format!("{}:", letter))
    };

    for part in normalized[2..].split('/') {
        match part {
            "" | "." => {}
            ".." => {
                host.pop();
            }
            other => host.push(other),
        }
    }
    Some(host)
}

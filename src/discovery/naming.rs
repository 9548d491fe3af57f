//! Display names for discovered programs

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static TRAILING_INSTALLER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:installer|install|setup)$").expect("installer token pattern is valid")
});

static TRAILING_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\d+(\.\d+)*$").expect("version pattern is valid"));

/// Turn a shortcut or executable file name into a program name.
///
/// Drops the extension, a trailing `Setup`/`Installer`/`Install` token and a
/// trailing version number. Falls back to the file name when nothing is left.
pub fn clean_program_name(path: &Path) -> String {
    let original = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let without_token = TRAILING_INSTALLER_TOKEN.replace(&stem, "");
    let without_version = TRAILING_VERSION.replace(&without_token, "");
    let cleaned = without_version.trim();

    if cleaned.is_empty() {
        original
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_removed() {
        assert_eq!(clean_program_name(Path::new("/d/Game.lnk")), "Game");
        assert_eq!(clean_program_name(Path::new("/pf/Game/Game.exe")), "Game");
    }

    #[test]
    fn test_trailing_installer_token_is_removed() {
        assert_eq!(clean_program_name(Path::new("Game Setup.lnk")), "Game");
        assert_eq!(clean_program_name(Path::new("GameSetup.exe")), "Game");
        assert_eq!(clean_program_name(Path::new("Editor Installer.lnk")), "Editor");
        assert_eq!(clean_program_name(Path::new("Editor Install.lnk")), "Editor");
    }

    #[test]
    fn test_trailing_version_is_removed() {
        assert_eq!(clean_program_name(Path::new("Studio 2.10.3.lnk")), "Studio");
        assert_eq!(clean_program_name(Path::new("Studio 7.exe")), "Studio");
        // Version glued to the name is part of the name
        assert_eq!(clean_program_name(Path::new("Studio7.exe")), "Studio7");
    }

    #[test]
    fn test_empty_result_falls_back_to_file_name() {
        assert_eq!(clean_program_name(Path::new("Setup.exe")), "Setup.exe");
        assert_eq!(clean_program_name(Path::new("Install.lnk")), "Install.lnk");
    }
}

//! Integration tests for discovering programs in a workspace.

mod common;

use std::sync::Arc;

use common::{touch, workspace, FakeHost, FakeLauncher, FakeResolver, Outcome};
use tempfile::TempDir;
use winedock::DiscoveredProgram;

fn fresh_workspace(temp: &TempDir, resolver: Arc<FakeResolver>) -> winedock::Workspace {
    workspace(
        temp.path(),
        FakeLauncher::new(Outcome::Exit(0)),
        resolver,
        FakeHost::with_alive(&[]),
    )
}

#[tokio::test]
async fn test_shortcut_to_installed_game() {
    let temp = TempDir::new().unwrap();
    let drive = temp.path().join("drive_c");
    let shortcut = drive.join("users/Public/Desktop/Game.lnk");
    let game = drive.join("Program Files/Game/Game.exe");
    touch(&shortcut, b"L");
    touch(&game, b"MZ game");
    touch(&drive.join("Program Files/Game/unins000.exe"), b"MZ uninstaller");

    let ws = fresh_workspace(&temp, FakeResolver::with_link(&shortcut, &game));
    let found = ws.discover_programs().await;

    assert_eq!(
        found,
        vec![DiscoveredProgram {
            name: "Game".to_string(),
            path: game,
            from_shortcut: true,
        }]
    );
}

#[tokio::test]
async fn test_uninstall_shortcuts_are_not_programs() {
    let temp = TempDir::new().unwrap();
    let drive = temp.path().join("drive_c");
    let menu = drive.join("ProgramData/Microsoft/Windows/Start Menu/Programs/Game");
    let game_link = menu.join("Game.lnk");
    let uninstall_link = menu.join("Uninstall Game.lnk");
    let game = drive.join("Program Files/Game/Game.exe");
    let uninstaller = drive.join("Program Files/Game/unins000.exe");
    touch(&game_link, b"L");
    touch(&uninstall_link, b"L");
    touch(&game, b"MZ game");
    touch(&uninstaller, b"MZ uninstaller");

    let resolver = FakeResolver::with_link(&game_link, &game);
    resolver
        .links
        .lock()
        .unwrap()
        .insert(uninstall_link, uninstaller);

    let ws = fresh_workspace(&temp, resolver);
    let found = ws.discover_programs().await;

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Game");
    assert_eq!(found[0].path, game);
}

#[tokio::test]
async fn test_shortcuts_come_before_scanned_programs() {
    let temp = TempDir::new().unwrap();
    let drive = temp.path().join("drive_c");
    let shortcut = drive.join("ProgramData/Microsoft/Windows/Start Menu/Programs/Studio/Studio 2.1.lnk");
    let studio = drive.join("Program Files (x86)/Studio/studio.exe");
    touch(&shortcut, b"L");
    touch(&studio, b"MZ studio");
    touch(&drive.join("Program Files/Tool/Tool Setup.exe"), b"MZ tool");

    let ws = fresh_workspace(&temp, FakeResolver::with_link(&shortcut, &studio));
    let found = ws.discover_programs().await;

    let summary: Vec<(&str, bool)> = found
        .iter()
        .map(|p| (p.name.as_str(), p.from_shortcut))
        .collect();
    assert_eq!(summary, vec![("Studio", true), ("Tool", false)]);
}

#[tokio::test]
async fn test_user_desktops_are_scanned() {
    let temp = TempDir::new().unwrap();
    let drive = temp.path().join("drive_c");
    let shortcut = drive.join("users/alice/Desktop/Editor.lnk");
    let editor = drive.join("Editors/editor.exe");
    touch(&shortcut, b"L");
    touch(&editor, b"MZ editor");

    let ws = fresh_workspace(&temp, FakeResolver::with_link(&shortcut, &editor));
    let found = ws.discover_programs().await;

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Editor");
    assert_eq!(found[0].path, editor);
}

#[tokio::test]
async fn test_deep_and_placeholder_executables_are_ignored() {
    let temp = TempDir::new().unwrap();
    let drive = temp.path().join("drive_c");
    touch(&drive.join("Program Files/Vendor/Suite/bin/deep.exe"), b"MZ");
    touch(
        &drive.join("Program Files/Windows Media Player/wmplayer.exe"),
        b"MZ builtin stub",
    );
    touch(&drive.join("Program Files/Vendor/Suite/suite.exe"), b"MZ");
    touch(&drive.join("Program Files/Vendor/Suite/Uninstall Suite.exe"), b"MZ");

    let ws = fresh_workspace(&temp, Arc::new(FakeResolver::default()));
    let names: Vec<String> = ws
        .discover_programs()
        .await
        .into_iter()
        .map(|p| p.name)
        .collect();

    assert_eq!(names, vec!["suite".to_string()]);
}

#[tokio::test]
async fn test_empty_prefix_discovers_nothing() {
    let temp = TempDir::new().unwrap();
    let ws = fresh_workspace(&temp, Arc::new(FakeResolver::default()));
    assert!(ws.discover_programs().await.is_empty());
}

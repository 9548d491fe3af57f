//! Integration tests for desktop watching with real filesystem events.

mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::{touch, workspace, FakeHost, FakeLauncher, FakeResolver, Outcome};
use tempfile::TempDir;
use tokio::sync::mpsc;
use winedock::core::{ChangeCallback, DesktopWatcher, WatchTarget};

fn channel_callback() -> (ChangeCallback, mpsc::UnboundedReceiver<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback: ChangeCallback = Arc::new(move || {
        let _ = tx.send(());
    });
    (callback, rx)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_new_shortcuts_produce_one_notification() {
    let temp = TempDir::new().unwrap();
    let desktop = temp.path().join("Desktop");
    std::fs::create_dir_all(&desktop).unwrap();

    let (callback, mut rx) = channel_callback();
    let _watcher = DesktopWatcher::start(
        &[WatchTarget::new(&desktop, false)],
        Duration::from_millis(300),
        callback,
    )
    .unwrap();

    for name in ["Game.lnk", "Editor.lnk", "Manual.lnk"] {
        touch(&desktop.join(name), b"L");
    }

    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("no notification after creating shortcuts")
        .expect("callback dropped");

    // The burst is over, nothing else is pending
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_recursive_target_sees_nested_changes() {
    let temp = TempDir::new().unwrap();
    let start_menu = temp.path().join("Start Menu");
    std::fs::create_dir_all(start_menu.join("Programs/Game")).unwrap();

    let (callback, mut rx) = channel_callback();
    let _watcher = DesktopWatcher::start(
        &[WatchTarget::new(&start_menu, true)],
        Duration::from_millis(200),
        callback,
    )
    .unwrap();

    touch(&start_menu.join("Programs/Game/Game.lnk"), b"L");

    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("no notification for nested shortcut")
        .expect("callback dropped");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_notification_after_stop() {
    let temp = TempDir::new().unwrap();
    let desktop = temp.path().join("drive_c/users/Public/Desktop");
    std::fs::create_dir_all(&desktop).unwrap();

    let ws = workspace(
        temp.path(),
        FakeLauncher::new(Outcome::Exit(0)),
        Arc::new(FakeResolver::default()),
        FakeHost::with_alive(&[]),
    );
    let (callback, mut rx) = channel_callback();
    ws.start_watching(callback).unwrap();
    ws.stop_watching();

    touch(&desktop.join("Late.lnk"), b"L");
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_watching_a_prefix_without_desktops() {
    let temp = TempDir::new().unwrap();
    let ws = workspace(
        Path::new(temp.path()),
        FakeLauncher::new(Outcome::Exit(0)),
        Arc::new(FakeResolver::default()),
        FakeHost::with_alive(&[]),
    );

    let (callback, _rx) = channel_callback();
    ws.start_watching(callback).unwrap();
    assert!(ws.is_watching());
    ws.stop_watching();
}

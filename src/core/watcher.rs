//! Desktop watcher - Debounced notifications when shortcuts appear in a workspace
//!
//! Raw filesystem events from `notify` are forwarded into a [`Debouncer`],
//! which calls back once per burst after the burst has been quiet for a while.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::event::{EventKind, ModifyKind};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};

/// Called with no payload, meaning "recheck the desktop now"
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Coalesces bursts of triggers into a single callback.
///
/// The callback fires once the quiet period has passed since the most recent
/// trigger. Dropping or stopping the debouncer discards a pending callback.
pub struct Debouncer {
    tx: mpsc::UnboundedSender<()>,
    task: JoinHandle<()>,
}

impl Debouncer {
    /// Start a debouncer on the current tokio runtime
    pub fn new(quiet_period: Duration, callback: ChangeCallback) -> Result<Self> {
        let handle = Handle::try_current().map_err(|e| Error::Config {
            message: format!("watching requires a tokio runtime: {}", e),
        })?;
        Ok(Self::spawn_on(&handle, quiet_period, callback))
    }

    pub fn spawn_on(handle: &Handle, quiet_period: Duration, callback: ChangeCallback) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = handle.spawn(debounce(rx, quiet_period, callback));
        Self { tx, task }
    }

    /// Record one raw event
    pub fn trigger(&self) {
        // A closed channel means the debouncer was stopped
        let _ = self.tx.send(());
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<()> {
        self.tx.clone()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn debounce(mut rx: mpsc::UnboundedReceiver<()>, quiet_period: Duration, callback: ChangeCallback) {
    loop {
        if rx.recv().await.is_none() {
            return;
        }

        // Restart the quiet period on every event in the burst
        loop {
            match tokio::time::timeout(quiet_period, rx.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        debug!("Change burst settled, notifying");
        callback();
    }
}

/// A directory to watch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub path: PathBuf,
    /// Also watch subdirectories
    pub recursive: bool,
}

impl WatchTarget {
    pub fn new(path: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            path: path.into(),
            recursive,
        }
    }
}

/// Whether an event can mean a shortcut was written, extended or renamed
fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Any
            | EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_) | ModifyKind::Any)
    )
}

/// Watches a fixed set of directories and reports debounced changes.
///
/// Owns one OS watch per directory. Nothing is shared between watches.
pub struct DesktopWatcher {
    watchers: Vec<(PathBuf, RecommendedWatcher)>,
    debouncer: Option<Debouncer>,
}

impl DesktopWatcher {
    /// Start watching every target that exists.
    ///
    /// Missing directories are skipped silently. A directory that cannot be
    /// watched is logged and skipped. Fails only without a tokio runtime.
    pub fn start(targets: &[WatchTarget], quiet_period: Duration, callback: ChangeCallback) -> Result<Self> {
        let debouncer = Debouncer::new(quiet_period, callback)?;
        let mut watchers = Vec::new();

        for target in targets {
            if !target.path.is_dir() {
                debug!("Not watching missing directory {:?}", target.path);
                continue;
            }

            match watch_directory(target, debouncer.sender()) {
                Ok(watcher) => {
                    debug!("Watching {:?} (recursive: {})", target.path, target.recursive);
                    watchers.push((target.path.clone(), watcher));
                }
                Err(e) => warn!("{}", e),
            }
        }

        info!(
            "Watching {} of {} shortcut directories (quiet period {:?})",
            watchers.len(),
            targets.len(),
            quiet_period
        );

        Ok(Self {
            watchers,
            debouncer: Some(debouncer),
        })
    }

    /// Directories with an open watch
    pub fn watched(&self) -> Vec<&Path> {
        self.watchers.iter().map(|(path, _)| path.as_path()).collect()
    }

    pub fn is_active(&self) -> bool {
        self.debouncer.is_some()
    }

    /// Close every watch and drop any pending notification. Safe to call twice.
    pub fn stop(&mut self) {
        if self.debouncer.is_none() {
            return;
        }
        let count = self.watchers.len();
        self.watchers.clear();
        if let Some(debouncer) = self.debouncer.take() {
            debouncer.stop();
        }
        info!("Stopped watching {} directories", count);
    }
}

impl Drop for DesktopWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn watch_directory(target: &WatchTarget, tx: mpsc::UnboundedSender<()>) -> Result<RecommendedWatcher> {
    let setup_error = |source| Error::WatchSetup {
        path: target.path.clone(),
        source,
    };

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if is_relevant(&event) => {
            trace!("Change event {:?} on {:?}", event.kind, event.paths);
            let _ = tx.send(());
        }
        Ok(_) => {}
        Err(e) => warn!("Watch error: {}", e),
    })
    .map_err(setup_error)?;

    let mode = if target.recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    watcher.watch(&target.path, mode).map_err(setup_error)?;
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::{sleep, Instant};

    fn counting() -> (Arc<AtomicUsize>, Arc<Mutex<Vec<Instant>>>, ChangeCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let fired = Arc::new(Mutex::new(Vec::new()));
        let callback: ChangeCallback = {
            let count = Arc::clone(&count);
            let fired = Arc::clone(&fired);
            Arc::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
                fired.lock().unwrap().push(Instant::now());
            })
        };
        (count, fired, callback)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_fires_once_after_quiet_period() {
        let quiet = Duration::from_millis(500);
        let (count, fired, callback) = counting();
        let debouncer = Debouncer::new(quiet, callback).unwrap();

        for _ in 0..10 {
            debouncer.trigger();
            sleep(Duration::from_millis(100)).await;
        }
        debouncer.trigger();
        let last_event = Instant::now();

        sleep(Duration::from_millis(450)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(fired.lock().unwrap()[0] >= last_event + quiet);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_fire_separately() {
        let (count, _, callback) = counting();
        let debouncer = Debouncer::new(Duration::from_millis(500), callback).unwrap();

        debouncer.trigger();
        sleep(Duration::from_secs(1)).await;
        debouncer.trigger();
        debouncer.trigger();
        sleep(Duration::from_secs(1)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_pending_notification() {
        let (count, _, callback) = counting();
        let debouncer = Debouncer::new(Duration::from_millis(500), callback).unwrap();

        debouncer.trigger();
        sleep(Duration::from_millis(100)).await;
        debouncer.stop();
        sleep(Duration::from_secs(2)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_debouncer_needs_runtime() {
        let (_, _, callback) = counting();
        assert!(matches!(
            Debouncer::new(Duration::from_millis(500), callback),
            Err(Error::Config { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_directories_are_skipped() {
        let temp = tempfile::TempDir::new().unwrap();
        let present = temp.path().join("Desktop");
        std::fs::create_dir(&present).unwrap();

        let (_, _, callback) = counting();
        let mut watcher = DesktopWatcher::start(
            &[
                WatchTarget::new(&present, false),
                WatchTarget::new(temp.path().join("Start Menu"), true),
            ],
            Duration::from_millis(500),
            callback,
        )
        .unwrap();

        assert_eq!(watcher.watched(), vec![present.as_path()]);
        watcher.stop();
        watcher.stop();
        assert!(!watcher.is_active());
        assert!(watcher.watched().is_empty());
    }
}

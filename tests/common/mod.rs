//! In-memory stand-ins for the runtime services a workspace drives.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;

use async_trait::async_trait;
use tokio::sync::watch;
use winedock::runtime::{
    FileTypeIdentifier, HostProcesses, LaunchRequest, LaunchedProcess, ProcessLauncher,
    ShortcutResolver,
};
use winedock::{Error, Result, Workspace, WorkspaceServices, WorkspaceSettings};

/// How a fake process ends
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Exit(i32),
    SpawnFails,
    WaitFails,
}

pub struct FakeLauncher {
    pub outcome: Mutex<Outcome>,
    pub pid: Option<u32>,
    pub requests: Mutex<Vec<LaunchRequest>>,
    pub spawns: AtomicUsize,
    release: watch::Sender<bool>,
}

impl FakeLauncher {
    /// Processes exit as soon as they are waited on
    pub fn new(outcome: Outcome) -> Arc<Self> {
        let launcher = Self::held(outcome);
        launcher.release();
        launcher
    }

    /// Processes keep running until [`FakeLauncher::release`] is called
    pub fn held(outcome: Outcome) -> Arc<Self> {
        let (release, _) = watch::channel(false);
        Arc::new(Self {
            outcome: Mutex::new(outcome),
            pid: Some(4242),
            requests: Mutex::new(Vec::new()),
            spawns: AtomicUsize::new(0),
            release,
        })
    }

    pub fn release(&self) {
        self.release.send_replace(true);
    }

    pub fn spawn_count(&self) -> usize {
        self.spawns.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> LaunchRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no launch request recorded")
    }
}

#[async_trait]
impl ProcessLauncher for FakeLauncher {
    async fn spawn(&self, request: LaunchRequest) -> Result<Box<dyn LaunchedProcess>> {
        self.spawns.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let outcome = *self.outcome.lock().unwrap();
        if let Outcome::SpawnFails = outcome {
            return Err(Error::launch_failed("fake", "runtime binary not found"));
        }

        Ok(Box::new(FakeProcess {
            pid: self.pid,
            outcome,
            release: self.release.subscribe(),
        }))
    }
}

struct FakeProcess {
    pid: Option<u32>,
    outcome: Outcome,
    release: watch::Receiver<bool>,
}

#[async_trait]
impl LaunchedProcess for FakeProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    async fn wait(&mut self) -> Result<i32> {
        let _ = self.release.wait_for(|released| *released).await;
        match self.outcome {
            Outcome::Exit(code) => Ok(code),
            Outcome::WaitFails | Outcome::SpawnFails => Err(Error::from(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "lost track of process",
            ))),
        }
    }
}

/// Resolves shortcuts from a fixed table
#[derive(Default)]
pub struct FakeResolver {
    pub links: Mutex<HashMap<PathBuf, PathBuf>>,
}

impl FakeResolver {
    pub fn with_link(shortcut: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Arc<Self> {
        let resolver = Self::default();
        resolver
            .links
            .lock()
            .unwrap()
            .insert(shortcut.into(), target.into());
        Arc::new(resolver)
    }
}

#[async_trait]
impl ShortcutResolver for FakeResolver {
    async fn resolve(&self, shortcut: &Path, _context_root: &Path) -> Result<PathBuf> {
        self.links
            .lock()
            .unwrap()
            .get(shortcut)
            .cloned()
            .ok_or_else(|| Error::ShortcutResolution {
                path: shortcut.to_path_buf(),
                message: "not a shortcut".into(),
            })
    }
}

/// Describes every file the same way, or fails when there is no description
pub struct FakeIdentifier(pub Option<String>);

#[async_trait]
impl FileTypeIdentifier for FakeIdentifier {
    async fn identify(&self, path: &Path) -> Result<String> {
        self.0.clone().ok_or_else(|| Error::Classification {
            path: path.to_path_buf(),
            message: "file(1) unavailable".into(),
        })
    }
}

#[derive(Default)]
pub struct FakeHost {
    pub alive: Mutex<HashSet<u32>>,
    pub windows: Mutex<HashSet<u32>>,
    pub runtime: AtomicBool,
    /// Threads that asked for window focus
    pub focus_threads: Mutex<Vec<ThreadId>>,
}

impl FakeHost {
    pub fn with_alive(pids: &[u32]) -> Arc<Self> {
        let host = Self::default();
        host.alive.lock().unwrap().extend(pids);
        Arc::new(host)
    }

    pub fn add_window(&self, pid: u32) {
        self.windows.lock().unwrap().insert(pid);
    }
}

impl HostProcesses for FakeHost {
    fn is_alive(&self, pid: u32) -> bool {
        self.alive.lock().unwrap().contains(&pid)
    }

    fn focus_any_window_of(&self, pid: u32) -> bool {
        self.focus_threads
            .lock()
            .unwrap()
            .push(std::thread::current().id());
        self.windows.lock().unwrap().contains(&pid)
    }

    fn runtime_active(&self) -> bool {
        self.runtime.load(Ordering::SeqCst)
    }
}

pub fn workspace(
    root: &Path,
    launcher: Arc<FakeLauncher>,
    resolver: Arc<FakeResolver>,
    host: Arc<FakeHost>,
) -> Workspace {
    let services = WorkspaceServices {
        process_launcher: launcher,
        resolver,
        identifier: Arc::new(FakeIdentifier(None)),
        host,
    };
    Workspace::with_services(root, WorkspaceSettings::default(), services)
}

pub fn touch(path: &Path, contents: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

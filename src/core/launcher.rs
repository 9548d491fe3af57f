//! Program launcher - Drives one program's run lifecycle

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::program::{LauncherId, Program};
use super::registry::Registration;
use super::workspace::Workspace;
use crate::discovery::classifier::{has_extension, SHORTCUT_EXTENSION};
use crate::error::{Error, Result};
use crate::runtime::LaunchRequest;

/// Run state of a launcher
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    /// Never run
    #[default]
    Idle,
    /// Registered and preparing the invocation
    Launching,
    /// Process started, waiting for it to exit
    Running {
        pid: Option<u32>,
        started_at: DateTime<Utc>,
    },
    /// Last run finished
    Terminated {
        code: i32,
        /// Human readable failure, if the run failed
        error: Option<String>,
        finished_at: DateTime<Utc>,
    },
}

impl RunState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Launching | Self::Running { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Launching => "Launching",
            Self::Running { .. } => "Running",
            Self::Terminated { .. } => "Terminated",
        }
    }

    fn terminated(code: i32, error: Option<String>) -> Self {
        Self::Terminated {
            code,
            error,
            finished_at: Utc::now(),
        }
    }
}

/// How a successful call to [`Launcher::run`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// An instance was already running and its window was raised
    Focused,
    /// An instance is running or being launched elsewhere; nothing was started
    AlreadyRunning,
    /// This launcher is already launching or running its program
    Busy,
    /// The program ran and exited cleanly
    Exited,
}

/// Runs one program of a workspace
pub struct Launcher {
    id: LauncherId,
    program: Program,
    state: Mutex<RunState>,
}

impl Launcher {
    pub fn new(program: Program) -> Self {
        Self {
            id: LauncherId::new(),
            program,
            state: Mutex::new(RunState::Idle),
        }
    }

    pub fn id(&self) -> LauncherId {
        self.id
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Snapshot of the current state
    pub fn state(&self) -> RunState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: RunState) {
        debug!("{} -> {}", self.program.display_name(), state.label());
        *self.lock_state() = state;
    }

    /// Move to `Launching` unless a run is already active. Returns the state
    /// that was replaced.
    fn begin(&self) -> Option<RunState> {
        let mut state = self.lock_state();
        if state.is_active() {
            return None;
        }
        Some(std::mem::replace(&mut *state, RunState::Launching))
    }

    /// Run the program and wait for it to exit.
    ///
    /// Focuses an already running instance instead of starting a second one.
    /// Only launch failures are returned as errors; the registry entry taken
    /// for the run is released on every path out of this call.
    pub async fn run(&self, workspace: &Workspace) -> Result<RunOutcome> {
        let span = info_span!(
            "run",
            launcher = %self.id,
            program = %self.program.display_name()
        );
        self.run_inner(workspace).instrument(span).await
    }

    async fn run_inner(&self, workspace: &Workspace) -> Result<RunOutcome> {
        let registry = workspace.registry();
        let path = &self.program.path;

        if registry.is_running(path) {
            if registry.focus_existing_off_thread(path).await {
                info!("Focused running instance of {:?}", path);
                return Ok(RunOutcome::Focused);
            }
            debug!("No window to focus for {:?}", path);
        }

        let Some(previous) = self.begin() else {
            warn!("Launch of {:?} already in progress", path);
            return Ok(RunOutcome::Busy);
        };

        let Some(registration) = registry.acquire(path) else {
            *self.lock_state() = previous;
            info!("{:?} is already running, not starting another instance", path);
            return Ok(RunOutcome::AlreadyRunning);
        };

        let guard = ActiveRun {
            launcher: self,
            finished: false,
        };
        let result = self.execute(workspace, &registration).await;
        drop(registration);

        match result {
            Ok(0) => {
                guard.finish(RunState::terminated(0, None));
                info!("{} exited cleanly", self.program.display_name());
                Ok(RunOutcome::Exited)
            }
            Ok(code) => {
                let err = Error::LaunchFailed {
                    program: self.program.display_name().to_string(),
                    message: format!("exited with code {}", code),
                    exit_code: Some(code),
                };
                error!("{}", err);
                guard.finish(RunState::terminated(code, Some(err.to_string())));
                Err(err)
            }
            Err(e) => {
                let err = match e {
                    Error::LaunchFailed { .. } => e,
                    other => Error::launch_failed(self.program.display_name(), other.to_string()),
                };
                error!("{}", err);
                guard.finish(RunState::terminated(err.exit_code(), Some(err.to_string())));
                Err(err)
            }
        }
    }

    /// Start the process and wait for it. Returns the exit code.
    async fn execute(&self, workspace: &Workspace, registration: &Registration) -> Result<i32> {
        let request = self.prepare(workspace).await;

        self.set_state(RunState::Running {
            pid: None,
            started_at: Utc::now(),
        });
        let mut process = workspace.process_launcher().spawn(request).await?;

        if let Some(pid) = process.pid() {
            registration.set_pid(pid);
            if let RunState::Running { pid: current, .. } = &mut *self.lock_state() {
                *current = Some(pid);
            }
            info!("{} running as PID {}", self.program.display_name(), pid);
        }

        process.wait().await
    }

    /// Work out what to invoke. Shortcuts that cannot be resolved are handed
    /// to the runtime as they are.
    async fn prepare(&self, workspace: &Workspace) -> LaunchRequest {
        let mut target = self.program.path.clone();

        if has_extension(&target, SHORTCUT_EXTENSION) {
            match workspace.resolver().resolve(&target, workspace.root()).await {
                Ok(resolved) => {
                    debug!("Resolved {:?} to {:?}", target, resolved);
                    target = resolved;
                }
                Err(e) => warn!("{}; launching the shortcut directly", e),
            }
        }

        let diagnostics = workspace.classifier().is_installer(&target).await;
        if diagnostics {
            info!("{:?} looks like an installer, enabling runtime diagnostics", target);
        }

        let mut request = LaunchRequest::new(target)
            .with_arguments(self.program.arguments.clone())
            .with_diagnostics(diagnostics);
        for (key, value) in &self.program.environment {
            request = request.with_env(key, value);
        }
        request
    }

    /// Run in the background and hand the result to `on_complete`.
    ///
    /// The caller does not wait, but the registry release and state update
    /// still happen before `on_complete` is called.
    pub fn spawn_run<F>(self: &Arc<Self>, workspace: Arc<Workspace>, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<RunOutcome>) + Send + 'static,
    {
        let launcher = Arc::clone(self);
        tokio::spawn(async move {
            let result = launcher.run(&workspace).await;
            on_complete(result);
        })
    }
}

/// Marks a run as terminated if it is dropped before finishing, e.g. when
/// the task driving it is cancelled.
struct ActiveRun<'a> {
    launcher: &'a Launcher,
    finished: bool,
}

impl ActiveRun<'_> {
    fn finish(mut self, state: RunState) {
        self.finished = true;
        self.launcher.set_state(state);
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.launcher
                .set_state(RunState::terminated(-1, Some("run cancelled".to_string())));
        }
    }
}

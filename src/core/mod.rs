//! Core module - Workspaces, the running-instance registry, launching and watching

pub mod launcher;
pub mod paths;
mod program;
pub mod registry;
pub mod settings;
pub mod watcher;
mod workspace;

pub use launcher::{Launcher, RunOutcome, RunState};
pub use program::{DiscoveredProgram, LauncherId, Program};
pub use registry::{InstanceHandle, Registration, Registry};
pub use settings::WorkspaceSettings;
pub use watcher::{ChangeCallback, Debouncer, DesktopWatcher, WatchTarget};
pub use workspace::{Workspace, WorkspaceServices};

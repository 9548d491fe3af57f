//! Winedock - Run, track and discover Windows programs inside Wine workspaces
//!
//! A workspace is one Wine prefix. It owns a registry of running programs,
//! launches programs through the runtime without starting duplicates, watches
//! its desktops for new shortcuts and finds programs an installer added.

pub mod core;
pub mod discovery;
pub mod error;
pub mod platform;
pub mod runtime;

pub use crate::core::{
    DiscoveredProgram, Launcher, Program, Registry, RunOutcome, RunState, Workspace,
    WorkspaceServices, WorkspaceSettings,
};
pub use discovery::{Classifier, Discovery};
pub use error::{Error, Result};

/// Application name constant
pub const APP_NAME: &str = "winedock";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

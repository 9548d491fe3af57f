//! Error types for workspace program management.
//!
//! Only launch failures reach the caller of a run. Every other kind is
//! absorbed where it happens and either degrades to a fallback or is logged.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for winedock.
#[derive(Debug, Error)]
pub enum Error {
    /// The runtime could not start the program, or the program exited abnormally.
    #[error("Failed to launch {program}: {message}")]
    LaunchFailed {
        program: String,
        message: String,
        /// Exit code when the process ran but did not finish cleanly
        exit_code: Option<i32>,
    },

    /// A shortcut could not be resolved to an executable.
    #[error("Could not resolve shortcut {path:?}: {message}")]
    ShortcutResolution { path: PathBuf, message: String },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// File type identification failed or produced nothing usable.
    #[error("Could not classify {path:?}: {message}")]
    Classification { path: PathBuf, message: String },

    /// A directory could not be opened for watching.
    #[error("Failed to watch {path:?}: {source}")]
    WatchSetup {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

/// Result type alias for winedock operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl Error {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Error::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a launch failure for a program.
    pub fn launch_failed(program: impl Into<String>, message: impl Into<String>) -> Self {
        Error::LaunchFailed {
            program: program.into(),
            message: message.into(),
            exit_code: None,
        }
    }

    /// Whether this kind is handled where it occurs instead of surfacing to the user.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::LaunchFailed { .. } | Error::Config { .. })
    }

    /// Exit code to record when a run ends with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::LaunchFailed {
                exit_code: Some(code),
                ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

//! macOS window focus

use std::process::{Command, Stdio};
use tracing::debug;

/// Activate the application that owns the process through System Events
pub fn focus_process_windows(pid: u32) -> bool {
    let script = format!(
        "tell application \"System Events\" to set frontmost of (first process whose unix id is {}) to true",
        pid
    );

    match Command::new("osascript")
        .args(["-e", &script])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) => status.success(),
        Err(e) => {
            debug!("osascript unavailable for focusing PID {}: {}", pid, e);
            false
        }
    }
}

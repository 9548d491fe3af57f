//! Linux window focus through `xdotool`

use std::process::{Command, Stdio};
use tracing::debug;

/// Activate the first window owned by the process.
///
/// `xdotool search` exits non-zero when the process has no windows.
pub fn focus_process_windows(pid: u32) -> bool {
    match Command::new("xdotool")
        .args(["search", "--onlyvisible", "--pid", &pid.to_string(), "windowactivate"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) => status.success(),
        Err(e) => {
            debug!("xdotool unavailable for focusing PID {}: {}", pid, e);
            false
        }
    }
}

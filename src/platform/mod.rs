//! Platform-specific process liveness and window focus

#[cfg(windows)]
pub mod windows;

#[cfg(unix)]
mod unix;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(all(unix, not(target_os = "macos")))]
pub mod linux;

/// Check if a process is running
pub fn is_process_running(pid: u32) -> bool {
    #[cfg(windows)]
    {
        windows::is_process_running(pid)
    }
    #[cfg(unix)]
    {
        unix::is_process_running(pid)
    }
    #[cfg(not(any(windows, unix)))]
    {
        let _ = pid;
        false
    }
}

/// Bring a window belonging to the process to the foreground.
///
/// Returns false when the process has no window that could be raised.
pub fn focus_process_windows(pid: u32) -> bool {
    #[cfg(windows)]
    {
        windows::focus_process_windows(pid)
    }
    #[cfg(target_os = "macos")]
    {
        macos::focus_process_windows(pid)
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        linux::focus_process_windows(pid)
    }
    #[cfg(not(any(windows, unix)))]
    {
        let _ = pid;
        false
    }
}

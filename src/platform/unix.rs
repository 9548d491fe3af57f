//! Process liveness shared by Unix platforms

/// Check if a process is running
pub fn is_process_running(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }

    // kill with signal 0 checks if process exists without sending a signal
    let result = unsafe { libc::kill(pid, 0) };
    if result == 0 {
        return true;
    }
    // EPERM: the process exists but belongs to someone else
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_pid_is_running() {
        assert!(is_process_running(std::process::id()));
    }

    #[test]
    fn test_invalid_pids_are_not_running() {
        assert!(!is_process_running(0));
        assert!(!is_process_running(u32::MAX));
    }
}

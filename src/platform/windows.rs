//! Windows process liveness and window focus

use tracing::debug;

use windows::Win32::Foundation::{CloseHandle, BOOL, FALSE, HWND, LPARAM};
use windows::Win32::System::Threading::*;
use windows::Win32::UI::WindowsAndMessaging::*;

/// Check if a process is running
pub fn is_process_running(pid: u32) -> bool {
    unsafe {
        let handle = match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, FALSE, pid) {
            Ok(h) => h,
            Err(_) => return false,
        };

        let mut exit_code: u32 = 0;
        let result = GetExitCodeProcess(handle, &mut exit_code);
        CloseHandle(handle).ok();

        // STILL_ACTIVE = 259
        result.is_ok() && exit_code == 259
    }
}

/// Restore and raise the first visible top-level window of a process
pub fn focus_process_windows(pid: u32) -> bool {
    unsafe {
        let mut candidates: Vec<HWND> = Vec::new();
        let callback_data = &mut candidates as *mut Vec<HWND>;

        unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
            let windows = &mut *(lparam.0 as *mut Vec<HWND>);
            windows.push(hwnd);
            BOOL::from(true)
        }

        let _ = EnumWindows(Some(enum_callback), LPARAM(callback_data as isize));

        for hwnd in candidates {
            let mut window_pid: u32 = 0;
            GetWindowThreadProcessId(hwnd, Some(&mut window_pid));
            if window_pid != pid || !IsWindowVisible(hwnd).as_bool() {
                continue;
            }

            if IsIconic(hwnd).as_bool() {
                let _ = ShowWindow(hwnd, SW_RESTORE);
            }
            if SetForegroundWindow(hwnd).as_bool() {
                debug!("Focused window {:?} of PID {}", hwnd, pid);
                return true;
            }
        }

        debug!("No window of PID {} could be focused", pid);
        false
    }
}

//! Administrator privilege check and elevated relaunch.

use anyhow::Result;
use tracing::{info, warn};

/// Outcome of the startup privilege check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationStatus {
    /// Elevation is not required by the configuration.
    NotRequired,
    /// The process already runs with administrative rights.
    Elevated,
    /// An elevated copy was started; this process should exit.
    Relaunched,
}

/// OS privilege operations, abstracted for testing.
pub trait Privileges {
    fn is_elevated(&self) -> bool;

    /// Starts an elevated copy of the current executable.
    ///
    /// Returns `Ok` only when the OS confirmed the new process was launched.
    fn relaunch_elevated(&self) -> Result<()>;
}

/// The real operating system.
pub struct SystemPrivileges;

impl Privileges for SystemPrivileges {
    fn is_elevated(&self) -> bool {
        platform::is_elevated()
    }

    fn relaunch_elevated(&self) -> Result<()> {
        platform::relaunch_elevated()
    }
}

/// Makes sure the shell runs elevated when `required`.
///
/// `before_relaunch` runs once, right before the elevated copy is requested.
///
/// # Errors
///
/// Returns the relaunch failure. The caller decides whether to continue
/// without elevation; this function never exits the process.
pub fn ensure_elevated<P, F>(
    privileges: &P,
    required: bool,
    before_relaunch: F,
) -> Result<ElevationStatus>
where
    P: Privileges,
    F: FnOnce(),
{
    if !required {
        return Ok(ElevationStatus::NotRequired);
    }
    if privileges.is_elevated() {
        info!("Running with administrative privileges");
        return Ok(ElevationStatus::Elevated);
    }

    info!("Not elevated, relaunching as administrator");
    before_relaunch();
    match privileges.relaunch_elevated() {
        Ok(()) => Ok(ElevationStatus::Relaunched),
        Err(e) => {
            warn!("Elevated relaunch failed: {:#}", e);
            Err(e)
        }
    }
}

#[cfg(windows)]
mod platform {
    use anyhow::{anyhow, Result};
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::UI::Shell::{IsUserAnAdmin, ShellExecuteW};
    use windows_sys::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

    fn wide(value: &OsStr) -> Vec<u16> {
        value.encode_wide().chain(std::iter::once(0)).collect()
    }

    pub fn is_elevated() -> bool {
        // SAFETY: IsUserAnAdmin takes no arguments and only reads the process token.
        unsafe { IsUserAnAdmin() != 0 }
    }

    pub fn relaunch_elevated() -> Result<()> {
        let exe = std::env::current_exe()?;
        let verb = wide(OsStr::new("runas"));
        let file = wide(exe.as_os_str());
        let dir = std::env::current_dir().ok().map(|d| wide(d.as_os_str()));

        // SAFETY: every pointer is either null or a NUL-terminated UTF-16 buffer
        // that outlives the call.
        let result = unsafe {
            ShellExecuteW(
                std::ptr::null_mut(),
                verb.as_ptr(),
                file.as_ptr(),
                std::ptr::null(),
                dir.as_ref().map_or(std::ptr::null(), |d| d.as_ptr()),
                SW_SHOWNORMAL,
            )
        };

        // Values above 32 mean the process was started.
        let code = result as isize;
        if code > 32 {
            Ok(())
        } else {
            Err(anyhow!("ShellExecuteW(runas) failed with code {}", code))
        }
    }
}

#[cfg(unix)]
mod platform {
    use anyhow::{anyhow, Result};

    pub fn is_elevated() -> bool {
        nix::unistd::geteuid().is_root()
    }

    pub fn relaunch_elevated() -> Result<()> {
        Err(anyhow!("relaunching as administrator is only supported on Windows; restart with sudo"))
    }
}

#[cfg(not(any(unix, windows)))]
mod platform {
    use anyhow::{anyhow, Result};

    pub fn is_elevated() -> bool {
        false
    }

    pub fn relaunch_elevated() -> Result<()> {
        Err(anyhow!("relaunching as administrator is not supported on this platform"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::Cell;

    struct MockPrivileges {
        elevated: bool,
        relaunch_ok: bool,
        queries: Cell<u32>,
        relaunches: Cell<u32>,
    }

    impl MockPrivileges {
        fn new(elevated: bool, relaunch_ok: bool) -> Self {
            Self {
                elevated,
                relaunch_ok,
                queries: Cell::new(0),
                relaunches: Cell::new(0),
            }
        }
    }

    impl Privileges for MockPrivileges {
        fn is_elevated(&self) -> bool {
            self.queries.set(self.queries.get() + 1);
            self.elevated
        }

        fn relaunch_elevated(&self) -> Result<()> {
            self.relaunches.set(self.relaunches.get() + 1);
            if self.relaunch_ok {
                Ok(())
            } else {
                Err(anyhow!("The operation was canceled by the user."))
            }
        }
    }

    #[test]
    fn test_not_required_skips_check() {
        let privileges = MockPrivileges::new(false, true);
        let notified = Cell::new(false);
        let status = ensure_elevated(&privileges, false, || notified.set(true)).unwrap();
        assert_eq!(status, ElevationStatus::NotRequired);
        assert_eq!(privileges.queries.get(), 0);
        assert_eq!(privileges.relaunches.get(), 0);
        assert!(!notified.get());
    }

    #[test]
    fn test_already_elevated() {
        let privileges = MockPrivileges::new(true, true);
        let notified = Cell::new(false);
        let status = ensure_elevated(&privileges, true, || notified.set(true)).unwrap();
        assert_eq!(status, ElevationStatus::Elevated);
        assert_eq!(privileges.relaunches.get(), 0);
        assert!(!notified.get());
    }

    #[test]
    fn test_confirmed_relaunch_queries_privileges_once() {
        let privileges = MockPrivileges::new(false, true);
        let notices = Cell::new(0);
        let status = ensure_elevated(&privileges, true, || notices.set(notices.get() + 1)).unwrap();
        assert_eq!(status, ElevationStatus::Relaunched);
        assert_eq!(privileges.queries.get(), 1);
        assert_eq!(privileges.relaunches.get(), 1);
        assert_eq!(notices.get(), 1);
    }

    #[test]
    fn test_failed_relaunch_is_reported() {
        let privileges = MockPrivileges::new(false, false);
        let notices = Cell::new(0);
        let err = ensure_elevated(&privileges, true, || notices.set(notices.get() + 1)).unwrap_err();
        assert!(err.to_string().contains("canceled"));
        assert_eq!(privileges.queries.get(), 1);
        assert_eq!(notices.get(), 1);
    }

    #[test]
    fn test_system_privileges_query_does_not_panic() {
        let _ = SystemPrivileges.is_elevated();
    }
}

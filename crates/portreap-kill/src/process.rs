use std::fmt;
use std::io;

/// The two escalation levels the terminator delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Term,
    Kill,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Term => write!(f, "SIGTERM"),
            Signal::Kill => write!(f, "SIGKILL"),
        }
    }
}

/// Result of a zero-effect existence probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    NotFound,
    /// The process exists but we may not signal it.
    NoPermission,
}

/// Signal delivery and existence probing, abstracted so the escalation
/// sequence can be exercised without live processes.
pub trait ProcessController: Send + Sync {
    /// Probe `pid` without affecting it.
    fn check_process(&self, pid: u32) -> io::Result<ProcessStatus>;

    /// Deliver `signal` to `pid`.
    fn send_signal(&self, pid: u32, signal: Signal) -> io::Result<()>;
}

/// Controller backed by `kill(2)`.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixProcessController;

#[cfg(unix)]
impl ProcessController for UnixProcessController {
    fn check_process(&self, pid: u32) -> io::Result<ProcessStatus> {
        let pid_t: libc::pid_t = pid
            .try_into()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

        let result = unsafe { libc::kill(pid_t, 0) };
        if result == 0 {
            return Ok(ProcessStatus::Running);
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ESRCH) => Ok(ProcessStatus::NotFound),
            Some(libc::EPERM) => Ok(ProcessStatus::NoPermission),
            _ => Err(err),
        }
    }

    fn send_signal(&self, pid: u32, signal: Signal) -> io::Result<()> {
        let pid_t: libc::pid_t = pid
            .try_into()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

        let sig = match signal {
            Signal::Term => libc::SIGTERM,
            Signal::Kill => libc::SIGKILL,
        };

        let result = unsafe { libc::kill(pid_t, sig) };
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

use std::io;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::process::ProcessController;
use crate::process::ProcessStatus;
use crate::process::Signal;
#[cfg(unix)]
use crate::sleeper::RealSleeper;
use crate::sleeper::Sleeper;

/// Grace interval after the polite request.
pub const TERM_GRACE: Duration = Duration::from_millis(500);
/// Shorter grace interval after the forceful one.
pub const KILL_GRACE: Duration = Duration::from_millis(200);

/// Failures of one termination attempt.
#[derive(Debug, Error)]
pub enum TerminateError {
    /// An OS call to deliver a signal failed; names the step that failed.
    #[error("failed to send {signal} to pid {pid}: {source}")]
    Deliver {
        pid: u32,
        signal: Signal,
        #[source]
        source: io::Error,
    },

    /// The process survived both escalation levels.
    #[error("process {pid} survived SIGTERM and SIGKILL")]
    Unresponsive { pid: u32 },

    /// Signal delivery is not available on this platform.
    #[error("process termination is not supported on this platform")]
    Unsupported,
}

/// Escalating process killer.
///
/// Deliberately a fixed two-stage sequence rather than a retry loop: the
/// stages use different signals and different grace intervals, and once a
/// SIGTERM is out the operation runs to completion.
pub struct Terminator<C, S> {
    controller: C,
    sleeper: S,
}

#[cfg(unix)]
impl Terminator<crate::process::UnixProcessController, RealSleeper> {
    pub fn new() -> Self {
        Self::with_parts(crate::process::UnixProcessController, RealSleeper)
    }
}

#[cfg(unix)]
impl Default for Terminator<crate::process::UnixProcessController, RealSleeper> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ProcessController, S: Sleeper> Terminator<C, S> {
    pub fn with_parts(controller: C, sleeper: S) -> Self {
        Self {
            controller,
            sleeper,
        }
    }

    /// Terminates `pid`: SIGTERM, wait, probe, then SIGKILL, wait, probe.
    ///
    /// Returns as soon as a probe reports the process gone; the forceful
    /// signal is never sent to a process that exited during the first grace
    /// interval. A probe that errors counts as gone — if the process cannot
    /// even be probed there is nothing further to escalate to, and the
    /// follow-up discovery re-syncs the list.
    pub fn terminate(&self, pid: u32) -> Result<(), TerminateError> {
        self.deliver(pid, Signal::Term)?;
        self.sleeper.sleep(TERM_GRACE);
        if self.gone(pid) {
            debug!(pid, "process exited after SIGTERM");
            return Ok(());
        }

        self.deliver(pid, Signal::Kill)?;
        self.sleeper.sleep(KILL_GRACE);
        if self.gone(pid) {
            debug!(pid, "process exited after SIGKILL");
            return Ok(());
        }

        Err(TerminateError::Unresponsive { pid })
    }

    fn deliver(&self, pid: u32, signal: Signal) -> Result<(), TerminateError> {
        self.controller
            .send_signal(pid, signal)
            .map_err(|source| TerminateError::Deliver {
                pid,
                signal,
                source,
            })
    }

    fn gone(&self, pid: u32) -> bool {
        !matches!(
            self.controller.check_process(pid),
            Ok(ProcessStatus::Running) | Ok(ProcessStatus::NoPermission)
        )
    }
}

/// Terminates `pid` with the platform controller and real waits.
#[cfg(unix)]
pub fn terminate(pid: u32) -> Result<(), TerminateError> {
    Terminator::new().terminate(pid)
}

/// Signal delivery is unavailable here; no OS call is attempted.
#[cfg(not(unix))]
pub fn terminate(_pid: u32) -> Result<(), TerminateError> {
    Err(TerminateError::Unsupported)
}

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Failures while turning raw enumeration output into records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A process record carried a non-numeric identifier. This aborts the
    /// whole discovery cycle; every later line depends on the process
    /// context it would have established.
    #[error("invalid process id {value:?}")]
    InvalidPid { value: String },
}

/// Failures of one discovery cycle.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The enumeration utility could not be started at all (missing binary,
    /// permission denied).
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The utility ran but exited reporting an error.
    #[error("{program} exited with {status}{}", fmt_stderr(.stderr))]
    Utility {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The utility's output could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Enumeration did not complete within the caller's timeout.
    #[error("port discovery timed out after {timeout:?}")]
    TimedOut { timeout: Duration },
}

impl DiscoveryError {
    /// Whether this cycle failed because the timeout fired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DiscoveryError::TimedOut { .. })
    }
}

fn fmt_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

use std::io;

use thiserror::Error;

use portreap_ports::DiscoveryError;

/// Top-level application failures.
///
/// Everything the session can recover from stays inside the session; these
/// are the failures that end the process.
#[derive(Debug, Error)]
pub enum AppError {
    /// The terminal could not be initialized or written to.
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),

    /// The async runtime could not be started.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] io::Error),

    /// A one-shot discovery (the `list` subcommand) failed.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Output could not be encoded.
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),

    /// The input pump died while the session was still running.
    #[error("event channel closed unexpectedly")]
    ChannelClosed,
}

impl AppError {
    /// sysexits.h-style exit code for the process.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Terminal(_) => 74,  // EX_IOERR
            AppError::Runtime(_) => 74,   // EX_IOERR
            AppError::Discovery(DiscoveryError::Launch { .. }) => 69, // EX_UNAVAILABLE
            AppError::Discovery(DiscoveryError::TimedOut { .. }) => 75, // EX_TEMPFAIL
            AppError::Discovery(_) => 74, // EX_IOERR
            AppError::Encode(_) => 74,    // EX_IOERR
            AppError::ChannelClosed => 74, // EX_IOERR
        }
    }
}

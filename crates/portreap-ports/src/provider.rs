use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::DiscoveryError;
use crate::parse::parse_field_output;
use crate::types::PortRecord;

/// Argument set selecting listening TCP sockets plus all UDP sockets, in
/// field-tagged output: pid, command, login, fd, protocol, name, TCP state.
const LSOF_ARGS: &[&str] = &["-nP", "-iTCP", "-sTCP:LISTEN", "-iUDP", "-FpcfLnuPT"];

/// A source of port bindings.
///
/// Implementations must honor `timeout`: once it elapses the call returns
/// [`DiscoveryError::TimedOut`] promptly, leaking neither a subprocess nor a
/// pending delay.
#[async_trait]
pub trait PortProvider: Send + Sync {
    /// Enumerate current port bindings, ordered and deduplicated.
    async fn list(&self, timeout: Duration) -> Result<Vec<PortRecord>, DiscoveryError>;
}

/// Live provider shelling out to `lsof`.
#[derive(Debug, Clone)]
pub struct LsofProvider {
    program: String,
}

impl Default for LsofProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LsofProvider {
    /// Uses `lsof` from the search path.
    pub fn new() -> Self {
        Self::with_program("lsof")
    }

    /// Uses an explicit executable path.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl PortProvider for LsofProvider {
    async fn list(&self, timeout: Duration) -> Result<Vec<PortRecord>, DiscoveryError> {
        let mut command = Command::new(&self.program);
        command
            .args(LSOF_ARGS)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Reap the child if the timeout drops the in-flight future.
            .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(DiscoveryError::Launch {
                    program: self.program.clone(),
                    source,
                });
            }
            Err(_) => {
                debug!(program = %self.program, ?timeout, "discovery timed out");
                return Err(DiscoveryError::TimedOut { timeout });
            }
        };

        if !output.status.success() {
            return Err(DiscoveryError::Utility {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let entries = parse_field_output(&stdout)?;
        debug!(count = entries.len(), "discovery completed");
        Ok(entries)
    }
}

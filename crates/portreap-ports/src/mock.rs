use std::time::Duration;

use async_trait::async_trait;

use crate::error::DiscoveryError;
use crate::provider::PortProvider;
use crate::types::PortRecord;

/// How long the mock pretends to work, so the loading state is exercised.
const DEFAULT_DELAY: Duration = Duration::from_millis(120);

/// Deterministic provider serving a fixed record set.
///
/// Used for offline development and for interface-conformance tests; it
/// implements the same contract as the live provider, including timeout
/// behavior.
#[derive(Debug, Clone)]
pub struct MockProvider {
    records: Vec<PortRecord>,
    delay: Duration,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Serves the built-in sample set after the default delay.
    pub fn new() -> Self {
        Self {
            records: sample_records(),
            delay: DEFAULT_DELAY,
        }
    }

    /// Serves a caller-supplied record set. The set is returned as given;
    /// callers wanting realistic output should pass it pre-sorted.
    pub fn with_records(records: Vec<PortRecord>) -> Self {
        Self {
            records,
            delay: DEFAULT_DELAY,
        }
    }

    /// Overrides the artificial delay (tests use zero).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl PortProvider for MockProvider {
    async fn list(&self, timeout: Duration) -> Result<Vec<PortRecord>, DiscoveryError> {
        if timeout < self.delay {
            tokio::time::sleep(timeout).await;
            return Err(DiscoveryError::TimedOut { timeout });
        }
        tokio::time::sleep(self.delay).await;
        Ok(self.records.clone())
    }
}

/// Hand-authored sample, pre-sorted by (port, protocol, pid, address).
fn sample_records() -> Vec<PortRecord> {
    let entry = |pid: u32, process: &str, user: &str, port: u16, address: &str| PortRecord {
        pid,
        process: process.to_string(),
        user: user.to_string(),
        protocol: "tcp".to_string(),
        port,
        address: address.to_string(),
        state: "LISTEN".to_string(),
    };

    vec![
        entry(8871, "nginx", "root", 443, "0.0.0.0"),
        entry(4521, "node", "dev", 3000, "0.0.0.0"),
        entry(9112, "postgres", "postgres", 5432, "127.0.0.1"),
        entry(2048, "redis-server", "redis", 6379, "127.0.0.1"),
        entry(7320, "python", "dev", 8000, "127.0.0.1"),
    ]
}

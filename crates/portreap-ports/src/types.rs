use serde::Serialize;

/// One observed socket binding owned by a process.
///
/// Records are value objects: every discovery cycle produces a fresh set and
/// the previous set is discarded wholesale. Identity is the composite key
/// `(pid, protocol, port, address)` — see [`PortRecord::same_binding`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortRecord {
    /// Process identifier owning the socket.
    pub pid: u32,
    /// Command name; empty when the source omits it.
    pub process: String,
    /// Account the process runs under; empty when the source omits it.
    pub user: String,
    /// Lowercase protocol name, e.g. "tcp" or "udp".
    pub protocol: String,
    /// Bound port. Zero is invalid and such records never leave the parser.
    pub port: u16,
    /// Bound address; "*" denotes a wildcard binding.
    pub address: String,
    /// Connection state (e.g. "LISTEN"); empty when the source reports none.
    pub state: String,
}

impl PortRecord {
    /// Whether `other` refers to the same socket binding.
    ///
    /// Protocol comparison is case-insensitive; the remaining key components
    /// are exact.
    pub fn same_binding(&self, other: &PortRecord) -> bool {
        self.pid == other.pid
            && self.port == other.port
            && self.address == other.address
            && self.protocol.eq_ignore_ascii_case(&other.protocol)
    }
}

//! Parser for the field-tagged output of the port-enumeration utility.
//!
//! The input is a sequence of lines, each carrying a one-character tag and a
//! value. A process record (`p`, `c`, `L`, `u`) establishes context that
//! applies to every following file-descriptor record (`f`, `P`, `n`, `T`)
//! until the next process record. The context is threaded explicitly through
//! the fold so the parser stays a pure function of its input.

use std::collections::HashSet;

use crate::error::ParseError;
use crate::types::PortRecord;

/// Marker prefixing the connection-state value on `T` lines.
const STATE_PREFIX: &str = "ST=";

/// Process-level fields carried over to descriptor records.
#[derive(Debug, Default, Clone)]
struct ProcessContext {
    pid: u32,
    command: String,
    user: String,
}

impl ProcessContext {
    fn with_pid(pid: u32) -> Self {
        Self {
            pid,
            ..Self::default()
        }
    }

    /// Owner arrives on two redundant tag kinds; the first non-empty value
    /// wins and is never overwritten by a later owner tag.
    fn set_user(&mut self, value: &str) {
        if self.user.is_empty() && !value.is_empty() {
            self.user = value.to_string();
        }
    }
}

/// A record under construction. Process name and owner stay empty until
/// flush so that descriptor-level values, should the format ever carry them,
/// take precedence over the inherited context.
#[derive(Debug)]
struct PendingRecord {
    pid: u32,
    process: String,
    user: String,
    protocol: String,
    port: u16,
    address: String,
    state: String,
}

impl PendingRecord {
    fn new(pid: u32) -> Self {
        Self {
            pid,
            process: String::new(),
            user: String::new(),
            protocol: String::new(),
            port: 0,
            address: String::new(),
            state: String::new(),
        }
    }
}

/// Parses the complete output of one enumeration run into an ordered,
/// deduplicated record list.
///
/// Unknown tags are skipped for forward compatibility. The only fatal input
/// is a non-numeric process id; a descriptor whose port cannot be parsed is
/// dropped silently by the port-zero filter at flush time.
pub fn parse_field_output(out: &str) -> Result<Vec<PortRecord>, ParseError> {
    let mut entries: Vec<PortRecord> = Vec::new();
    let mut seen: HashSet<(u32, String, u16, String)> = HashSet::new();
    let mut context = ProcessContext::default();
    let mut pending: Option<PendingRecord> = None;

    let flush = |pending: &mut Option<PendingRecord>,
                 context: &ProcessContext,
                 entries: &mut Vec<PortRecord>,
                 seen: &mut HashSet<(u32, String, u16, String)>| {
        let Some(record) = pending.take() else {
            return;
        };
        if record.port == 0 {
            return;
        }
        let process = if record.process.is_empty() {
            context.command.clone()
        } else {
            record.process
        };
        let user = if record.user.is_empty() {
            context.user.clone()
        } else {
            record.user
        };
        let key = (
            record.pid,
            record.protocol.clone(),
            record.port,
            record.address.clone(),
        );
        if !seen.insert(key) {
            return;
        }
        entries.push(PortRecord {
            pid: record.pid,
            process,
            user,
            protocol: record.protocol,
            port: record.port,
            address: record.address,
            state: record.state,
        });
    };

    for line in out.lines() {
        let mut chars = line.chars();
        let Some(tag) = chars.next() else {
            continue;
        };
        let value = chars.as_str();

        match tag {
            'p' => {
                flush(&mut pending, &context, &mut entries, &mut seen);
                let pid = value.parse::<u32>().map_err(|_| ParseError::InvalidPid {
                    value: value.to_string(),
                })?;
                context = ProcessContext::with_pid(pid);
            }
            'c' => {
                context.command = value.to_string();
            }
            'L' | 'u' => {
                context.set_user(value);
            }
            'f' => {
                flush(&mut pending, &context, &mut entries, &mut seen);
                pending = Some(PendingRecord::new(context.pid));
            }
            'P' => {
                if let Some(record) = pending.as_mut() {
                    record.protocol = value.to_lowercase();
                }
            }
            'n' => {
                if let Some(record) = pending.as_mut() {
                    let (host, port) = split_host_port(value);
                    record.address = host;
                    if let Ok(port) = port.parse::<u16>() {
                        record.port = port;
                    }
                }
            }
            'T' => {
                if let Some(record) = pending.as_mut() {
                    if let Some(state) = value.strip_prefix(STATE_PREFIX) {
                        record.state = state.to_string();
                    }
                }
            }
            _ => {}
        }
    }

    flush(&mut pending, &context, &mut entries, &mut seen);

    // Explicit total order so output never depends on input order.
    entries.sort_by(|a, b| {
        a.port
            .cmp(&b.port)
            .then_with(|| a.protocol.cmp(&b.protocol))
            .then_with(|| a.pid.cmp(&b.pid))
            .then_with(|| a.address.cmp(&b.address))
    });

    Ok(entries)
}

/// Splits a name field into host and port substrings.
///
/// IPv6 literals arrive bracket-delimited; the port follows the `]:`
/// delimiter and the brackets are stripped from the host. Otherwise the
/// split happens at the last colon, and an empty host before a colon means
/// a wildcard binding.
fn split_host_port(addr: &str) -> (String, &str) {
    if addr.is_empty() {
        return (String::new(), "");
    }

    if let Some(rest) = addr.strip_prefix('[') {
        if let Some(idx) = rest.rfind("]:") {
            return (rest[..idx].to_string(), &rest[idx + 2..]);
        }
        return (rest.trim_end_matches(']').to_string(), "");
    }

    if let Some(idx) = addr.rfind(':') {
        let host = &addr[..idx];
        let port = &addr[idx + 1..];
        if host.is_empty() {
            return ("*".to_string(), port);
        }
        return (host.to_string(), port);
    }

    (addr.to_string(), "")
}

//! Non-interactive command handlers.

use std::sync::Arc;

use portreap_ports::PortProvider;
use portreap_ports::PortRecord;

use crate::app::session::DISCOVERY_TIMEOUT;
use crate::commands::OutputFormat;
use crate::error::AppError;

/// One discovery cycle printed to stdout.
pub async fn handle_list(
    provider: Arc<dyn PortProvider>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let entries = provider.list(DISCOVERY_TIMEOUT).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => print_table(&entries),
    }
    Ok(())
}

fn print_table(entries: &[PortRecord]) {
    if entries.is_empty() {
        println!("No open ports found.");
        return;
    }

    let process_width = column_width(entries.iter().map(|e| e.process.len()), "PROCESS");
    let user_width = column_width(entries.iter().map(|e| e.user.len()), "USER");
    let address_width = column_width(entries.iter().map(|e| e.address.len()), "ADDRESS");

    println!(
        "{:<5} {:<5} {:<process_width$} {:<7} {:<user_width$} {:<address_width$} {}",
        "PROTO", "PORT", "PROCESS", "PID", "USER", "ADDRESS", "STATE"
    );
    for entry in entries {
        println!(
            "{:<5} {:<5} {:<process_width$} {:<7} {:<user_width$} {:<address_width$} {}",
            entry.protocol,
            entry.port,
            entry.process,
            entry.pid,
            entry.user,
            entry.address,
            entry.state
        );
    }
}

fn column_width(lengths: impl Iterator<Item = usize>, title: &str) -> usize {
    lengths.chain(std::iter::once(title.len())).max().unwrap_or(0)
}

#![deny(clippy::all)]

pub mod app;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod telemetry;
pub mod terminal;
pub mod ui;

use std::sync::Arc;

use clap::CommandFactory;
use clap::Parser;
use clap_complete::generate;
use tracing::debug;

use portreap_ports::LsofProvider;
use portreap_ports::MockProvider;
use portreap_ports::PortProvider;

use commands::Cli;
use commands::Commands;
use error::AppError;

/// Parses the command line and runs; returns the process exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();
    let _telemetry = telemetry::init_tracing(if cli.verbose { "debug" } else { "warn" });

    match execute(cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {err}");
            err.exit_code()
        }
    }
}

fn execute(cli: Cli) -> Result<(), AppError> {
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut command = Cli::command();
        generate(*shell, &mut command, "portreap", &mut std::io::stdout());
        return Ok(());
    }

    let provider: Arc<dyn PortProvider> = if cli.mock {
        debug!("using deterministic mock provider");
        Arc::new(MockProvider::new())
    } else {
        debug!(program = %cli.lsof_path, "using live lsof provider");
        Arc::new(LsofProvider::with_program(cli.lsof_path.clone()))
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(AppError::Runtime)?;

    match cli.command {
        Some(Commands::List { format }) => {
            runtime.block_on(handlers::handle_list(provider, format))
        }
        Some(Commands::Completions { .. }) => unreachable!("handled above"),
        None => runtime.block_on(app::run(provider)),
    }
}

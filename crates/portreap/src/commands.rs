use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
pub use clap_complete::Shell;

const LONG_ABOUT: &str = r#"portreap finds the processes bound to network ports on this host and
terminates them interactively, escalating from SIGTERM to SIGKILL when a
process ignores the polite request.

KEYS:
    j/k, up/down   move the selection
    enter, d       select the highlighted process for termination
    y / n          confirm / cancel a pending termination
    r              refresh the port list
    /              filter by process, port, protocol, user, or state
    ?              toggle the key reference
    q, ctrl-c      quit

EXAMPLES:
    # Interactive session against the live system
    portreap

    # Deterministic sample data, no lsof or privileges required
    portreap --mock

    # One-shot listing for scripts
    portreap list --format json"#;

#[derive(Parser)]
#[command(name = "portreap")]
#[command(author, version)]
#[command(about = "Find and terminate processes bound to network ports")]
#[command(long_about = LONG_ABOUT)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Serve deterministic sample data instead of running lsof
    #[arg(
        long,
        global = true,
        env = "PORTREAP_USE_MOCK",
        value_parser = clap::builder::BoolishValueParser::new(),
    )]
    pub mock: bool,

    /// Path to the lsof executable
    #[arg(long, global = true, default_value = "lsof")]
    pub lsof_path: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the current port table once and exit
    List {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

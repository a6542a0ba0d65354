//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// altgraph CLI - Resolve and inspect alt groups of usernames and IPs.
#[derive(Debug, Parser)]
#[command(name = "altgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory (snapshot, geo cache, overrides)
    #[arg(short, long, global = true, env = "ALTGRAPH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (names only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the remote feed and run one refresh cycle
    Refresh,

    /// Refresh on an interval until Ctrl+C
    Watch(WatchArgs),

    /// Show the alt group of one or more identities
    Lookup(LookupArgs),

    /// Merge an alt-lookup transcript
    Ingest(IngestArgs),

    /// Merge a local batch file in the feed format
    Import(ImportArgs),

    /// Show store statistics
    Stats,

    /// List tracked identities
    List(ListArgs),

    /// Remove lone entries, or relocate IP-shaped identities
    Clean(CleanArgs),

    /// Show the loaded override rules
    Overrides,
}

/// Arguments for the watch command.
#[derive(Debug, Parser)]
pub struct WatchArgs {
    /// Minutes between cycles (defaults to the configured interval)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Stop after this many cycles
    #[arg(short = 'n', long)]
    pub cycles: Option<usize>,
}

/// Arguments for the lookup command.
#[derive(Debug, Parser)]
pub struct LookupArgs {
    /// Identities to look up (case-insensitive fallback)
    #[arg(required = true)]
    pub names: Vec<String>,
}

/// Arguments for the ingest command.
#[derive(Debug, Parser)]
pub struct IngestArgs {
    /// Transcript file, or `-` for stdin
    pub source: String,
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// JSON file mapping identifiers to member lists
    pub file: PathBuf,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Page number (20 identities per page)
    #[arg(default_value = "1")]
    pub page: usize,
}

/// Arguments for the clean command.
#[derive(Debug, Parser)]
pub struct CleanArgs {
    /// Move IP-shaped identities into their groups' IP sets instead
    #[arg(long)]
    pub ips: bool,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

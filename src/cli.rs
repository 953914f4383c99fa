use crate::engine::RunSummary;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const EXIT_FAILURES: u8 = 2;
pub const EXIT_CANCELLED: u8 = 130;

#[derive(Parser)]
#[command(name = "dirprune")]
#[command(
    about = "Remove regeneratable folders (Library, Temp, obj, ...) from project directories",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Use this config file instead of the default")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, action = ArgAction::Count, help = "Increase log verbosity (repeatable)")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List which target folders exist under the given roots")]
    Scan {
        #[arg(required = true)]
        roots: Vec<PathBuf>,
        #[arg(short, long = "target", help = "Target folder name (repeatable)")]
        targets: Vec<String>,
        #[arg(short = 'F', long, default_value = "human")]
        format: OutputFormat,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    #[command(about = "Delete target folders found directly under the given roots")]
    Prune {
        #[arg(required = true)]
        roots: Vec<PathBuf>,
        #[arg(short, long = "target", help = "Target folder name (repeatable)")]
        targets: Vec<String>,
        #[arg(long, help = "Actually delete; otherwise only list what would go")]
        yes: bool,
        #[arg(short = 'j', long, help = "Roots pruned concurrently")]
        parallel_roots: Option<usize>,
        #[arg(long, help = "Upper bound on worker threads")]
        workers: Option<usize>,
        #[arg(long, help = "Measure reclaimed space before deleting (slower)")]
        measure: bool,
        #[arg(short, long, help = "Suppress per-folder progress lines")]
        quiet: bool,
        #[arg(short = 'F', long, default_value = "human")]
        format: OutputFormat,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    #[command(about = "Show the configured target folder names")]
    Targets,
    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: ConfigActions,
    },
}

#[derive(Subcommand)]
pub enum ConfigActions {
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Set a configuration value")]
    Set {
        #[arg(short, long)]
        key: String,
        #[arg(short, long)]
        value: String,
    },
    #[command(about = "Add a target folder name")]
    AddTarget {
        #[arg(short, long)]
        name: String,
    },
    #[command(about = "Remove a target folder name")]
    RemoveTarget {
        #[arg(short, long)]
        name: String,
    },
    #[command(about = "Restore the default configuration")]
    Reset,
}

impl Cli {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Process exit status for a finished prune run. Cancellation wins over
/// failures so an interrupted run always reports 130.
pub fn exit_code(summary: &RunSummary) -> u8 {
    if summary.is_cancelled() {
        EXIT_CANCELLED
    } else if summary.failed > 0 {
        EXIT_FAILURES
    } else {
        0
    }
}

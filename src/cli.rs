use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "keysift",
    about = "Keyword search over structured records",
    version
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file to use instead of <data-dir>/keysift.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write the entity type enablement file from the record source
    ScanTypes,
    /// Write the per-collection field enablement files
    ScanFields,
    /// Rebuild the index from every enabled type and field
    Build(BuildArgs),
    /// Search the index
    Search(SearchArgs),
    /// Show the index location and record counts
    Status(StatusArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

#[derive(Debug, Parser)]
pub struct BuildArgs {
    /// Delete the configured collections' index directories first
    #[arg(long)]
    pub purge: bool,
}

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Number of results to return
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,

    /// Return every match
    #[arg(long)]
    pub all: bool,

    /// Skip substring matching
    #[arg(long)]
    pub no_full: bool,

    /// Skip token matching
    #[arg(long)]
    pub no_word: bool,

    /// Also run the short-query regex fallback
    #[arg(long)]
    pub regex: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "keysift",
            &mut std::io::stdout(),
        );
    }
}

//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for list/query commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
    /// Comma-separated values
    Csv,
}

pub mod commands;

/// calsheet - windowed, checkpointed calendar-to-sheet sync
#[derive(Parser, Debug)]
#[command(name = "calsheet", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.calsheet/data/calsheet.db)
    #[arg(long, global = true, env = "CALSHEET_DB")]
    pub db: Option<PathBuf>,

    /// Settings file (default: ~/.calsheet/config.json)
    #[arg(long, global = true, env = "CALSHEET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json, csv)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the settings file, source directory and database
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },

    /// Sync configured sources into their sheets
    Sync(SyncArgs),

    /// Clear a sheet and its checkpoint, then sync it from the epoch
    Resync {
        /// Source identity or config index
        #[arg(required_unless_present = "all")]
        target: Option<String>,

        /// Resync every config
        #[arg(long, conflicts_with = "target")]
        all: bool,
    },

    /// Inspect or adjust sync checkpoints
    Checkpoint {
        #[command(subcommand)]
        command: CheckpointCommands,
    },

    /// Inspect sheets
    Sheet {
        #[command(subcommand)]
        command: SheetCommands,
    },

    /// Show configs, checkpoints and last runs
    Status,

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Sync
// ============================================================================

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Only sync the config with this source identity
    #[arg(long, conflicts_with = "index")]
    pub source: Option<String>,

    /// Only sync the config at this position (0-based)
    #[arg(long)]
    pub index: Option<usize>,

    /// Explicit range start (RFC 3339 or YYYY-MM-DD); defaults to the checkpoint
    #[arg(long)]
    pub start: Option<String>,

    /// Explicit range end (RFC 3339 or YYYY-MM-DD); defaults to now
    #[arg(long)]
    pub end: Option<String>,
}

// ============================================================================
// Checkpoint Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum CheckpointCommands {
    /// Show stored checkpoints
    Show {
        /// Only this source
        source: Option<String>,
    },

    /// Forget a checkpoint; the next sync starts from the epoch
    Clear {
        /// Source identity
        source: String,
    },

    /// Set a checkpoint explicitly
    Set {
        /// Source identity
        source: String,

        /// Instant (RFC 3339 or YYYY-MM-DD)
        at: String,
    },
}

// ============================================================================
// Sheet Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum SheetCommands {
    /// Print a sheet's rows
    Show {
        /// Sheet name
        name: String,

        /// Maximum rows to print (header included)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// List sheets holding rows
    List,
}

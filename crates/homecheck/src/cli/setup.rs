use clap::{Parser, Subcommand, ValueEnum};
use homecheckapp::model::InspectionStatus;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "homecheck",
    bin_name = "homecheck",
    version,
    disable_help_subcommand = true
)]
#[command(about = "Offline-first property inspection checklists", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (default: $HOMECHECK_DATA_DIR or the platform data dir)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the store and seed the starter templates
    #[command(display_order = 1)]
    Init,

    /// Manage checklist templates
    #[command(alias = "t", display_order = 2)]
    Templates {
        #[command(subcommand)]
        action: Option<TemplateCommands>,
    },

    /// Manage inspections
    #[command(alias = "i", display_order = 3)]
    Inspections {
        #[command(subcommand)]
        action: Option<InspectionCommands>,
    },

    /// Write everything to a JSON backup (gzip when the path ends in .gz)
    #[command(display_order = 10)]
    Export {
        /// Output path (default: homecheck-export-<timestamp>.json)
        path: Option<PathBuf>,
    },

    /// Replace templates, inspections and photos from a backup
    #[command(display_order = 11)]
    Import { path: PathBuf },

    /// Inspect and drain the sync queue
    #[command(display_order = 20)]
    Sync {
        #[command(subcommand)]
        action: Option<SyncCommands>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// List templates
    #[command(alias = "ls")]
    List {
        /// Include archived templates
        #[arg(long)]
        all: bool,
    },

    /// Search active templates by name, section or item text
    Search { query: String },

    /// Copy a template under a new name
    Duplicate {
        id: String,

        /// Name of the copy (default: "<name> (Copy)")
        #[arg(long)]
        name: Option<String>,
    },

    /// Archive a template
    #[command(alias = "rm")]
    Delete {
        id: String,

        /// Remove the template instead of archiving it
        #[arg(long)]
        purge: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum InspectionCommands {
    /// List inspections, most recently updated first
    #[command(alias = "ls")]
    List {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Start an inspection from a template
    Start {
        template_id: String,

        #[arg(long)]
        address: String,

        #[arg(long)]
        unit: Option<String>,

        #[arg(long)]
        tenant: Option<String>,

        /// Inspector name (default: the one in the saved settings)
        #[arg(long)]
        inspector: Option<String>,
    },

    /// Mark an inspection completed
    Complete { id: String },

    /// Move a completed inspection back to in progress
    Reopen { id: String },

    /// Delete an inspection and its photos
    #[command(alias = "rm")]
    Delete { id: String },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum SyncCommands {
    /// Push pending changes to the remote
    Run,
    /// Show the queue
    Status,
    /// Put failed changes back in the queue
    Retry,
    /// Drop every queued change
    Clear,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Draft,
    InProgress,
    Completed,
}

impl From<StatusArg> for InspectionStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Draft => InspectionStatus::Draft,
            StatusArg::InProgress => InspectionStatus::InProgress,
            StatusArg::Completed => InspectionStatus::Completed,
        }
    }
}

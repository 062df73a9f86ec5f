//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};

/// Collapsible tree diagrams from flat parent-linked records
#[derive(Parser, Debug)]
#[command(name = "mindmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Project directory (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the hierarchy as tree
    Tree {
        /// Include collapsed subtrees
        #[arg(short, long)]
        all: bool,
        /// Nodes to toggle before rendering
        #[arg(short, long, value_delimiter = ',')]
        toggle: Vec<String>,
    },

    /// Print node positions and edge paths
    Layout {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Nodes to toggle before the layout
        #[arg(short, long, value_delimiter = ',')]
        toggle: Vec<String>,
    },

    /// Click nodes in order and report the outcomes
    Click {
        /// Node ids
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Click nodes and print every animation frame as JSON lines
    Simulate {
        /// Node ids
        #[arg(required = true)]
        ids: Vec<String>,
        /// Frames per second
        #[arg(long, default_value_t = 60)]
        fps: u32,
        /// Use the built-in demo dataset
        #[arg(long)]
        demo: bool,
    },

    /// Show data source, sync time and build diagnostics
    Info,

    /// Convert a CSV sheet into the record document format
    Export {
        /// CSV sheet (default: export.sheet from config)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        sheet: Option<PathBuf>,
        /// Store the converted nodes as data file
        #[arg(short, long)]
        write: bool,
    },

    /// Fetch the remote export and store it as data file
    Sync {
        /// Export endpoint (default: sync.url from config)
        #[arg(short, long, value_hint = ValueHint::Url)]
        url: Option<String>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Print config template
    Template,
}

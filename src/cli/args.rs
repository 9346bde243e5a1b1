//! CLI argument definitions using clap
//!
//! - devbar list [--tool <id>]
//! - devbar set <tool> <key> <value>
//! - devbar clear <tool> <key>
//! - devbar reset [<tool>]
//! - devbar view <tool>
//! - devbar view-set <tool> [--search ..] [--filter ..] [--sort asc|desc]
//! - devbar view-reset <tool>
//! - devbar snapshot

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::view_state::SortOrder;

/// devbar - inspect and edit persisted toolbar overrides
#[derive(Parser, Debug)]
#[command(name = "devbar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Storage directory (overrides the config file)
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage key namespace (overrides the config file)
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Log session lifecycle and every write
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Directory used when neither --dir nor a config file names one
pub const DEFAULT_DIR: &str = "./.devbar";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List active overrides
    List {
        /// Only this tool
        #[arg(long)]
        tool: Option<String>,
    },

    /// Force a value; VALUE is parsed as JSON, else taken as a string
    Set {
        tool: String,
        key: String,
        value: String,
    },

    /// Remove one override
    Clear { tool: String, key: String },

    /// Remove all overrides of one tool, or of every tool
    Reset { tool: Option<String> },

    /// Show a tool's view state
    View { tool: String },

    /// Update a tool's view state; omitted fields are kept
    ViewSet {
        tool: String,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        sort: Option<SortOrder>,
    },

    /// Forget a tool's view state
    ViewReset { tool: String },

    /// Dump every stored key in the namespace
    Snapshot,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

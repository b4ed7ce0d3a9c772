//! Command-line argument structures and enums

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wikisync")]
#[command(version)]
#[command(about = "Synchronize tagged content from a primary wiki tree to a client tree", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/wikisync/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List pages that differ between the primary and the client tree
    Diff {
        /// Only show pages carrying this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Print the listing as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List all known tags with the number of pages carrying each
    Tags,

    /// Transfer all pages carrying a tag to the client tree
    Transfer {
        /// The tag whose pages should be transferred
        #[arg(short, long)]
        tag: String,

        /// Transfer notice recorded in every changelog line
        #[arg(short, long)]
        summary: String,

        /// Also propagate deletions recorded since the last transfer
        #[arg(long)]
        with_deletions: bool,

        /// Show the plan without touching the client tree
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show the sync anchor and recent transfer log pages
    Log,

    /// Write a config file for a primary/client tree pair
    Init {
        /// Root of the primary (authoritative) tree
        primary_root: PathBuf,

        /// Root of the client (receiving) tree
        client_root: PathBuf,
    },
}

//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Identifier-addressed tree store: build trees from JSON literals and edit them by node id
#[derive(Parser, Debug)]
#[command(name = "structree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Local config file (overrides the global one)
    #[arg(short, long, global = true, env = "STRUCTREE_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a tree from a JSON literal and print it
    Build {
        /// JSON file holding the nested literal
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Print an indented outline instead of JSON
        #[arg(long)]
        outline: bool,
    },

    /// Run a JSON-lines operation script, one outcome per line
    Run {
        /// Script file
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
        /// Print the final structure as an outline afterwards
        #[arg(long)]
        outline: bool,
    },

    /// Show effective settings
    Config,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

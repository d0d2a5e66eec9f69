//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Manually-managed binary tree: scripted construction, mutation and dumps
#[derive(Parser, Debug)]
#[command(name = "bintree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory searched for a local .bintree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    /// Disable colored output (NO_COLOR is honoured by the terminal layer)
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a tree script ("-" reads stdin)
    Run {
        /// Script file
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
        /// Dump the tree when a command fails on a tree error
        #[arg(long)]
        dump_on_error: bool,
        /// Limit the number of live nodes
        #[arg(long)]
        max_nodes: Option<usize>,
        /// Write .dot files only, skip the renderer
        #[arg(long)]
        no_render: bool,
    },

    /// Build and print the sample tree
    Demo {
        /// Also write a graph dump
        #[arg(long)]
        dump: bool,
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

    /// Create config template
    Init {
        /// Create global config instead of ./.bintree.toml
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}

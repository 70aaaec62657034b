//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::tree::TreeFormat;

/// zktreeutil - declarative management of coordination service trees.
#[derive(Parser, Debug)]
#[command(name = "zktreeutil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the settings file.
    #[arg(short, long, global = true, env = "ZKTREE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the local store file (overrides settings).
    #[arg(long, global = true, env = "ZKTREE_STORE")]
    pub store: Option<PathBuf>,

    /// Base path every tree path is resolved under (overrides settings).
    #[arg(short, long, global = true, env = "ZKTREE_NAMESPACE")]
    pub namespace: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the actions needed to converge the live tree, one per line.
    Diff {
        /// Desired tree file (YAML, or JSON by extension).
        file: PathBuf,
    },

    /// Show the reconciliation plan as a table.
    Plan {
        /// Desired tree file.
        file: PathBuf,
    },

    /// Apply the desired tree to the live tree.
    Apply {
        /// Desired tree file.
        file: PathBuf,

        /// Skip per-action confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// Check whether the live tree has drifted from the desired tree.
    Drift {
        /// Desired tree file.
        file: PathBuf,
    },

    /// Write the live tree to a file or standard output.
    Export {
        /// Output file (defaults to standard output).
        #[arg(short = 'O', long)]
        out: Option<PathBuf>,

        /// Serialization format.
        #[arg(short, long, default_value = "yaml")]
        format: ExportFormat,
    },

    /// Print a tree as an indented outline.
    Dump {
        /// Maximum depth below the root (-1 for unlimited).
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        depth: i64,

        /// Dump this desired tree file instead of the live tree.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Load and validate a desired tree file.
    Validate {
        /// Desired tree file.
        file: PathBuf,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Tree serialization formats for `export`.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ExportFormat {
    /// YAML document.
    #[default]
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

impl From<ExportFormat> for TreeFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Yaml => Self::Yaml,
            ExportFormat::Json => Self::Json,
        }
    }
}

/// Converts a `--depth` argument into an outline limit; negative means
/// unlimited.
#[must_use]
pub fn depth_limit(depth: i64) -> Option<usize> {
    usize::try_from(depth).ok()
}

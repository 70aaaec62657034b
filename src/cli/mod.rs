//! CLI module for the zktreeutil tool.
//!
//! This module provides the command-line interface for diffing, applying
//! and inspecting coordination service trees.

mod commands;
mod output;

pub use commands::{depth_limit, Cli, Commands, ExportFormat, OutputFormat};
pub use output::OutputFormatter;

//! Command-line interface for quicknotes.
//!
//! This module provides the CLI structure for the `qnotes` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, DeleteCommand, GenerateCommand, ListCommand, StatusCommand,
};

/// qnotes - Flashcard notes that follow you
///
/// Keeps a list of title/body flashcards in sync with a remote collection,
/// with a local cache so the last known notes are always at hand.
#[derive(Debug, Parser)]
#[command(name = "qnotes")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Act as this user instead of the configured one
    #[arg(short, long, global = true, value_name = "ID")]
    pub user: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List notes, newest first
    List(ListCommand),

    /// Add a note
    Add(AddCommand),

    /// Summarize text into a new note
    Generate(GenerateCommand),

    /// Delete a note
    Delete(DeleteCommand),

    /// Show backends and local cache status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

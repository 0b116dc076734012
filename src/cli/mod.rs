//! CLI module - Command-line interface for Intelboard
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Intelboard - Multi-domain intelligence dashboard
/// Cybersecurity incidents, dataset metadata and IT tickets behind one login
#[derive(Parser)]
#[command(name = "intelboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web API server
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create a user account (password is read from stdin)
    Register {
        username: String,
        /// Account role
        #[arg(long, default_value = "user")]
        role: String,
    },

    /// Change a user's password (current and new password read from stdin)
    Passwd { username: String },

    /// Show a user's role
    Role { username: String },

    /// List cybersecurity incidents
    Incidents {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        severity: Option<String>,
    },

    /// List dataset metadata
    Datasets {
        #[arg(long)]
        category: Option<String>,
        /// Only datasets of at least this size
        #[arg(long)]
        min_size_mb: Option<f64>,
    },

    /// List IT tickets
    Tickets {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
    },

    /// Show dashboard statistics
    Stats,

    /// Load incidents, datasets and tickets from CSV exports in a directory
    Import {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Ask the AI assistant a question
    Ask {
        /// cybersecurity, datascience, itops or general
        #[arg(long, default_value = "general")]
        domain: String,
        #[arg(required = true)]
        message: Vec<String>,
    },
}

pub use commands::*;

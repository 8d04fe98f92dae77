//! CLI commands and argument parsing

use crate::types::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Duplicate detection and validation for SensorThings observation imports
#[derive(Parser, Debug)]
#[command(name = "sta-validator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Importer configuration file (YAML)
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Log level
    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: LogLevel,

    /// Verbose output (same as --log-level debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Effective log level
    pub fn level(&self) -> LogLevel {
        if self.verbose {
            LogLevel::Debug
        } else {
            self.log_level
        }
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the configuration and build the validator
    Check {
        /// Also query the server's service root
        #[arg(long)]
        connect: bool,
    },

    /// Validate observations, one JSON object per line
    Validate {
        /// Observations file (JSON lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Stop at the first observation that cannot be validated
        #[arg(long)]
        fail_fast: bool,
    },
}

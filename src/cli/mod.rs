//! CLI module
//!
//! Command-line interface for validating observation files.
//!
//! # Commands
//!
//! - `check` - Load the configuration and build the validator
//! - `validate` - Classify observations from a JSON lines file

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::{build_validator, validate_lines, Runner, ValidationSummary};

#[cfg(test)]
mod tests;

//! CLI module for filevault
//!
//! Provides command-line interface for:
//! - serve: Load configuration and run the HTTP server
//! - hash-password: Produce a stored credential from a password on stdin

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command};
pub use commands::{hash_password, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};

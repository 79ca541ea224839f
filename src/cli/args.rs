//! CLI argument definitions using clap
//!
//! Commands:
//! - filevault serve [--config <path>] [--port <port>]
//! - filevault hash-password [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// filevault - personal file storage over HTTP
#[derive(Parser, Debug)]
#[command(name = "filevault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to a JSON configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on, overriding the configuration file
        #[arg(long)]
        port: Option<u16>,
    },

    /// Read a password from stdin and print its stored credential
    HashPassword {
        /// Path to a JSON configuration file (for scrypt parameters)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

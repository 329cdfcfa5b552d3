//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use a specific config file
//! - `--quiet` / `-q`: Minimal, machine-readable output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gitsuper - AI-assisted commit messages with SSO-grade authentication
#[derive(Parser, Debug)]
#[command(name = "gitsuper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.gitsuper/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Authenticate with a configured provider
    #[command(
        long_about = "Authenticate with a configured provider.\n\n\
            Runs the provider's configured OAuth flow. Device flow prints a \
            code to enter in your browser; PKCE opens the authorization page \
            and asks you to paste the redirect parameters back. Tokens are \
            stored in the OS keychain when available, otherwise in an \
            encrypted file, and are never printed."
    )]
    Login {
        /// Provider to authenticate with (as named in config)
        provider: String,

        /// Do not open a browser automatically
        #[arg(long)]
        no_browser: bool,
    },

    /// Revoke and remove stored credentials for a provider
    Logout {
        /// Provider to log out from
        provider: String,
    },

    /// Show authentication status
    Status {
        /// Limit output to one provider
        provider: Option<String>,
    },
}

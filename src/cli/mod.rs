//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load and validate the configuration
//! - Delegate to command handlers
//!
//! The CLI layer is the only place that loads ambient state (config
//! file, credential store location); everything below it receives those
//! as explicit values.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use anyhow::{Context as _, Result};

use crate::config::Config;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    commands::dispatch(cli, config).await
}

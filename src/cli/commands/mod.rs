//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves the provider configuration it needs
//! 2. Builds the auth components (store, manager, flow) explicitly
//! 3. Formats and displays output
//!
//! Handlers NEVER print token values. They confirm success or failure
//! and tell the user what to run next.

mod login;
mod logout;
mod status;

// Re-export command functions for testing and direct invocation
pub use login::login;
pub use logout::logout;
pub use status::status;

use anyhow::Result;

use crate::cli::{Cli, Command};
use crate::config::Config;

/// Dispatch a parsed command line to its handler.
pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Command::Login {
            ref provider,
            no_browser,
        } => login(&config, provider, no_browser, cli.quiet).await,
        Command::Logout { ref provider } => logout(&config, provider, cli.quiet).await,
        Command::Status { ref provider } => status(&config, provider.as_deref(), cli.quiet),
    }
}

//! cli::commands::status
//!
//! Authentication status report.
//!
//! Shows, per provider, whether a credential exists and whether it is
//! still valid - without printing any token material. Quiet mode emits
//! one machine-readable line per provider.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use reqwest::Client;

use crate::auth::TokenManager;
use crate::config::{Config, ProviderConfig};
use crate::credentials::CredentialStore;

/// Run the status command.
pub fn status(config: &Config, provider: Option<&str>, quiet: bool) -> Result<()> {
    let store = Arc::new(CredentialStore::open().context("Failed to open credential store")?);

    let names: Vec<String> = match provider {
        Some(name) => {
            config.provider(name)?;
            vec![name.to_string()]
        }
        None => config.providers.keys().cloned().collect(),
    };

    if names.is_empty() {
        if !quiet {
            println!("No providers configured.");
            println!("Create ~/.gitsuper/config.toml to add one.");
        }
        return Ok(());
    }

    if !quiet {
        println!("Credential storage: {}", store.storage_method());
        println!();
    }

    for name in names {
        match config.provider(&name)? {
            ProviderConfig::OauthDevice(oauth) | ProviderConfig::OauthPkce(oauth) => {
                let manager =
                    TokenManager::new(&name, oauth.clone(), store.clone(), Client::new());
                report_oauth(&name, &manager, quiet);
            }
            ProviderConfig::ApiKey(api_key) => {
                let configured = config.resolve_key(&api_key.key).is_some();
                if quiet {
                    println!(
                        "{} {}",
                        name,
                        if configured {
                            "authenticated"
                        } else {
                            "not_authenticated"
                        }
                    );
                } else if configured {
                    println!("{}: API key '{}' configured.", name, api_key.key);
                } else {
                    println!(
                        "{}: API key '{}' is not configured. Add it to [keys] or export GITSUPER_{}.",
                        name, api_key.key, api_key.key
                    );
                }
            }
            ProviderConfig::None => {
                if quiet {
                    println!("{} authenticated", name);
                } else {
                    println!("{}: no authentication required.", name);
                }
            }
        }
    }

    Ok(())
}

/// Render one OAuth provider's token status.
fn report_oauth(name: &str, manager: &TokenManager, quiet: bool) {
    match manager.token_info() {
        Some(info) if quiet => {
            println!(
                "{} {}",
                name,
                if info.is_valid {
                    "authenticated"
                } else {
                    "expired"
                }
            );
        }
        None if quiet => println!("{} not_authenticated", name),
        Some(info) => {
            if info.is_valid {
                match info.expires_at {
                    Some(expires_at) => {
                        println!("{}: authenticated (token valid until {})", name, expires_at)
                    }
                    None => println!("{}: authenticated (token does not expire)", name),
                }
            } else {
                println!(
                    "{}: token expired. It will be refreshed on next use, or run 'gitsuper login {}'.",
                    name, name
                );
            }
            if !info.scope.is_empty() {
                println!("    scope: {}", info.scope);
            }
            println!("    issued: {}", info.issued_at);
        }
        None => {
            println!(
                "{}: not authenticated. Run 'gitsuper login {}'.",
                name, name
            );
        }
    }
}

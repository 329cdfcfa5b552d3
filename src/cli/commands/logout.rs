//! cli::commands::logout
//!
//! Logout command: best-effort server-side revocation plus local
//! credential removal. Local removal always happens, even when the
//! revocation endpoint is unreachable.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use reqwest::Client;

use crate::auth::TokenManager;
use crate::config::{Config, ProviderConfig};
use crate::credentials::CredentialStore;

/// Run the logout command for one provider.
pub async fn logout(config: &Config, provider: &str, quiet: bool) -> Result<()> {
    match config.provider(provider)? {
        ProviderConfig::OauthDevice(oauth) | ProviderConfig::OauthPkce(oauth) => {
            let store =
                Arc::new(CredentialStore::open().context("Failed to open credential store")?);
            let manager = TokenManager::new(provider, oauth.clone(), store, Client::new());

            manager
                .revoke_token()
                .await
                .context("Failed to remove stored credentials")?;

            if !quiet {
                println!("Logged out from '{}'.", provider);
            }
            Ok(())
        }
        ProviderConfig::ApiKey(api_key) => {
            if !quiet {
                println!(
                    "Provider '{}' uses API-key authentication; remove '{}' from the [keys] \
                     table in ~/.gitsuper/config.toml to revoke access.",
                    provider, api_key.key
                );
            }
            Ok(())
        }
        ProviderConfig::None => {
            if !quiet {
                println!("Provider '{}' stores no credentials.", provider);
            }
            Ok(())
        }
    }
}

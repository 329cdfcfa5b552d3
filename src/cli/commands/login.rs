//! cli::commands::login
//!
//! Interactive login command.
//!
//! # Design
//!
//! Dispatches on the provider's configured auth method:
//! - device flow: show the user code, open the verification page, poll
//! - PKCE: open the authorization URL, prompt for the pasted redirect
//!   parameters, exchange the code
//! - api-key / none: nothing interactive to do; report what (if
//!   anything) is missing
//!
//! Tokens are stored through the credential store and NEVER printed.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use reqwest::Client;

use crate::auth::{DeviceCodeFlow, PkceFlow, TokenManager};
use crate::config::{Config, OAuthProviderConfig, ProviderConfig};
use crate::credentials::CredentialStore;

/// Run the login command for one provider.
pub async fn login(config: &Config, provider: &str, no_browser: bool, quiet: bool) -> Result<()> {
    match config.provider(provider)? {
        ProviderConfig::OauthDevice(oauth) => {
            login_device(provider, oauth, no_browser, quiet).await
        }
        ProviderConfig::OauthPkce(oauth) => login_pkce(provider, oauth, no_browser, quiet).await,
        ProviderConfig::ApiKey(api_key) => {
            if config.resolve_key(&api_key.key).is_some() {
                if !quiet {
                    println!(
                        "Provider '{}' uses API-key authentication and key '{}' is configured. Nothing to do.",
                        provider, api_key.key
                    );
                }
                Ok(())
            } else {
                bail!(
                    "credential '{key}' is not configured. Add it to the [keys] table in \
                     ~/.gitsuper/config.toml or export GITSUPER_{key}.",
                    key = api_key.key
                );
            }
        }
        ProviderConfig::None => {
            if !quiet {
                println!("Provider '{}' does not require authentication.", provider);
            }
            Ok(())
        }
    }
}

/// Device Authorization Grant login.
async fn login_device(
    provider: &str,
    oauth: &OAuthProviderConfig,
    no_browser: bool,
    quiet: bool,
) -> Result<()> {
    let store = Arc::new(CredentialStore::open().context("Failed to open credential store")?);
    let client = Client::new();
    let manager = TokenManager::new(provider, oauth.clone(), store, client.clone());
    let flow = DeviceCodeFlow::new(client, oauth)?;

    let tokens = flow
        .execute(|authorization| {
            let target = authorization
                .verification_uri_complete
                .as_deref()
                .unwrap_or(&authorization.verification_uri);

            println!();
            println!("  Enter this code:  {}", authorization.user_code);
            println!("  at:               {}", authorization.verification_uri);
            println!();

            if !no_browser && open::that(target).is_err() {
                println!("  (could not open a browser; visit the URL manually)");
            }

            println!("Waiting for authorization...");
        })
        .await?;

    manager.store_tokens(&tokens)?;

    if !quiet {
        println!("Authentication configured for '{}'.", provider);
    }
    Ok(())
}

/// Authorization Code + PKCE login.
///
/// No local callback server is started: the user pastes the `code` and
/// `state` parameters from the redirect URL. The state is verified
/// against the original request before the exchange.
async fn login_pkce(
    provider: &str,
    oauth: &OAuthProviderConfig,
    no_browser: bool,
    quiet: bool,
) -> Result<()> {
    let store = Arc::new(CredentialStore::open().context("Failed to open credential store")?);
    let client = Client::new();
    let manager = TokenManager::new(provider, oauth.clone(), store, client.clone());
    let flow = PkceFlow::new(client, oauth)?;

    let request = flow.build_auth_url();

    println!();
    println!("Open this URL to authorize gitsuper:");
    println!("  {}", request.url);
    println!();

    if !no_browser && open::that(&request.url).is_err() {
        println!("(could not open a browser; visit the URL manually)");
    }

    println!("After authorizing, the browser is redirected to a URL containing");
    println!("'code' and 'state' query parameters.");
    let code = prompt("Paste the 'code' parameter: ")?;
    let state = prompt("Paste the 'state' parameter: ")?;

    let tokens = flow.exchange_code(code.trim(), state.trim(), &request).await?;
    manager.store_tokens(&tokens)?;

    if !quiet {
        println!("Authentication configured for '{}'.", provider);
    }
    Ok(())
}

/// Read one line from stdin with a prompt.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read input")?;

    if line.trim().is_empty() {
        bail!("No value entered.");
    }
    Ok(line)
}

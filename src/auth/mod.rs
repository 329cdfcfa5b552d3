//! auth - OAuth/SSO authentication subsystem
//!
//! # Architecture
//!
//! The auth system:
//! - Runs device-code and PKCE OAuth flows for interactive login
//! - Stores token records through the credential store
//! - Refreshes tokens preemptively before expiry
//! - De-duplicates concurrent refreshes per provider (single-flight)
//! - Never exposes tokens in logs, errors, or outputs
//!
//! # Components
//!
//! - [`TokenRecord`] / [`TokenResponse`] - token schema and wire shape
//! - [`DeviceCodeFlow`] - RFC 8628 Device Authorization Grant executor
//! - [`PkceFlow`] - Authorization Code + PKCE executor
//! - [`TokenManager`] - per-provider token lifecycle authority
//! - [`AuthStrategy`] implementations - uniform header capability for
//!   API-key, OAuth, and credential-less providers
//!
//! # Data Flow
//!
//! A caller needing an authenticated request asks a strategy for
//! headers. [`OAuthAuthStrategy`] asks its [`TokenManager`] for a valid
//! token; the manager checks its in-memory cache, falls back to the
//! credential store, and refreshes through the provider's token endpoint
//! when the token is expired. The flow executors are only involved
//! during interactive login, never on the refresh path.
//!
//! # Security
//!
//! Tokens MUST never appear in:
//! - logs (including debug level)
//! - error messages
//! - debug output
//!
//! Types holding token material implement custom Debug that redacts it.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gitsuper::auth::strategy_for_provider;
//! use gitsuper::credentials::CredentialStore;
//!
//! let store = Arc::new(CredentialStore::open()?);
//! let strategy = strategy_for_provider(&config, "acme", store, http)?;
//! let headers = strategy.auth_headers().await?;
//! ```

mod device_flow;
mod errors;
mod pkce;
mod strategy;
mod token_manager;
mod token_record;

pub use device_flow::{DeviceAuthorization, DeviceCodeFlow, MAX_POLL_ATTEMPTS};
pub use errors::AuthError;
pub use pkce::{AuthorizationRequest, PkceFlow};
pub use strategy::{
    strategy_for_provider, ApiKeyAuthStrategy, AuthStrategy, NoAuthStrategy, OAuthAuthStrategy,
};
pub use token_manager::{TokenInfo, TokenManager};
pub use token_record::{TokenRecord, TokenResponse, SERVICE_PREFIX};

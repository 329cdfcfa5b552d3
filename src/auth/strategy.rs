//! auth::strategy
//!
//! Uniform authentication capability over different credential types.
//!
//! # Design
//!
//! Callers that need an authenticated request ask a strategy for headers
//! and never learn where the credential came from:
//!
//! - [`ApiKeyAuthStrategy`] - static key from config, arbitrary header
//! - [`OAuthAuthStrategy`] - composes a [`TokenManager`], refreshing as
//!   needed before handing out a bearer header
//! - [`NoAuthStrategy`] - empty headers for credential-less local backends
//!
//! Use [`strategy_for_provider`] to build the right strategy from a
//! provider's configuration.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Client;

use crate::config::{ApiKeyProviderConfig, Config, ConfigError, ProviderConfig};
use crate::credentials::CredentialStore;

use super::errors::AuthError;
use super::token_manager::TokenManager;

/// Uniform header-producing capability.
#[async_trait]
pub trait AuthStrategy: Send + Sync + std::fmt::Debug {
    /// Produce the headers for an authenticated request.
    ///
    /// Never returns a silently incomplete header set: a missing or
    /// unrefreshable credential is an error with a user-actionable
    /// message.
    async fn auth_headers(&self) -> Result<HeaderMap, AuthError>;

    /// Check whether a usable credential is currently available.
    ///
    /// Performs no network access.
    async fn is_valid(&self) -> bool;
}

/// Static API-key authentication.
pub struct ApiKeyAuthStrategy {
    /// Key-lookup name, used in error messages ("anthropicKey").
    key_name: String,

    /// Header the key is sent in.
    header: String,

    /// Header-value template; `{key}` is replaced with the key.
    format: String,

    /// The resolved key, if the config had one.
    key: Option<String>,
}

impl ApiKeyAuthStrategy {
    /// Create a strategy with an already-resolved key.
    pub fn new(
        key_name: impl Into<String>,
        header: impl Into<String>,
        format: impl Into<String>,
        key: Option<String>,
    ) -> Self {
        Self {
            key_name: key_name.into(),
            header: header.into(),
            format: format.into(),
            key,
        }
    }

    /// Create a strategy from provider config, resolving the key from
    /// the `[keys]` table or environment.
    pub fn from_config(config: &Config, api_key: &ApiKeyProviderConfig) -> Self {
        Self::new(
            api_key.key.clone(),
            api_key.header.clone(),
            api_key.format.clone(),
            config.resolve_key(&api_key.key),
        )
    }
}

#[async_trait]
impl AuthStrategy for ApiKeyAuthStrategy {
    async fn auth_headers(&self) -> Result<HeaderMap, AuthError> {
        let key = self
            .key
            .as_deref()
            .ok_or_else(|| AuthError::MissingCredential(self.key_name.clone()))?;

        let name = HeaderName::from_bytes(self.header.as_bytes()).map_err(|_| {
            AuthError::InvalidRecord(format!("'{}' is not a valid header name", self.header))
        })?;
        // Never echo the value in the error: it contains the key
        let value = HeaderValue::from_str(&self.format.replace("{key}", key)).map_err(|_| {
            AuthError::InvalidRecord(format!(
                "credential '{}' cannot be sent as a header value",
                self.key_name
            ))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(name, value);
        Ok(headers)
    }

    async fn is_valid(&self) -> bool {
        self.key.is_some()
    }
}

impl std::fmt::Debug for ApiKeyAuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuthStrategy")
            .field("key_name", &self.key_name)
            .field("header", &self.header)
            .field("configured", &self.key.is_some())
            .finish_non_exhaustive()
    }
}

/// OAuth bearer-token authentication over a [`TokenManager`].
#[derive(Debug)]
pub struct OAuthAuthStrategy {
    manager: Arc<TokenManager>,
}

impl OAuthAuthStrategy {
    /// Wrap a token manager.
    pub fn new(manager: Arc<TokenManager>) -> Self {
        Self { manager }
    }

    /// Access the underlying token manager.
    pub fn manager(&self) -> &Arc<TokenManager> {
        &self.manager
    }
}

#[async_trait]
impl AuthStrategy for OAuthAuthStrategy {
    async fn auth_headers(&self) -> Result<HeaderMap, AuthError> {
        // Ensure validity before handing out a header; only a failed
        // refresh makes this terminal.
        if !self.manager.has_valid_token() && !self.manager.refresh_token().await {
            return Err(AuthError::TokenExpired(self.manager.provider().to_string()));
        }

        let token = self.manager.get_access_token().ok_or(AuthError::NoToken)?;

        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AuthError::InvalidRecord("token cannot be sent as a header".into()))?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    async fn is_valid(&self) -> bool {
        self.manager.has_valid_token()
    }
}

/// No authentication: empty headers, always valid.
#[derive(Debug, Default)]
pub struct NoAuthStrategy;

impl NoAuthStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuthStrategy for NoAuthStrategy {
    async fn auth_headers(&self) -> Result<HeaderMap, AuthError> {
        Ok(HeaderMap::new())
    }

    async fn is_valid(&self) -> bool {
        true
    }
}

/// Build the authentication strategy for a configured provider.
///
/// # Errors
///
/// Returns `ConfigError::UnknownProvider` when the provider is not in
/// the config at all.
pub fn strategy_for_provider(
    config: &Config,
    provider: &str,
    store: Arc<CredentialStore>,
    client: Client,
) -> Result<Box<dyn AuthStrategy>, ConfigError> {
    match config.provider(provider)? {
        ProviderConfig::OauthDevice(oauth) | ProviderConfig::OauthPkce(oauth) => {
            let manager = TokenManager::new(provider, oauth.clone(), store, client);
            Ok(Box::new(OAuthAuthStrategy::new(Arc::new(manager))))
        }
        ProviderConfig::ApiKey(api_key) => {
            Ok(Box::new(ApiKeyAuthStrategy::from_config(config, api_key)))
        }
        ProviderConfig::None => Ok(Box::new(NoAuthStrategy::new())),
    }
}

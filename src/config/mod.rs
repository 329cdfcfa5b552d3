//! config
//!
//! Provider configuration schema and loading.
//!
//! # Location
//!
//! The config file is located at (in order of precedence):
//! 1. `--config <path>` on the command line
//! 2. `$GITSUPER_CONFIG` if set
//! 3. `~/.gitsuper/config.toml` (canonical location)
//!
//! # Dependency Injection
//!
//! Nothing in the auth subsystem reads this file (or any other ambient
//! process state) on its own: the loader produces a [`Config`] value and
//! every component receives the slice of it that it needs through its
//! constructor. This keeps components constructible in isolation for
//! tests.
//!
//! # Example
//!
//! ```toml
//! [providers.acme]
//! auth = "oauth-device"
//! client_id = "gitsuper-cli"
//! scopes = ["commit"]
//! token_endpoint = "https://id.acme.example/oauth/token"
//! device_auth_endpoint = "https://id.acme.example/oauth/device"
//!
//! [providers.anthropic]
//! auth = "api-key"
//! key = "anthropicKey"
//! header = "x-api-key"
//! format = "{key}"
//!
//! [keys]
//! anthropicKey = "sk-ant-..."
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default preemptive-refresh threshold (5 minutes).
pub const DEFAULT_REFRESH_THRESHOLD_MS: u64 = 300_000;

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config file {path}: {reason}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// Config file is not valid TOML.
    #[error("cannot parse config file {path}: {reason}")]
    Parse {
        /// Path that failed
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// A config value is present but invalid.
    #[error("invalid config value: {0}")]
    InvalidValue(String),

    /// The requested provider is not configured.
    #[error("provider '{name}' is not configured{hint}")]
    UnknownProvider {
        /// Provider name that was requested
        name: String,
        /// ", configured providers: ..." or empty
        hint: String,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Per-provider authentication configuration.
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Named credential values for api-key providers.
    pub keys: BTreeMap<String, String>,
}

/// Authentication configuration for one provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "auth", rename_all = "kebab-case")]
pub enum ProviderConfig {
    /// Device Authorization Grant (RFC 8628).
    OauthDevice(OAuthProviderConfig),
    /// Authorization Code + PKCE.
    OauthPkce(OAuthProviderConfig),
    /// Static API key from the `[keys]` table or environment.
    ApiKey(ApiKeyProviderConfig),
    /// No authentication (local backends).
    None,
}

/// OAuth endpoints and client identity for one provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OAuthProviderConfig {
    /// OAuth client ID.
    pub client_id: String,

    /// OAuth client secret (confidential clients only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Scopes to request.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Token endpoint URL.
    pub token_endpoint: String,

    /// Device-authorization endpoint URL (device grant).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_auth_endpoint: Option<String>,

    /// Authorization endpoint URL (PKCE).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_endpoint: Option<String>,

    /// Redirect URI registered for the client (PKCE).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// Revocation endpoint URL, used on logout when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoke_endpoint: Option<String>,

    /// Preemptive-refresh threshold in milliseconds (default 300000).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_threshold_ms: Option<u64>,
}

impl OAuthProviderConfig {
    /// Space-joined scope string for OAuth requests.
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }

    /// Preemptive-refresh threshold as a duration.
    pub fn refresh_threshold(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(
            self.refresh_threshold_ms.unwrap_or(DEFAULT_REFRESH_THRESHOLD_MS) as i64,
        )
    }
}

/// API-key header configuration for one provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiKeyProviderConfig {
    /// Name of the key to look up in `[keys]` / environment.
    pub key: String,

    /// Header the key is sent in (e.g. "Authorization", "x-api-key").
    pub header: String,

    /// Header-value template; `{key}` is replaced with the key.
    #[serde(default = "default_key_format")]
    pub format: String,
}

fn default_key_format() -> String {
    "{key}".to_string()
}

impl Config {
    /// Load configuration, resolving the path as documented on the module.
    ///
    /// A missing file yields an empty config (no providers); commands
    /// that need a provider will then report it as not configured.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit_path {
            Some(p) => p.to_path_buf(),
            None => match std::env::var_os("GITSUPER_CONFIG") {
                Some(p) => PathBuf::from(p),
                None => match dirs::home_dir() {
                    Some(home) => home.join(".gitsuper").join("config.toml"),
                    None => return Ok(Self::default()),
                },
            },
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path,
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending provider
    /// and field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, provider) in &self.providers {
            provider.validate(name)?;
        }
        Ok(())
    }

    /// Look up a provider, with a helpful error naming the alternatives.
    pub fn provider(&self, name: &str) -> Result<&ProviderConfig, ConfigError> {
        self.providers
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProvider {
                name: name.to_string(),
                hint: if self.providers.is_empty() {
                    String::new()
                } else {
                    format!(
                        " (configured providers: {})",
                        self.providers
                            .keys()
                            .cloned()
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                },
            })
    }

    /// Resolve a named credential from `[keys]` or the environment.
    ///
    /// The environment variable `GITSUPER_<name>` takes precedence over
    /// the config file so keys can be injected in CI.
    pub fn resolve_key(&self, name: &str) -> Option<String> {
        std::env::var(format!("GITSUPER_{}", name))
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.keys.get(name).cloned())
    }
}

impl ProviderConfig {
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        match self {
            ProviderConfig::OauthDevice(oauth) => {
                oauth.validate_common(name)?;
                if oauth.device_auth_endpoint.is_none() {
                    return Err(ConfigError::InvalidValue(format!(
                        "provider '{}': device flow requires device_auth_endpoint",
                        name
                    )));
                }
                Ok(())
            }
            ProviderConfig::OauthPkce(oauth) => {
                oauth.validate_common(name)?;
                if oauth.auth_endpoint.is_none() {
                    return Err(ConfigError::InvalidValue(format!(
                        "provider '{}': pkce flow requires auth_endpoint",
                        name
                    )));
                }
                if oauth.redirect_uri.is_none() {
                    return Err(ConfigError::InvalidValue(format!(
                        "provider '{}': pkce flow requires redirect_uri",
                        name
                    )));
                }
                Ok(())
            }
            ProviderConfig::ApiKey(api_key) => {
                if api_key.key.is_empty() {
                    return Err(ConfigError::InvalidValue(format!(
                        "provider '{}': key name must not be empty",
                        name
                    )));
                }
                if api_key.header.is_empty() {
                    return Err(ConfigError::InvalidValue(format!(
                        "provider '{}': header must not be empty",
                        name
                    )));
                }
                if !api_key.format.contains("{key}") {
                    return Err(ConfigError::InvalidValue(format!(
                        "provider '{}': format must contain {{key}}",
                        name
                    )));
                }
                Ok(())
            }
            ProviderConfig::None => Ok(()),
        }
    }
}

impl OAuthProviderConfig {
    fn validate_common(&self, name: &str) -> Result<(), ConfigError> {
        if self.client_id.is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "provider '{}': client_id must not be empty",
                name
            )));
        }
        for (field, value) in [
            ("token_endpoint", Some(&self.token_endpoint)),
            ("device_auth_endpoint", self.device_auth_endpoint.as_ref()),
            ("auth_endpoint", self.auth_endpoint.as_ref()),
            ("revoke_endpoint", self.revoke_endpoint.as_ref()),
        ] {
            if let Some(url) = value {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(ConfigError::InvalidValue(format!(
                        "provider '{}': {} must be an http(s) URL",
                        name, field
                    )));
                }
            }
        }
        Ok(())
    }
}

//! auth::errors
//!
//! Authentication error types.
//!
//! # Design
//!
//! Error messages MUST NOT contain token values. Every variant is
//! designed to give the user a next step (re-run login, fix a config
//! key) without exposing sensitive data.
//!
//! # Example
//!
//! ```
//! use gitsuper::auth::AuthError;
//!
//! let err = AuthError::TokenExpired("acme".to_string());
//! assert!(err.to_string().contains("acme"));
//! assert!(err.to_string().contains("gitsuper login"));
//! ```

use thiserror::Error;

/// Errors from authentication operations.
///
/// # Security
///
/// Error messages intentionally do not include token values.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The device-authorization request itself was rejected.
    #[error("device authorization failed: {status} - {message}")]
    DeviceAuthorization {
        /// HTTP status code
        status: u16,
        /// Error message from the provider
        message: String,
    },

    /// The device code expired before the user authorized.
    #[error("device code expired before authorization completed. Run 'gitsuper login' again.")]
    DeviceCodeExpired,

    /// The user denied the authorization request.
    #[error("authorization denied by user")]
    UserDenied,

    /// The provider returned an unrecognized protocol error.
    #[error("authorization error '{code}': {description}")]
    Authorization {
        /// OAuth error code
        code: String,
        /// Human-readable description from the provider
        description: String,
    },

    /// Polling never reached a terminal state within the attempt budget.
    #[error("authorization timed out after {attempts} polling attempts. Run 'gitsuper login' again.")]
    AuthorizationTimeout {
        /// Number of polling attempts made
        attempts: u32,
    },

    /// The authorization-code exchange was rejected.
    #[error("token exchange failed: {status} - {body}")]
    TokenExchange {
        /// HTTP status code
        status: u16,
        /// Response body text from the provider
        body: String,
    },

    /// The state nonce echoed by the provider does not match ours.
    #[error("authorization state mismatch - possible CSRF, aborting login")]
    StateMismatch,

    /// A configured credential key has no value.
    #[error("credential '{0}' is not configured. Set it in ~/.gitsuper/config.toml under [keys] or export GITSUPER_{0}.")]
    MissingCredential(String),

    /// The token is expired and could not be refreshed.
    #[error("authentication for '{0}' has expired. Run 'gitsuper login {0}' to re-authenticate.")]
    TokenExpired(String),

    /// A token was expected to exist but none was found.
    #[error("no access token available. Run 'gitsuper login' to authenticate.")]
    NoToken,

    /// Error from credential storage.
    #[error("credential store error: {0}")]
    Storage(String),

    /// Network error during authentication.
    #[error("network error: {0}")]
    Network(String),

    /// A stored or received token record could not be understood.
    #[error("invalid token record: {0}")]
    InvalidRecord(String),
}

impl AuthError {
    /// Check if this error is resolved by running `gitsuper login`.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            AuthError::DeviceCodeExpired
                | AuthError::UserDenied
                | AuthError::AuthorizationTimeout { .. }
                | AuthError::TokenExpired(_)
                | AuthError::NoToken
        )
    }

    /// Check if this error is transient and might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::Network(_))
    }
}

impl From<crate::credentials::StorageError> for AuthError {
    fn from(err: crate::credentials::StorageError) -> Self {
        AuthError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::InvalidRecord(err.to_string())
    }
}

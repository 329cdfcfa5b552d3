//! auth::device_flow
//!
//! OAuth 2.0 Device Authorization Grant executor (RFC 8628).
//!
//! # Device Flow Overview
//!
//! 1. Client requests a device code from the provider
//! 2. User visits the verification URL and enters the user code
//! 3. Client polls the token endpoint until authorization completes
//! 4. Client receives the token response
//!
//! This flow is ideal for CLI tools because:
//! - No client secret is required (safe for distribution)
//! - No callback server needed
//! - Works in headless environments
//!
//! # Polling States
//!
//! During polling, the provider's `error` field drives the loop:
//! - `authorization_pending` - continue polling
//! - `slow_down` - continue, waiting one extra interval per attempt
//! - `expired_token` - device code expired, restart the flow
//! - `access_denied` - user denied authorization
//! - anything else - terminal protocol error
//!
//! Polling is bounded by an attempt budget so the loop terminates even
//! against a provider that never answers definitively. Transient network
//! failures consume an attempt and are retried; only protocol-terminal
//! errors abort early.
//!
//! # Example
//!
//! ```ignore
//! use gitsuper::auth::DeviceCodeFlow;
//!
//! let flow = DeviceCodeFlow::new(http, &oauth_config)?;
//! let tokens = flow
//!     .execute(|authorization| {
//!         println!("Visit {} and enter code: {}",
//!             authorization.verification_uri, authorization.user_code);
//!     })
//!     .await?;
//! ```

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::OAuthProviderConfig;

use super::errors::AuthError;
use super::token_record::TokenResponse;

/// Maximum polling attempts before the flow fails with a timeout.
pub const MAX_POLL_ATTEMPTS: u32 = 180;

/// Grant type URN for the device grant.
const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Polling interval used when the provider omits one.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// User-Agent header for OAuth requests.
const USER_AGENT: &str = "gitsuper-cli";

/// Response from the device-authorization endpoint.
///
/// Ephemeral and in-memory only; `device_code` is a short-lived bearer
/// secret and is redacted in Debug output.
#[derive(Clone, Deserialize)]
pub struct DeviceAuthorization {
    /// The device verification code (secret, never displayed or logged).
    pub device_code: String,

    /// The user verification code to display.
    pub user_code: String,

    /// The verification URL the user should visit.
    pub verification_uri: String,

    /// Verification URL with the user code pre-filled, when offered.
    #[serde(default)]
    pub verification_uri_complete: Option<String>,

    /// Seconds until the device code expires.
    pub expires_in: u64,

    /// Minimum polling interval in seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,
}

fn default_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl fmt::Debug for DeviceAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceAuthorization")
            .field("device_code", &"[REDACTED]")
            .field("user_code", &self.user_code)
            .field("verification_uri", &self.verification_uri)
            .field(
                "verification_uri_complete",
                &self.verification_uri_complete,
            )
            .field("expires_in", &self.expires_in)
            .field("interval", &self.interval)
            .finish()
    }
}

/// Error response from OAuth endpoints.
#[derive(Debug, Clone, Deserialize)]
struct OAuthErrorBody {
    /// Error code.
    error: String,

    /// Human-readable description.
    #[serde(default)]
    error_description: Option<String>,
}

/// Request body for the device-authorization endpoint.
#[derive(Serialize)]
struct DeviceCodeRequest<'a> {
    client_id: &'a str,
    scope: &'a str,
}

/// Request body for device-grant token polling.
#[derive(Serialize)]
struct DeviceTokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    device_code: &'a str,
}

/// Device Authorization Grant executor for one provider.
///
/// Stateless: each call performs the HTTP exchanges of the grant and
/// returns the provider's response; nothing is persisted here.
#[derive(Debug, Clone)]
pub struct DeviceCodeFlow {
    /// HTTP client.
    client: Client,

    /// OAuth client ID.
    client_id: String,

    /// Space-joined scopes to request.
    scope: String,

    /// Device-authorization endpoint URL.
    device_auth_endpoint: String,

    /// Token endpoint URL.
    token_endpoint: String,
}

impl DeviceCodeFlow {
    /// Create a device flow executor from a provider's OAuth config.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRecord` if the config has no
    /// device-authorization endpoint (the config validator catches this
    /// earlier in normal operation).
    pub fn new(client: Client, oauth: &OAuthProviderConfig) -> Result<Self, AuthError> {
        let device_auth_endpoint = oauth.device_auth_endpoint.clone().ok_or_else(|| {
            AuthError::InvalidRecord("provider has no device_auth_endpoint".into())
        })?;
        Ok(Self {
            client,
            client_id: oauth.client_id.clone(),
            scope: oauth.scope(),
            device_auth_endpoint,
            token_endpoint: oauth.token_endpoint.clone(),
        })
    }

    /// Build headers for OAuth requests.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT),
        );
        headers
    }

    /// Request a device code to begin the authorization flow.
    ///
    /// # Errors
    ///
    /// - [`AuthError::DeviceAuthorization`] if the provider rejects the request
    /// - [`AuthError::Network`] on connection failure
    pub async fn initiate(&self) -> Result<DeviceAuthorization, AuthError> {
        let request = DeviceCodeRequest {
            client_id: &self.client_id,
            scope: &self.scope,
        };

        let response = self
            .client
            .post(&self.device_auth_endpoint)
            .headers(self.headers())
            .form(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| AuthError::DeviceAuthorization {
                status: status.as_u16(),
                message: format!("unparsable device authorization response: {}", e),
            })
        } else {
            let message = match serde_json::from_str::<OAuthErrorBody>(&body) {
                Ok(err) => format!(
                    "{}: {}",
                    err.error,
                    err.error_description.unwrap_or_default()
                ),
                Err(_) => body,
            };
            Err(AuthError::DeviceAuthorization {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Poll the token endpoint until authorization completes.
    ///
    /// Sleeps `interval_secs` (cooperatively) before each attempt. A
    /// `slow_down` response permanently adds one base interval to the
    /// wait. The loop is bounded by [`MAX_POLL_ATTEMPTS`]; network
    /// failures are logged and retried within that budget.
    ///
    /// # Errors
    ///
    /// - [`AuthError::UserDenied`] if the user denies authorization
    /// - [`AuthError::DeviceCodeExpired`] if the device code expires
    /// - [`AuthError::Authorization`] on any other protocol error
    /// - [`AuthError::AuthorizationTimeout`] when the attempt budget runs out
    pub async fn poll_for_token(
        &self,
        device_code: &str,
        interval_secs: u64,
    ) -> Result<TokenResponse, AuthError> {
        let base = Duration::from_secs(interval_secs.max(1));
        let mut wait = base;

        for attempt in 1..=MAX_POLL_ATTEMPTS {
            sleep(wait).await;

            match self.poll_once(device_code).await {
                Ok(tokens) => {
                    debug!(attempt, "device authorization completed");
                    return Ok(tokens);
                }
                Err(PollState::Pending) => {}
                Err(PollState::SlowDown) => {
                    wait += base;
                }
                Err(PollState::Expired) => return Err(AuthError::DeviceCodeExpired),
                Err(PollState::Denied) => return Err(AuthError::UserDenied),
                Err(PollState::Terminal(e)) => return Err(e),
                Err(PollState::Transient(reason)) => {
                    warn!(attempt, "transient polling failure, retrying: {}", reason);
                }
            }
        }

        Err(AuthError::AuthorizationTimeout {
            attempts: MAX_POLL_ATTEMPTS,
        })
    }

    /// Single poll attempt against the token endpoint.
    async fn poll_once(&self, device_code: &str) -> Result<TokenResponse, PollState> {
        let request = DeviceTokenRequest {
            grant_type: DEVICE_GRANT_TYPE,
            client_id: &self.client_id,
            device_code,
        };

        let response = self
            .client
            .post(&self.token_endpoint)
            .headers(self.headers())
            .form(&request)
            .send()
            .await
            .map_err(|e| PollState::Transient(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| PollState::Transient(e.to_string()))?;

        if let Ok(error) = serde_json::from_str::<OAuthErrorBody>(&body) {
            return Err(match error.error.as_str() {
                "authorization_pending" => PollState::Pending,
                "slow_down" => PollState::SlowDown,
                "expired_token" => PollState::Expired,
                "access_denied" => PollState::Denied,
                _ => PollState::Terminal(AuthError::Authorization {
                    code: error.error,
                    description: error.error_description.unwrap_or_default(),
                }),
            });
        }

        if let Ok(tokens) = serde_json::from_str::<TokenResponse>(&body) {
            return Ok(tokens);
        }

        Err(PollState::Terminal(AuthError::Authorization {
            code: "invalid_response".to_string(),
            description: "token endpoint returned neither tokens nor an error".to_string(),
        }))
    }

    /// Run the whole flow: initiate, show the code, poll.
    ///
    /// The display callback runs to completion before polling begins, so
    /// the user code is visible before time starts effectively elapsing.
    pub async fn execute<F>(&self, show: F) -> Result<TokenResponse, AuthError>
    where
        F: FnOnce(&DeviceAuthorization),
    {
        let authorization = self.initiate().await?;
        show(&authorization);
        self.poll_for_token(&authorization.device_code, authorization.interval)
            .await
    }
}

/// Internal polling states.
enum PollState {
    /// Authorization pending, continue polling.
    Pending,
    /// Provider asked us to slow down.
    SlowDown,
    /// Device code expired.
    Expired,
    /// User denied access.
    Denied,
    /// Terminal protocol error.
    Terminal(AuthError),
    /// Network-level failure, retry within the attempt budget.
    Transient(String),
}

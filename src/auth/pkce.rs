//! auth::pkce
//!
//! Authorization Code + PKCE executor (RFC 7636, S256 only).
//!
//! # Flow
//!
//! 1. [`PkceFlow::build_auth_url`] generates a fresh verifier, challenge,
//!    and CSRF state, and composes the authorization URL
//! 2. The user authorizes in a browser and is redirected with `code` and
//!    `state` query parameters
//! 3. [`PkceFlow::exchange_code`] verifies the echoed state against the
//!    original request, then exchanges the code for tokens
//!
//! The state check is part of the exchange contract: callers hand back
//! the state the provider echoed, and a mismatch aborts before any
//! network traffic.
//!
//! The verifier is generated from 64 random bytes (base64url-encoded to
//! 86 characters, within the 43-128 range RFC 7636 allows) and is not
//! transmitted until the final exchange.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use reqwest::Client;
use sha2::{Digest, Sha256};

use crate::config::OAuthProviderConfig;

use super::errors::AuthError;
use super::token_record::TokenResponse;

/// Random bytes behind the code verifier (well above the 32-byte floor).
const VERIFIER_BYTES: usize = 64;

/// Random bytes behind the CSRF state nonce.
const STATE_BYTES: usize = 32;

/// A pending authorization: the URL to open plus the secrets needed to
/// complete the exchange. Ephemeral, never persisted.
#[derive(Clone)]
pub struct AuthorizationRequest {
    /// Fully composed authorization URL to open in a browser.
    pub url: String,

    /// PKCE code verifier; transmitted only during the final exchange.
    pub code_verifier: String,

    /// CSRF state nonce the provider must echo back.
    pub state: String,
}

impl fmt::Debug for AuthorizationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationRequest")
            .field("url", &self.url)
            .field("code_verifier", &"[REDACTED]")
            .field("state", &self.state)
            .finish()
    }
}

/// Authorization Code + PKCE executor for one provider.
#[derive(Debug, Clone)]
pub struct PkceFlow {
    /// HTTP client.
    client: Client,

    /// OAuth client ID.
    client_id: String,

    /// Space-joined scopes to request.
    scope: String,

    /// Authorization endpoint URL.
    auth_endpoint: String,

    /// Token endpoint URL.
    token_endpoint: String,

    /// Redirect URI registered for the client.
    redirect_uri: String,
}

impl PkceFlow {
    /// Create a PKCE executor from a provider's OAuth config.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRecord` if the config lacks an
    /// authorization endpoint or redirect URI (the config validator
    /// catches this earlier in normal operation).
    pub fn new(client: Client, oauth: &OAuthProviderConfig) -> Result<Self, AuthError> {
        let auth_endpoint = oauth
            .auth_endpoint
            .clone()
            .ok_or_else(|| AuthError::InvalidRecord("provider has no auth_endpoint".into()))?;
        let redirect_uri = oauth
            .redirect_uri
            .clone()
            .ok_or_else(|| AuthError::InvalidRecord("provider has no redirect_uri".into()))?;
        Ok(Self {
            client,
            client_id: oauth.client_id.clone(),
            scope: oauth.scope(),
            auth_endpoint,
            token_endpoint: oauth.token_endpoint.clone(),
            redirect_uri,
        })
    }

    /// Compose an authorization URL with fresh verifier, challenge, and state.
    ///
    /// Every call produces new random values.
    pub fn build_auth_url(&self) -> AuthorizationRequest {
        let code_verifier = generate_verifier();
        let state = generate_state();
        let challenge = compute_challenge(&code_verifier);

        let url = format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
            self.auth_endpoint,
            urlencoded(&self.client_id),
            urlencoded(&self.redirect_uri),
            urlencoded(&self.scope),
            state,
            challenge,
        );

        AuthorizationRequest {
            url,
            code_verifier,
            state,
        }
    }

    /// Exchange an authorization code for tokens.
    ///
    /// `returned_state` is the state query parameter from the redirect;
    /// it is checked against the original request before any network
    /// call is made.
    ///
    /// # Errors
    ///
    /// - [`AuthError::StateMismatch`] if the echoed state differs
    /// - [`AuthError::TokenExchange`] if the provider rejects the code
    /// - [`AuthError::Network`] on connection failure
    pub async fn exchange_code(
        &self,
        code: &str,
        returned_state: &str,
        request: &AuthorizationRequest,
    ) -> Result<TokenResponse, AuthError> {
        if returned_state != request.state {
            return Err(AuthError::StateMismatch);
        }

        let response = self
            .client
            .post(&self.token_endpoint)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", &self.redirect_uri),
                ("client_id", &self.client_id),
                ("code_verifier", &request.code_verifier),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(AuthError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<TokenResponse>().await.map_err(|e| {
            AuthError::InvalidRecord(format!("unparsable token response: {}", e))
        })
    }
}

/// Generate a cryptographically random PKCE code verifier.
fn generate_verifier() -> String {
    let mut bytes = [0u8; VERIFIER_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a CSRF state nonce, independent of the verifier.
fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute the S256 code challenge from a verifier.
///
/// `challenge = BASE64URL(SHA256(verifier))`
fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Minimal URL encoding for query parameter values.
/// Only encodes characters that would break URL parameter parsing.
fn urlencoded(s: &str) -> String {
    s.replace('%', "%25")
        .replace(' ', "%20")
        .replace(':', "%3A")
        .replace('/', "%2F")
        .replace('?', "%3F")
        .replace('&', "%26")
        .replace('=', "%3D")
}

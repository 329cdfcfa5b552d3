//! auth::token_record
//!
//! Persisted token schema and expiry evaluation.
//!
//! # Design
//!
//! One [`TokenRecord`] is stored per provider under the service name
//! `gitsuper-<provider>`. The record is created from a provider
//! [`TokenResponse`] exactly once, at storage time: `expires_at` is
//! computed then as `issued_at + expires_in` and never recomputed later.
//! Records are overwritten wholesale on refresh and deleted on logout.
//!
//! # Security
//!
//! Token values MUST never appear in logs, error messages, or debug
//! output. Both [`TokenRecord`] and [`TokenResponse`] implement custom
//! `Debug` that redacts token fields.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Service-name prefix for stored records.
pub const SERVICE_PREFIX: &str = "gitsuper";

/// Default token type when the provider omits one.
const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Success payload from an OAuth token endpoint.
///
/// Shared by the device grant, the PKCE code exchange, and refresh.
/// `expires_in` is a delta in seconds from the response time; the caller
/// converts it to an absolute timestamp when building a [`TokenRecord`].
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,

    /// Refresh token, absent for flows without refresh capability.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Seconds until the access token expires (delta, not absolute).
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// Token type, usually "Bearer".
    #[serde(default)]
    pub token_type: Option<String>,

    /// Granted scopes, space-joined.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Token record persisted per provider.
///
/// # Security
///
/// This struct implements custom Debug to redact token values.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenRecord {
    /// Opaque bearer credential.
    pub access_token: String,

    /// Refresh token, absent for flows without refresh capability.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Token type, "Bearer" unless the provider says otherwise.
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Space-joined granted scopes.
    #[serde(default)]
    pub scope: String,

    /// When the token was issued (set at storage time).
    pub issued_at: DateTime<Utc>,

    /// When the token expires; absent means non-expiring.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

impl TokenRecord {
    /// Get the credential-store service name for a provider.
    ///
    /// # Example
    ///
    /// ```
    /// use gitsuper::auth::TokenRecord;
    ///
    /// assert_eq!(TokenRecord::service_name("acme"), "gitsuper-acme");
    /// ```
    pub fn service_name(provider: &str) -> String {
        format!("{}-{}", SERVICE_PREFIX, provider)
    }

    /// Normalize a token-endpoint response into a record.
    ///
    /// `previous_scope` carries the scope forward when a refresh response
    /// omits it; every other field comes from the response.
    pub fn from_response(response: &TokenResponse, previous_scope: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            token_type: response
                .token_type
                .clone()
                .unwrap_or_else(default_token_type),
            scope: response
                .scope
                .clone()
                .or_else(|| previous_scope.map(str::to_string))
                .unwrap_or_default(),
            issued_at: now,
            expires_at: response
                .expires_in
                .map(|secs| now + Duration::seconds(secs as i64)),
        }
    }

    /// Check if the access token has expired.
    ///
    /// A record without `expires_at` never expires.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }

    /// Check if the token is still usable.
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }

    /// Check if the token should be refreshed preemptively.
    ///
    /// True when expiry falls within `threshold` of now. Records without
    /// `expires_at` never need refresh.
    pub fn needs_refresh(&self, threshold: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at - threshold,
            None => false,
        }
    }
}

// Custom Debug implementations to redact tokens

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(expires_in: Option<u64>) -> TokenResponse {
        TokenResponse {
            access_token: "tok_access".to_string(),
            refresh_token: Some("tok_refresh".to_string()),
            expires_in,
            token_type: None,
            scope: Some("commit read".to_string()),
        }
    }

    #[test]
    fn service_name_format() {
        assert_eq!(TokenRecord::service_name("acme"), "gitsuper-acme");
        assert_eq!(TokenRecord::service_name("okta-corp"), "gitsuper-okta-corp");
    }

    #[test]
    fn from_response_computes_absolute_expiry() {
        let record = TokenRecord::from_response(&response(Some(3600)), None);

        let expires_at = record.expires_at.expect("expiry set");
        let delta = expires_at - record.issued_at;
        assert_eq!(delta, Duration::seconds(3600));
        assert_eq!(record.token_type, "Bearer");
        assert_eq!(record.scope, "commit read");
    }

    #[test]
    fn from_response_without_expiry_is_non_expiring() {
        let record = TokenRecord::from_response(&response(None), None);
        assert!(record.expires_at.is_none());
        assert!(record.is_valid());
        assert!(!record.needs_refresh(Duration::minutes(5)));
    }

    #[test]
    fn from_response_keeps_previous_scope_when_omitted() {
        let mut resp = response(Some(3600));
        resp.scope = None;

        let record = TokenRecord::from_response(&resp, Some("commit"));
        assert_eq!(record.scope, "commit");

        let record = TokenRecord::from_response(&resp, None);
        assert_eq!(record.scope, "");
    }

    #[test]
    fn past_expiry_is_invalid() {
        let mut record = TokenRecord::from_response(&response(Some(3600)), None);
        record.expires_at = Some(Utc::now() - Duration::hours(1));

        assert!(record.is_expired());
        assert!(!record.is_valid());
    }

    #[test]
    fn future_expiry_is_valid() {
        let record = TokenRecord::from_response(&response(Some(3600)), None);
        assert!(!record.is_expired());
        assert!(record.is_valid());
    }

    #[test]
    fn needs_refresh_within_threshold() {
        let threshold = Duration::minutes(5);

        // Expiring in 4 minutes - within the 5 minute threshold
        let mut soon = TokenRecord::from_response(&response(Some(3600)), None);
        soon.expires_at = Some(Utc::now() + Duration::minutes(4));
        assert!(soon.needs_refresh(threshold));

        // Expiring in an hour - well beyond the threshold
        let fresh = TokenRecord::from_response(&response(Some(3600)), None);
        assert!(!fresh.needs_refresh(threshold));

        // Already expired - certainly needs refresh
        let mut expired = TokenRecord::from_response(&response(Some(3600)), None);
        expired.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(expired.needs_refresh(threshold));
    }

    #[test]
    fn serde_roundtrip_preserves_fields() {
        let record = TokenRecord::from_response(&response(Some(3600)), None);
        let json = serde_json::to_string(&record).expect("serialize");
        let parsed: TokenRecord = serde_json::from_str(&json).expect("parse");

        assert_eq!(parsed, record);
        // Timestamps are RFC 3339 strings on the wire
        assert!(json.contains(&record.issued_at.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)[..10]));
    }

    #[test]
    fn deserialize_defaults_token_type_to_bearer() {
        let json = format!(
            r#"{{"access_token":"tok","scope":"commit","issued_at":"{}"}}"#,
            Utc::now().to_rfc3339()
        );
        let record: TokenRecord = serde_json::from_str(&json).expect("parse");
        assert_eq!(record.token_type, "Bearer");
        assert!(record.refresh_token.is_none());
        assert!(record.expires_at.is_none());
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let record = TokenRecord::from_response(&response(Some(3600)), None);
        let debug_output = format!("{:?}", record);

        assert!(!debug_output.contains("tok_access"));
        assert!(!debug_output.contains("tok_refresh"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains("commit read"));
    }

    #[test]
    fn response_debug_redacts_tokens() {
        let resp = response(Some(3600));
        let debug_output = format!("{:?}", resp);

        assert!(!debug_output.contains("tok_access"));
        assert!(!debug_output.contains("tok_refresh"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn json_output_does_contain_tokens() {
        // JSON output DOES contain tokens (that is what gets stored);
        // redaction applies to Debug only.
        let record = TokenRecord::from_response(&response(Some(3600)), None);
        let json = serde_json::to_string(&record).expect("serialize");

        assert!(json.contains("tok_access"));
        assert!(json.contains("tok_refresh"));
    }
}

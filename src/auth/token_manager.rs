//! auth::token_manager
//!
//! Per-provider token lifecycle authority.
//!
//! # Architecture
//!
//! The manager composes one [`CredentialStore`] and owns:
//! - the in-process token cache (read path never touches the network)
//! - expiry and preemptive-refresh evaluation
//! - refresh orchestration with single-flight de-duplication
//! - best-effort revocation with unconditional local cleanup
//!
//! # Concurrency
//!
//! At most one HTTP refresh request is in flight per manager instance.
//! `refresh_token` acquires an async gate; a caller that finds, after
//! acquiring it, that another refresh settled while it waited takes that
//! refresh's outcome - success or failure - instead of issuing its own
//! request. Some providers invalidate the previous token on refresh, so
//! duplicate refreshes are a correctness problem, not just wasted
//! traffic.
//!
//! Cross-process invocations racing on the credential file are accepted
//! as last-writer-wins; the store's atomic writes prevent torn files.
//!
//! # Example
//!
//! ```ignore
//! use gitsuper::auth::TokenManager;
//!
//! let manager = TokenManager::new("acme", oauth_config, store, http);
//! if !manager.has_valid_token() && !manager.refresh_token().await {
//!     // prompt the user to run `gitsuper login acme`
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::OAuthProviderConfig;
use crate::credentials::CredentialStore;

use super::errors::AuthError;
use super::token_record::{TokenRecord, TokenResponse};

/// Read-only token status projection for reporting.
///
/// Carries no token material, so it is safe to display and serialize.
#[derive(Debug, Clone, Serialize)]
pub struct TokenInfo {
    /// A record exists for the provider.
    pub has_token: bool,

    /// When the access token expires, if it expires at all.
    pub expires_at: Option<DateTime<Utc>>,

    /// Granted scopes.
    pub scope: String,

    /// When the token was issued.
    pub issued_at: DateTime<Utc>,

    /// Whether the token is currently usable.
    pub is_valid: bool,
}

/// Token lifecycle manager for a single provider.
pub struct TokenManager {
    /// Provider ID (e.g. "acme").
    provider: String,

    /// OAuth endpoints and client identity.
    oauth: OAuthProviderConfig,

    /// Credential persistence.
    store: Arc<CredentialStore>,

    /// HTTP client for refresh and revocation.
    client: Client,

    /// Cached token record (loaded on demand).
    cache: RwLock<Option<TokenRecord>>,

    /// Single-flight gate: at most one in-flight refresh per instance.
    refresh_gate: Mutex<RefreshCycle>,

    /// Mirror of [`RefreshCycle::settled`], readable without the gate.
    refresh_generation: AtomicU64,
}

/// Refresh bookkeeping behind the gate.
struct RefreshCycle {
    /// Count of refreshes that have settled, success or failure.
    settled: u64,

    /// Outcome of the most recently settled refresh.
    last_outcome: bool,
}

impl TokenManager {
    /// Create a manager for one provider.
    pub fn new(
        provider: &str,
        oauth: OAuthProviderConfig,
        store: Arc<CredentialStore>,
        client: Client,
    ) -> Self {
        Self {
            provider: provider.to_string(),
            oauth,
            store,
            client,
            cache: RwLock::new(None),
            refresh_gate: Mutex::new(RefreshCycle {
                settled: 0,
                last_outcome: false,
            }),
            refresh_generation: AtomicU64::new(0),
        }
    }

    /// The provider this manager serves.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Credential-store service name for this provider.
    fn service_name(&self) -> String {
        TokenRecord::service_name(&self.provider)
    }

    /// Update the in-memory cache.
    fn update_cache(&self, record: Option<TokenRecord>) {
        if let Ok(mut cache) = self.cache.write() {
            *cache = record;
        }
    }

    /// Get the cached record, loading from the store if needed.
    fn get_or_load(&self) -> Option<TokenRecord> {
        if let Ok(cache) = self.cache.read() {
            if let Some(ref record) = *cache {
                return Some(record.clone());
            }
        }

        let record = self.store.get(&self.service_name());
        if let Some(ref r) = record {
            self.update_cache(Some(r.clone()));
        }
        record
    }

    /// Get the current access token without any network access.
    ///
    /// Returns whatever is cached or stored, valid or not; callers that
    /// need a usable token check [`Self::has_valid_token`] first.
    pub fn get_access_token(&self) -> Option<String> {
        self.get_or_load().map(|record| record.access_token)
    }

    /// Check whether a usable token exists right now.
    ///
    /// Records without an expiry are treated as non-expiring.
    pub fn has_valid_token(&self) -> bool {
        match self.get_or_load() {
            Some(record) => record.is_valid(),
            None => false,
        }
    }

    /// Check whether the token should be refreshed preemptively.
    pub fn needs_refresh(&self) -> bool {
        match self.get_or_load() {
            Some(record) => record.needs_refresh(self.oauth.refresh_threshold()),
            None => false,
        }
    }

    /// Normalize and store a token-endpoint response.
    ///
    /// Persists via the credential store BEFORE updating the cache, so a
    /// token is never observable in memory ahead of being durable.
    pub fn store_tokens(&self, response: &TokenResponse) -> Result<TokenRecord, AuthError> {
        let previous = self.get_or_load();
        let record = TokenRecord::from_response(response, previous.as_ref().map(|r| r.scope.as_str()));

        self.store.set(&self.service_name(), &record)?;
        self.update_cache(Some(record.clone()));
        Ok(record)
    }

    /// Refresh the access token, de-duplicating concurrent callers.
    ///
    /// At most one HTTP refresh runs at a time; callers that arrive
    /// while one is in flight share its settled outcome, success or
    /// failure, instead of issuing their own request.
    ///
    /// Returns `false` when no refresh token is available, the provider
    /// rejects the refresh, or the network fails — callers treat every
    /// "could not refresh" the same way (re-authenticate interactively),
    /// so none of these raise.
    pub async fn refresh_token(&self) -> bool {
        let observed = self.refresh_generation.load(Ordering::Acquire);
        let mut cycle = self.refresh_gate.lock().await;

        // A refresh settled while we waited for the gate; its outcome is
        // ours too. Issuing a second request here could invalidate the
        // token the first caller just received.
        if cycle.settled != observed {
            return cycle.last_outcome;
        }

        let outcome = self.perform_refresh().await;
        cycle.settled += 1;
        cycle.last_outcome = outcome;
        self.refresh_generation
            .store(cycle.settled, Ordering::Release);
        outcome
    }

    /// One refresh attempt against the provider's token endpoint.
    ///
    /// Called with the refresh gate held.
    async fn perform_refresh(&self) -> bool {
        let record = match self.get_or_load() {
            Some(record) => record,
            None => {
                debug!(provider = %self.provider, "no token to refresh");
                return false;
            }
        };

        if record.is_valid() && !record.needs_refresh(self.oauth.refresh_threshold()) {
            debug!(provider = %self.provider, "token already fresh, skipping refresh");
            return true;
        }

        let Some(refresh_token) = record.refresh_token.clone() else {
            warn!(provider = %self.provider, "token expired and no refresh token available");
            return false;
        };

        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", &refresh_token),
            ("client_id", &self.oauth.client_id),
        ];
        if let Some(secret) = self.oauth.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let response = match self
            .client
            .post(&self.oauth.token_endpoint)
            .form(&form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(provider = %self.provider, "token refresh network failure: {}", e);
                return false;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(
                provider = %self.provider,
                status = status.as_u16(),
                "provider rejected token refresh"
            );
            return false;
        }

        let tokens = match response.json::<TokenResponse>().await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(provider = %self.provider, "unparsable refresh response: {}", e);
                return false;
            }
        };

        match self.store_tokens(&tokens) {
            Ok(_) => {
                info!(provider = %self.provider, "access token refreshed");
                true
            }
            Err(e) => {
                warn!(provider = %self.provider, "cannot persist refreshed token: {}", e);
                false
            }
        }
    }

    /// Revoke the current token and remove it locally.
    ///
    /// The revocation POST is best-effort (server-side cleanup); its
    /// failure is logged and never blocks the local cleanup, which runs
    /// unconditionally.
    pub async fn revoke_token(&self) -> Result<(), AuthError> {
        if let (Some(endpoint), Some(record)) =
            (self.oauth.revoke_endpoint.as_deref(), self.get_or_load())
        {
            let result = self
                .client
                .post(endpoint)
                .form(&[
                    ("token", record.access_token.as_str()),
                    ("client_id", self.oauth.client_id.as_str()),
                ])
                .send()
                .await;

            match result {
                Ok(response) => {
                    debug!(
                        provider = %self.provider,
                        status = response.status().as_u16(),
                        "revocation endpoint responded"
                    );
                }
                Err(e) => {
                    warn!(provider = %self.provider, "token revocation failed: {}", e);
                }
            }
        }

        self.update_cache(None);
        self.store.delete(&self.service_name())?;
        Ok(())
    }

    /// Status projection for reporting; `None` when no record exists.
    pub fn token_info(&self) -> Option<TokenInfo> {
        self.get_or_load().map(|record| TokenInfo {
            has_token: true,
            expires_at: record.expires_at,
            scope: record.scope.clone(),
            issued_at: record.issued_at,
            is_valid: record.is_valid(),
        })
    }
}

// Custom Debug to avoid exposing cached tokens
impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("provider", &self.provider)
            .field("has_valid_token", &self.has_valid_token())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{StorageBackend, StorageError, StorageMethod};
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// In-memory backend for manager tests.
    struct MemoryBackend {
        data: StdMutex<HashMap<String, String>>,
    }

    impl MemoryBackend {
        fn new() -> Self {
            Self {
                data: StdMutex::new(HashMap::new()),
            }
        }
    }

    impl StorageBackend for MemoryBackend {
        fn get(&self, service: &str) -> Result<Option<String>, StorageError> {
            Ok(self.data.lock().unwrap().get(service).cloned())
        }

        fn set(&self, service: &str, value: &str) -> Result<(), StorageError> {
            self.data
                .lock()
                .unwrap()
                .insert(service.to_string(), value.to_string());
            Ok(())
        }

        fn delete(&self, service: &str) -> Result<(), StorageError> {
            self.data.lock().unwrap().remove(service);
            Ok(())
        }
    }

    fn memory_store() -> Arc<CredentialStore> {
        Arc::new(CredentialStore::with_backend(
            Box::new(MemoryBackend::new()),
            StorageMethod::File,
        ))
    }

    fn test_oauth(token_endpoint: &str) -> OAuthProviderConfig {
        OAuthProviderConfig {
            client_id: "gitsuper-cli".to_string(),
            client_secret: None,
            scopes: vec!["commit".to_string()],
            token_endpoint: token_endpoint.to_string(),
            device_auth_endpoint: Some("https://id.acme.example/device".to_string()),
            auth_endpoint: None,
            redirect_uri: None,
            revoke_endpoint: None,
            refresh_threshold_ms: None,
        }
    }

    fn make_record(
        access: &str,
        refresh: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> TokenRecord {
        TokenRecord {
            access_token: access.to_string(),
            refresh_token: refresh.map(str::to_string),
            token_type: "Bearer".to_string(),
            scope: "commit".to_string(),
            issued_at: Utc::now(),
            expires_at,
        }
    }

    fn manager_with(
        store: Arc<CredentialStore>,
        token_endpoint: &str,
    ) -> TokenManager {
        TokenManager::new("acme", test_oauth(token_endpoint), store, Client::new())
    }

    #[test]
    fn empty_store_means_no_token() {
        let manager = manager_with(memory_store(), "https://id.acme.example/token");

        assert!(manager.get_access_token().is_none());
        assert!(!manager.has_valid_token());
        assert!(!manager.needs_refresh());
        assert!(manager.token_info().is_none());
    }

    #[test]
    fn valid_token_is_served_from_store_then_cache() {
        let store = memory_store();
        let record = make_record("tok1", None, Some(Utc::now() + Duration::hours(1)));
        store.set("gitsuper-acme", &record).expect("seed");

        let manager = manager_with(store.clone(), "https://id.acme.example/token");

        assert_eq!(manager.get_access_token().as_deref(), Some("tok1"));
        assert!(manager.has_valid_token());
        assert!(!manager.needs_refresh());

        // A second read hits the cache even if the store entry vanishes
        store.delete("gitsuper-acme").expect("delete");
        assert_eq!(manager.get_access_token().as_deref(), Some("tok1"));
    }

    #[test]
    fn expired_token_is_invalid_but_still_returned() {
        let store = memory_store();
        let record = make_record("tok1", Some("ref1"), Some(Utc::now() - Duration::hours(1)));
        store.set("gitsuper-acme", &record).expect("seed");

        let manager = manager_with(store, "https://id.acme.example/token");

        assert!(!manager.has_valid_token());
        assert!(manager.needs_refresh());
        // get_access_token never evaluates validity
        assert_eq!(manager.get_access_token().as_deref(), Some("tok1"));
        assert!(!manager.token_info().expect("info").is_valid);
    }

    #[test]
    fn non_expiring_token_is_always_valid() {
        let store = memory_store();
        store
            .set("gitsuper-acme", &make_record("tok1", None, None))
            .expect("seed");

        let manager = manager_with(store, "https://id.acme.example/token");

        assert!(manager.has_valid_token());
        assert!(!manager.needs_refresh());
        let info = manager.token_info().expect("info");
        assert!(info.is_valid);
        assert!(info.expires_at.is_none());
    }

    #[test]
    fn token_within_threshold_needs_refresh() {
        let store = memory_store();
        store
            .set(
                "gitsuper-acme",
                &make_record("tok1", Some("ref1"), Some(Utc::now() + Duration::minutes(2))),
            )
            .expect("seed");

        let manager = manager_with(store, "https://id.acme.example/token");

        // Still valid, but inside the 5-minute preemptive window
        assert!(manager.has_valid_token());
        assert!(manager.needs_refresh());
    }

    #[test]
    fn store_tokens_persists_and_caches() {
        let store = memory_store();
        let manager = manager_with(store.clone(), "https://id.acme.example/token");

        let response = TokenResponse {
            access_token: "tok1".to_string(),
            refresh_token: Some("ref1".to_string()),
            expires_in: Some(3600),
            token_type: None,
            scope: Some("commit".to_string()),
        };
        let record = manager.store_tokens(&response).expect("store");

        assert!(record.expires_at.is_some());
        // Durable under the provider's service name
        let stored = store.get("gitsuper-acme").expect("persisted");
        assert_eq!(stored.access_token, "tok1");
        // And cached
        assert_eq!(manager.get_access_token().as_deref(), Some("tok1"));
    }

    #[test]
    fn store_tokens_keeps_scope_across_refresh_response_without_scope() {
        let store = memory_store();
        store
            .set(
                "gitsuper-acme",
                &make_record("tok1", Some("ref1"), Some(Utc::now() - Duration::hours(1))),
            )
            .expect("seed");
        let manager = manager_with(store, "https://id.acme.example/token");

        let response = TokenResponse {
            access_token: "tok2".to_string(),
            refresh_token: None,
            expires_in: Some(3600),
            token_type: None,
            scope: None,
        };
        let record = manager.store_tokens(&response).expect("store");

        assert_eq!(record.scope, "commit");
    }

    #[tokio::test]
    async fn refresh_without_any_token_is_false() {
        let manager = manager_with(memory_store(), "https://id.acme.example/token");
        assert!(!manager.refresh_token().await);
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_is_false() {
        let store = memory_store();
        store
            .set(
                "gitsuper-acme",
                &make_record("tok1", None, Some(Utc::now() - Duration::hours(1))),
            )
            .expect("seed");

        let manager = manager_with(store, "https://id.acme.example/token");
        assert!(!manager.refresh_token().await);
    }

    #[tokio::test]
    async fn refresh_on_fresh_token_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = memory_store();
        store
            .set(
                "gitsuper-acme",
                &make_record("tok1", Some("ref1"), Some(Utc::now() + Duration::hours(1))),
            )
            .expect("seed");

        let manager = manager_with(store, &format!("{}/token", server.uri()));
        assert!(manager.refresh_token().await);
    }

    #[tokio::test]
    async fn refresh_success_rotates_the_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=ref1"))
            .and(body_string_contains("client_id=gitsuper-cli"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok2",
                "refresh_token": "ref2",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = memory_store();
        store
            .set(
                "gitsuper-acme",
                &make_record("tok1", Some("ref1"), Some(Utc::now() - Duration::hours(1))),
            )
            .expect("seed");

        let manager = manager_with(store.clone(), &format!("{}/token", server.uri()));

        assert!(manager.refresh_token().await);
        assert!(manager.has_valid_token());
        assert_eq!(manager.get_access_token().as_deref(), Some("tok2"));

        // The whole record was overwritten, refresh token included
        let stored = store.get("gitsuper-acme").expect("stored");
        assert_eq!(stored.refresh_token.as_deref(), Some("ref2"));
    }

    #[tokio::test]
    async fn refresh_sends_client_secret_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("client_secret=shhh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok2",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = memory_store();
        store
            .set(
                "gitsuper-acme",
                &make_record("tok1", Some("ref1"), Some(Utc::now() - Duration::hours(1))),
            )
            .expect("seed");

        let mut oauth = test_oauth(&format!("{}/token", server.uri()));
        oauth.client_secret = Some("shhh".to_string());
        let manager = TokenManager::new("acme", oauth, store, Client::new());

        assert!(manager.refresh_token().await);
    }

    #[tokio::test]
    async fn refresh_rejection_is_false_and_leaves_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let store = memory_store();
        store
            .set(
                "gitsuper-acme",
                &make_record("tok1", Some("ref1"), Some(Utc::now() - Duration::hours(1))),
            )
            .expect("seed");

        let manager = manager_with(store.clone(), &format!("{}/token", server.uri()));

        assert!(!manager.refresh_token().await);
        // Old (expired) record still present; caller re-authenticates
        assert_eq!(
            store.get("gitsuper-acme").expect("record").access_token,
            "tok1"
        );
        assert!(!manager.has_valid_token());
    }

    #[tokio::test]
    async fn refresh_network_failure_is_false_not_panic() {
        let store = memory_store();
        store
            .set(
                "gitsuper-acme",
                &make_record("tok1", Some("ref1"), Some(Utc::now() - Duration::hours(1))),
            )
            .expect("seed");

        // Nothing listens on this port
        let manager = manager_with(store, "http://127.0.0.1:9/token");
        assert!(!manager.refresh_token().await);
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_http_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(std::time::Duration::from_millis(200))
                    .set_body_json(serde_json::json!({
                        "access_token": "tok2",
                        "refresh_token": "ref2",
                        "expires_in": 3600
                    })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = memory_store();
        store
            .set(
                "gitsuper-acme",
                &make_record("tok1", Some("ref1"), Some(Utc::now() - Duration::hours(1))),
            )
            .expect("seed");

        let manager = Arc::new(manager_with(store, &format!("{}/token", server.uri())));

        let first = tokio::spawn({
            let manager = manager.clone();
            async move { manager.refresh_token().await }
        });
        let second = tokio::spawn({
            let manager = manager.clone();
            async move { manager.refresh_token().await }
        });

        let (first, second) = (first.await.expect("join"), second.await.expect("join"));
        assert!(first, "first caller should see a refreshed token");
        assert!(second, "second caller should share the same outcome");
        assert_eq!(manager.get_access_token().as_deref(), Some("tok2"));
        // wiremock verifies expect(1) on drop: exactly one HTTP refresh
    }

    #[tokio::test]
    async fn concurrent_failed_refreshes_share_one_http_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_delay(std::time::Duration::from_millis(200))
                    .set_body_json(serde_json::json!({ "error": "invalid_grant" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = memory_store();
        store
            .set(
                "gitsuper-acme",
                &make_record("tok1", Some("ref1"), Some(Utc::now() - Duration::hours(1))),
            )
            .expect("seed");

        let manager = Arc::new(manager_with(store, &format!("{}/token", server.uri())));

        let first = tokio::spawn({
            let manager = manager.clone();
            async move { manager.refresh_token().await }
        });
        let second = tokio::spawn({
            let manager = manager.clone();
            async move { manager.refresh_token().await }
        });

        // The rejection is shared: one HTTP call, both callers false
        assert!(!first.await.expect("join"));
        assert!(!second.await.expect("join"));
    }

    #[tokio::test]
    async fn revoke_posts_and_clears_local_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/revoke"))
            .and(body_string_contains("token=tok1"))
            .and(body_string_contains("client_id=gitsuper-cli"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = memory_store();
        store
            .set(
                "gitsuper-acme",
                &make_record("tok1", Some("ref1"), Some(Utc::now() + Duration::hours(1))),
            )
            .expect("seed");

        let mut oauth = test_oauth("https://id.acme.example/token");
        oauth.revoke_endpoint = Some(format!("{}/revoke", server.uri()));
        let manager = TokenManager::new("acme", oauth, store.clone(), Client::new());

        manager.revoke_token().await.expect("revoke");

        assert!(store.get("gitsuper-acme").is_none());
        assert!(manager.get_access_token().is_none());
    }

    #[tokio::test]
    async fn revoke_clears_local_state_even_when_endpoint_unreachable() {
        let store = memory_store();
        store
            .set(
                "gitsuper-acme",
                &make_record("tok1", None, Some(Utc::now() + Duration::hours(1))),
            )
            .expect("seed");

        let mut oauth = test_oauth("https://id.acme.example/token");
        oauth.revoke_endpoint = Some("http://127.0.0.1:9/revoke".to_string());
        let manager = TokenManager::new("acme", oauth, store.clone(), Client::new());

        manager.revoke_token().await.expect("revoke");
        assert!(store.get("gitsuper-acme").is_none());
        assert!(!manager.has_valid_token());
    }

    #[tokio::test]
    async fn revoke_without_record_is_idempotent() {
        let manager = manager_with(memory_store(), "https://id.acme.example/token");
        manager.revoke_token().await.expect("first revoke");
        manager.revoke_token().await.expect("second revoke");
    }

    #[test]
    fn debug_output_does_not_expose_tokens() {
        let store = memory_store();
        store
            .set(
                "gitsuper-acme",
                &make_record("tok-secret", Some("ref-secret"), None),
            )
            .expect("seed");
        let manager = manager_with(store, "https://id.acme.example/token");

        let debug_output = format!("{:?}", manager);
        assert!(debug_output.contains("acme"));
        assert!(!debug_output.contains("tok-secret"));
        assert!(!debug_output.contains("ref-secret"));
    }
}

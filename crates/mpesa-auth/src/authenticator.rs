//! Bearer-token lifecycle for one client instance
//!
//! The `Authenticator` owns the consumer key/secret pair and the single
//! cached credential. `get_token` holds the cache lock across
//! check, refresh and store, so concurrent callers that find an expired token
//! refresh one after another rather than racing on the write.

use std::sync::Arc;

use common::{ClientConfig, Secret};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use transport::{HttpClient, Result};

use crate::credentials::{Credential, TokenCache};
use crate::token::request_token;

pub struct Authenticator {
    consumer_key: Secret<String>,
    consumer_secret: Secret<String>,
    http: Arc<dyn HttpClient>,
    cache: Mutex<TokenCache>,
}

impl Authenticator {
    pub fn new(
        consumer_key: impl Into<Secret<String>>,
        consumer_secret: impl Into<Secret<String>>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            http,
            cache: Mutex::new(TokenCache::new()),
        }
    }

    /// Build from a loaded config whose credentials have been resolved.
    pub fn from_config(config: &ClientConfig, http: Arc<dyn HttpClient>) -> common::Result<Self> {
        let (Some(key), Some(secret)) = (&config.consumer_key, &config.consumer_secret) else {
            return Err(common::Error::Config(
                "consumer credentials not resolved; call resolve_credentials first".into(),
            ));
        };
        Ok(Self::new(key.clone(), secret.clone(), http))
    }

    /// Return a valid bearer token, refreshing it when the cached one is
    /// missing or expired, or when `force_refresh` is set.
    ///
    /// A failed refresh returns the classified error and leaves the cached
    /// credential untouched. An expired token is never returned.
    pub async fn get_token(&self, force_refresh: bool) -> Result<String> {
        let mut cache = self.cache.lock().await;
        cache
            .get_or_refresh(force_refresh, || self.refresh(force_refresh))
            .await
    }

    /// Drop the cached credential so the next call re-authenticates.
    pub async fn invalidate(&self) {
        self.cache.lock().await.clear();
        debug!("access token cache cleared");
    }

    /// Snapshot of the cached credential, expired or not.
    pub async fn cached_credential(&self) -> Option<Credential> {
        self.cache.lock().await.current().cloned()
    }

    async fn refresh(&self, forced: bool) -> Result<Credential> {
        debug!(forced, "requesting access token");
        let result = request_token(
            self.http.as_ref(),
            self.consumer_key.expose(),
            self.consumer_secret.expose(),
        )
        .await;

        match result {
            Ok(response) => {
                metrics::counter!("mpesa_token_refresh_total", "outcome" => "success").increment(1);
                let credential = response.into_credential(Instant::now());
                info!(ttl_secs = credential.ttl_secs(), forced, "access token refreshed");
                Ok(credential)
            }
            Err(e) => {
                metrics::counter!("mpesa_token_refresh_total", "outcome" => "error").increment(1);
                warn!(code = %e.code, error = %e.message, "access token request failed");
                Err(e)
            }
        }
    }
}

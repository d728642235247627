//! Cached bearer credential
//!
//! A `Credential` is created only by a successful token exchange and is
//! replaced wholesale on every refresh. `TokenCache` holds at most one of
//! them and is owned by the `Authenticator`, which serializes access to it
//! behind a tokio Mutex. Nothing is persisted across restarts.
//!
//! Freshness uses `tokio::time::Instant` so the expiry boundary can be
//! pinned in tests with a paused clock.

use std::future::Future;
use std::time::Duration;

use common::Secret;
use tokio::time::Instant;
use tracing::debug;

use transport::Result;

/// One bearer token issued by the gateway.
#[derive(Debug, Clone)]
pub struct Credential {
    token: Secret<String>,
    issued_at: Instant,
    ttl_secs: u64,
}

impl Credential {
    /// Build a credential issued at `issued_at`.
    ///
    /// Callers guarantee `token` is non-empty and `ttl_secs` is positive;
    /// `token::request_token` enforces both before constructing one.
    pub fn new(token: impl Into<String>, issued_at: Instant, ttl_secs: u64) -> Self {
        Self {
            token: Secret::new(token.into()),
            issued_at,
            ttl_secs,
        }
    }

    pub fn token(&self) -> &str {
        self.token.expose()
    }

    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn expires_at(&self) -> Instant {
        self.issued_at + Duration::from_secs(self.ttl_secs)
    }

    /// Expired strictly after `issued_at + ttl`. The boundary instant itself
    /// is still valid.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

/// Holder of at most one cached credential.
#[derive(Debug, Default)]
pub struct TokenCache {
    current: Option<Credential>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached token if one exists and has not expired.
    pub fn fresh_token(&self) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|credential| !credential.is_expired())
            .map(Credential::token)
    }

    pub fn current(&self) -> Option<&Credential> {
        self.current.as_ref()
    }

    /// Replace the cached credential.
    pub fn store(&mut self, credential: Credential) {
        self.current = Some(credential);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Return the fresh cached token, or run `refresh` and cache its result.
    ///
    /// `force_refresh` skips the cache check. A failed refresh leaves the
    /// cache exactly as it was.
    pub async fn get_or_refresh<F, Fut>(&mut self, force_refresh: bool, refresh: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Credential>>,
    {
        if !force_refresh {
            if let Some(token) = self.fresh_token() {
                debug!("using cached access token");
                return Ok(token.to_owned());
            }
        }

        let credential = refresh().await?;
        let token = credential.token().to_owned();
        self.store(credential);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transport::Error;

    #[tokio::test(start_paused = true)]
    async fn expiry_boundary_is_inclusive() {
        let issued = Instant::now();
        let credential = Credential::new("abc", issued, 60);

        assert!(!credential.is_expired_at(issued + Duration::from_secs(60)));
        assert!(credential.is_expired_at(issued + Duration::from_secs(60) + Duration::from_nanos(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_token_hides_expired_credential() {
        let mut cache = TokenCache::new();
        assert!(cache.fresh_token().is_none());

        cache.store(Credential::new("abc", Instant::now(), 10));
        assert_eq!(cache.fresh_token(), Some("abc"));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(cache.fresh_token().is_none());
        // Expired credential is still held until replaced
        assert_eq!(cache.current().unwrap().token(), "abc");
    }

    #[tokio::test]
    async fn get_or_refresh_skips_refresh_when_fresh() {
        let mut cache = TokenCache::new();
        cache.store(Credential::new("cached", Instant::now(), 3600));

        let token = cache
            .get_or_refresh(false, || async {
                Err(Error::request_failed("refresh must not run for a fresh token"))
            })
            .await
            .unwrap();
        assert_eq!(token, "cached");
    }

    #[tokio::test]
    async fn forced_refresh_replaces_credential() {
        let mut cache = TokenCache::new();
        cache.store(Credential::new("old", Instant::now(), 3600));

        let token = cache
            .get_or_refresh(true, || async {
                Ok(Credential::new("new", Instant::now(), 3600))
            })
            .await
            .unwrap();
        assert_eq!(token, "new");
        assert_eq!(cache.fresh_token(), Some("new"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_credential() {
        let mut cache = TokenCache::new();
        cache.store(Credential::new("old", Instant::now(), 3600));

        let result = cache
            .get_or_refresh(true, || async { Err(Error::timeout()) })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.fresh_token(), Some("old"));
    }

    #[tokio::test]
    async fn debug_output_redacts_token() {
        let credential = Credential::new("super-secret-token", Instant::now(), 3600);
        let debug = format!("{credential:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }
}

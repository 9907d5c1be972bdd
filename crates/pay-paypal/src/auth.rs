//! # Access Token Cache
//!
//! Single-slot cache for the provider's short-lived OAuth access token.
//!
//! The slot sits behind a `tokio::sync::Mutex` that stays locked while a
//! refresh is in flight. Callers arriving during a refresh wait on the
//! lock and then find the new token, so at most one client-credentials
//! exchange is outstanding at any time.

use async_trait::async_trait;
use pay_core::{AccessToken, AuthError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Tokens are refreshed this long before the provider says they expire.
pub const REFRESH_SKEW: Duration = Duration::from_secs(30);

/// Performs the client-credentials exchange
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<AccessToken, AuthError>;
}

#[derive(Debug)]
struct CachedToken {
    token: AccessToken,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_SKEW < self.expires_at
    }
}

/// Lock-guarded token slot shared by every order request
pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    slot: Mutex<Option<CachedToken>>,
    auth_timeout: Duration,
}

impl TokenCache {
    pub fn new(source: Arc<dyn TokenSource>, auth_timeout: Duration) -> Self {
        Self {
            source,
            slot: Mutex::new(None),
            auth_timeout,
        }
    }

    /// Return the cached token, refreshing it first if it is missing or
    /// about to expire.
    pub async fn get_or_refresh(&self) -> Result<AccessToken, AuthError> {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.is_fresh(Instant::now()) {
                debug!("Using cached access token");
                return Ok(cached.token.clone());
            }
        }

        // a failed refresh leaves no token behind
        *slot = None;

        let token = match tokio::time::timeout(self.auth_timeout, self.source.fetch_token()).await
        {
            Ok(Ok(token)) => token,
            Ok(Err(err)) => {
                warn!(error = %err, "Access token refresh failed");
                return Err(err);
            }
            Err(_) => {
                warn!(timeout = ?self.auth_timeout, "Access token refresh timed out");
                return Err(AuthError::Timeout);
            }
        };

        let Some(expires_at) = Instant::now().checked_add(token.expires_in()) else {
            warn!(
                expires_in = token.expires_in().as_secs(),
                "Access token lifetime out of range, not caching"
            );
            return Ok(token);
        };
        info!(expires_in = token.expires_in().as_secs(), "Refreshed access token");

        *slot = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts exchanges; each takes `latency` and yields a token named after the count
    struct CountingSource {
        calls: AtomicUsize,
        latency: Duration,
        expires_in: Duration,
        fail: bool,
    }

    impl CountingSource {
        fn new(latency: Duration, expires_in: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                latency,
                expires_in,
                fail: false,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn fetch_token(&self) -> Result<AccessToken, AuthError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.latency).await;
            if self.fail {
                return Err(AuthError::Rejected {
                    status: 401,
                    message: "invalid_client".into(),
                });
            }
            Ok(AccessToken::new(format!("token-{n}"), self.expires_in))
        }
    }

    fn cache(source: &Arc<CountingSource>) -> TokenCache {
        TokenCache::new(source.clone(), Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_token_is_reused() {
        let source = Arc::new(CountingSource::new(
            Duration::from_millis(50),
            Duration::from_secs(3600),
        ));
        let cache = cache(&source);

        let first = cache.get_or_refresh().await.unwrap();
        let second = cache.get_or_refresh().await.unwrap();

        assert_eq!(first.secret(), "token-1");
        assert_eq!(second.secret(), "token-1");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_under_concurrency() {
        let source = Arc::new(CountingSource::new(
            Duration::from_secs(1),
            Duration::from_secs(3600),
        ));
        let cache = Arc::new(cache(&source));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_or_refresh().await })
            })
            .collect();

        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token.secret(), "token-1");
        }
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_before_expiry() {
        let source = Arc::new(CountingSource::new(
            Duration::from_millis(10),
            Duration::from_secs(120),
        ));
        let cache = cache(&source);

        cache.get_or_refresh().await.unwrap();

        // still outside the skew window
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(cache.get_or_refresh().await.unwrap().secret(), "token-1");

        // inside the last 30 seconds of validity
        tokio::time::advance(Duration::from_secs(35)).await;
        assert_eq!(cache.get_or_refresh().await.unwrap().secret(), "token-2");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_lifetime_is_not_cached() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(1), Duration::MAX));
        let cache = cache(&source);

        assert_eq!(cache.get_or_refresh().await.unwrap().secret(), "token-1");
        assert_eq!(cache.get_or_refresh().await.unwrap().secret(), "token-2");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_caches_nothing() {
        let source = Arc::new(CountingSource::new(
            Duration::from_secs(30),
            Duration::from_secs(3600),
        ));
        let cache = cache(&source);

        assert_eq!(cache.get_or_refresh().await, Err(AuthError::Timeout));
        assert_eq!(cache.get_or_refresh().await, Err(AuthError::Timeout));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_is_propagated() {
        let mut source = CountingSource::new(Duration::from_millis(1), Duration::from_secs(3600));
        source.fail = true;
        let source = Arc::new(source);
        let cache = cache(&source);

        assert!(matches!(
            cache.get_or_refresh().await,
            Err(AuthError::Rejected { status: 401, .. })
        ));
    }
}

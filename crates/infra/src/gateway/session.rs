//! Session token cache for the device directory.

use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Tokens are considered expired slightly early so an in-flight call never
/// carries a token that lapses mid-request.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct Session {
    token: String,
    expires_at: Instant,
}

impl Session {
    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Shared cache of the current vendor session.
///
/// The directory client authenticates lazily: the first call (or the first
/// call after an invalidation) logs in and stores the token here.
#[derive(Debug, Default)]
pub(crate) struct SessionCache {
    inner: RwLock<Option<Session>>,
}

impl SessionCache {
    /// The cached token, if one is present and not about to expire.
    pub(crate) async fn current(&self) -> Option<String> {
        let guard = self.inner.read().await;
        guard.as_ref().filter(|s| s.is_usable()).map(|s| s.token.clone())
    }

    /// Store a freshly issued token with its advertised lifetime.
    pub(crate) async fn store(&self, token: String, ttl: Duration) {
        let expires_at = Instant::now() + ttl.saturating_sub(EXPIRY_MARGIN);
        let mut guard = self.inner.write().await;
        *guard = Some(Session { token, expires_at });
    }

    /// Drop the cached token, forcing the next call to re-authenticate.
    pub(crate) async fn invalidate(&self) {
        let mut guard = self.inner.write().await;
        *guard = None;
    }
}

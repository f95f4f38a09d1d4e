//! Access-token retrieval from persistent storage.

use std::sync::Arc;

use zeroize::Zeroizing;

use super::ports::KeyValueStore;

/// Storage key holding the session access token.
pub const ACCESS_TOKEN_KEY: &str = "ifi_access_token";

/// Read-only view of the session token.
///
/// Always reads the backing store live, never caching the value, so a
/// logout performed in another tab is observed on the next read.
#[derive(Debug)]
pub struct TokenStore<S> {
    storage: Arc<S>,
}

impl<S> Clone for TokenStore<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: KeyValueStore> TokenStore<S> {
    /// Wrap the persistent store holding the token.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Current access token, if a non-blank one is stored.
    ///
    /// The returned value is zeroed on drop.
    pub fn token(&self) -> Option<Zeroizing<String>> {
        self.storage
            .get(ACCESS_TOKEN_KEY)
            .filter(|raw| !raw.trim().is_empty())
            .map(Zeroizing::new)
    }
}

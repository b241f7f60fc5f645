use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::credential::CachedCredential;

/// Expiring credential store: cache_key -> credential.
///
/// Cloning yields another handle on the same map. Expired entries stay in
/// place until overwritten; readers never see them.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    inner: Arc<RwLock<HashMap<String, CachedCredential>>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the value if it exists and is not expired
    pub async fn get(&self, key: &str) -> Option<String> {
        let map = self.inner.read().await;
        map.get(key)
            .filter(|credential| credential.is_usable())
            .map(|credential| credential.value.to_owned())
    }

    /// Store `value` for `lifetime_seconds`. Non-positive lifetimes leave the store untouched.
    pub async fn set(&self, key: &str, value: String, lifetime_seconds: i64) {
        if lifetime_seconds <= 0 {
            debug!("skip caching '{}': non-positive lifetime {}", key, lifetime_seconds);
            return;
        }
        let mut map = self.inner.write().await;
        map.insert(key.to_owned(), CachedCredential::new(value, lifetime_seconds));
    }

    /// Number of physically present entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Store key for the access token
pub const ACCESS_TOKEN_KEY: &str = "auth.token";
/// Store key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "auth.refresh-token";

/// Persisted key/value token storage scoped to a request context
///
/// The production implementation is cookie-backed and lives with the host
/// application; this crate only depends on the seam. Writes carry a TTL
/// after which the value must no longer be readable.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn read(&self, key: &str) -> Option<String>;
    async fn write(&self, key: &str, value: &str, ttl: chrono::Duration);
    async fn delete(&self, key: &str);
}

#[derive(Clone, Debug)]
struct StoredValue {
    value: String,
    expires_at: chrono::DateTime<chrono::Utc>,
}

/// In-memory token store
///
/// Used directly in native contexts and in tests; expired entries are
/// dropped on read.
pub struct MemoryTokenStore {
    entries: Arc<RwLock<HashMap<String, StoredValue>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Clean up expired entries (run periodically)
    pub async fn cleanup_expired(&self) {
        let mut entries = self.entries.write().await;
        let now = chrono::Utc::now();
        entries.retain(|_, stored| stored.expires_at > now);
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn read(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        let stored = entries.get(key)?;

        if stored.expires_at <= chrono::Utc::now() {
            // Entry expired
            return None;
        }

        Some(stored.value.clone())
    }

    async fn write(&self, key: &str, value: &str, ttl: chrono::Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at: chrono::Utc::now() + ttl,
            },
        );
    }

    async fn delete(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }
}

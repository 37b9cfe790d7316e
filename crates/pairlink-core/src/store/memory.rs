//! In-process session store.
//!
//! Suitable for single-instance deployments and tests. Expiry uses
//! `tokio::time::Instant`, so paused-clock tests can advance past a TTL.

use super::traits::SessionStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Session store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns the number removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Purged {} expired store entries", removed);
        }
        removed
    }

    /// Number of unexpired entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn live_entry(&self, key: &str) -> Option<Entry> {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_live(now))
            .cloned()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.live_entry(key).await.map(|entry| entry.value))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.live_entry(key).await.is_some())
    }

    /// Remaining lifetime rounded to the nearest second, as Redis reports it.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let now = Instant::now();
        Ok(self.live_entry(key).await.map(|entry| {
            let remaining = entry.expires_at.saturating_duration_since(now);
            Duration::from_secs((remaining.as_millis() as u64 + 500) / 1000)
        }))
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let deleted = keys
            .iter()
            .filter_map(|key| entries.remove(key))
            .filter(|entry| entry.is_live(now))
            .count();
        Ok(deleted as u64)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_set_get_overwrite() {
        let store = MemoryStore::new();
        assert_eq!(store.get("pair:AAAAAA").await.unwrap(), None);

        store.set_with_expiry("pair:AAAAAA", "one", HOUR).await.unwrap();
        store.set_with_expiry("pair:AAAAAA", "two", HOUR).await.unwrap();
        assert_eq!(
            store.get("pair:AAAAAA").await.unwrap().as_deref(),
            Some("two")
        );
        assert!(store.exists("pair:AAAAAA").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let store = MemoryStore::new();
        store.set_with_expiry("link:AAAAAA", "x", HOUR).await.unwrap();

        tokio::time::advance(Duration::from_secs(1800)).await;
        let remaining = store.ttl("link:AAAAAA").await.unwrap().unwrap();
        assert_eq!(remaining, Duration::from_secs(1800));

        tokio::time::advance(Duration::from_secs(1801)).await;
        assert!(!store.exists("link:AAAAAA").await.unwrap());
        assert_eq!(store.ttl("link:AAAAAA").await.unwrap(), None);
        assert!(store.list_keys("link:").await.unwrap().is_empty());
        assert_eq!(store.purge_expired().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewrite_refreshes_ttl() {
        let store = MemoryStore::new();
        store.set_with_expiry("pair:AAAAAA", "a", HOUR).await.unwrap();
        tokio::time::advance(Duration::from_secs(3000)).await;
        store.set_with_expiry("pair:AAAAAA", "a", HOUR).await.unwrap();
        tokio::time::advance(Duration::from_secs(3000)).await;
        assert!(store.exists("pair:AAAAAA").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_many_counts_existing_only() {
        let store = MemoryStore::new();
        store.set_with_expiry("pair:A", "1", HOUR).await.unwrap();
        store.set_with_expiry("link:A", "2", HOUR).await.unwrap();

        let keys = vec![
            "pair:A".to_string(),
            "link:A".to_string(),
            "mobile:A".to_string(),
        ];
        assert_eq!(store.delete_many(&keys).await.unwrap(), 2);
        assert_eq!(store.delete_many(&keys).await.unwrap(), 0);
        assert_eq!(store.delete_many(&[]).await.unwrap(), 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_keys_by_prefix() {
        let store = MemoryStore::new();
        store.set_with_expiry("pair:A", "1", HOUR).await.unwrap();
        store.set_with_expiry("pair:B", "1", HOUR).await.unwrap();
        store.set_with_expiry("mobile:A", "1", HOUR).await.unwrap();

        let mut keys = store.list_keys("pair:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["pair:A".to_string(), "pair:B".to_string()]);
    }
}

//! Session store backend trait.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// TTL-capable string key-value store shared by every server instance.
///
/// Each call is an independent, individually atomic operation; nothing here
/// spans multiple keys transactionally.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Set `key` to `value`, replacing any previous value and expiry.
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Get the value of `key`. `None` if missing or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Check whether `key` is present and unexpired.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Remaining lifetime of `key`. `None` if missing or without expiry.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// Delete all given keys, returning how many existed.
    async fn delete_many(&self, keys: &[String]) -> Result<u64>;

    /// List keys starting with `prefix`.
    ///
    /// Listing is not a snapshot: keys may expire between listing and a
    /// subsequent read.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

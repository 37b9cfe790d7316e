//! Centralized configuration for the pairing core.
//!
//! Constants for code shape, session expiry, store key layout and store
//! client behaviour, plus the runtime [`PairingConfig`].

use std::time::Duration;

/// Pairing session configuration.
pub struct SessionConfig;

impl SessionConfig {
    pub const CODE_LENGTH: usize = 6;
    pub const CODE_ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    pub const TTL: Duration = Duration::from_secs(3600); // 1 hour
    pub const MAX_CODE_ATTEMPTS: u32 = 10;

    // Store key namespaces
    pub const PAIR_PREFIX: &'static str = "pair:";
    pub const LINK_PREFIX: &'static str = "link:";
    pub const MOBILE_PREFIX: &'static str = "mobile:";
}

/// Session store client configuration.
pub struct StoreConfig;

impl StoreConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    pub const RETRY_ATTEMPTS: u32 = 3;
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(50);
    pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(2);
    pub const HEALTH_CHECK_KEY: &'static str = "health:check";
    pub const HEALTH_CHECK_TTL: Duration = Duration::from_secs(10);
    /// How often the in-memory backend sweeps expired entries.
    pub const MEMORY_PURGE_INTERVAL: Duration = Duration::from_secs(60);
}

/// Runtime configuration for [`crate::PairingManager`].
#[derive(Debug, Clone)]
pub struct PairingConfig {
    /// Expiry applied (and refreshed) on every session sub-record write.
    pub session_ttl: Duration,
    /// Upper bound on generate-and-check rounds when allocating a code.
    pub max_code_attempts: u32,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            session_ttl: SessionConfig::TTL,
            max_code_attempts: SessionConfig::MAX_CODE_ATTEMPTS,
        }
    }
}

impl PairingConfig {
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_max_code_attempts(mut self, attempts: u32) -> Self {
        self.max_code_attempts = attempts;
        self
    }
}

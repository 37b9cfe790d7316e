//! Command-line and environment configuration.

use clap::{Parser, ValueEnum};
use pairlink_core::{PairingConfig, PairlinkError, UpstashStore};
use std::time::Duration;

/// Admin password used when none is configured.
pub const DEFAULT_ADMIN_PASS: &str = "admin123";

/// Which session store backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// Process-local store. Sessions do not survive a restart.
    Memory,
    /// Upstash Redis over its REST API.
    Upstash,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "pairlink-server")]
#[command(about = "Pairing and link relay server for desktop/mobile handoff")]
pub struct Args {
    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(short, long)]
    pub debug: bool,

    /// Password required by the admin reset endpoint
    #[arg(long, env = "ADMIN_PASS", default_value = DEFAULT_ADMIN_PASS, hide_env_values = true)]
    pub admin_pass: String,

    /// Session store backend
    #[arg(long, env = "PAIRLINK_STORE", value_enum, default_value = "memory")]
    pub store: StoreBackend,

    /// Upstash REST endpoint, e.g. https://<db>.upstash.io
    #[arg(long, env = "UPSTASH_REDIS_REST_URL")]
    pub upstash_url: Option<String>,

    /// Upstash REST bearer token
    #[arg(long, env = "UPSTASH_REDIS_REST_TOKEN", hide_env_values = true)]
    pub upstash_token: Option<String>,

    /// Lifetime of a pairing session, refreshed on every write
    #[arg(long, env = "SESSION_TTL_SECS", default_value = "3600")]
    pub session_ttl_secs: u64,
}

impl Args {
    pub fn pairing_config(&self) -> PairingConfig {
        PairingConfig::default().with_session_ttl(Duration::from_secs(self.session_ttl_secs))
    }

    pub fn uses_default_admin_pass(&self) -> bool {
        self.admin_pass == DEFAULT_ADMIN_PASS
    }

    /// Build the Upstash client from the configured URL and token.
    pub fn upstash_store(&self) -> pairlink_core::Result<UpstashStore> {
        match (&self.upstash_url, &self.upstash_token) {
            (Some(url), Some(token)) => UpstashStore::new(url.as_str(), token.as_str()),
            _ => Err(PairlinkError::Config {
                message: "upstash store requires UPSTASH_REDIS_REST_URL and \
                          UPSTASH_REDIS_REST_TOKEN"
                    .to_string(),
            }),
        }
    }

    /// Reject settings that cannot work before anything is started.
    pub fn validate(&self) -> pairlink_core::Result<()> {
        if self.session_ttl_secs == 0 {
            return Err(PairlinkError::Config {
                message: "session TTL must be at least one second".to_string(),
            });
        }
        if self.admin_pass.is_empty() {
            return Err(PairlinkError::Config {
                message: "admin password must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

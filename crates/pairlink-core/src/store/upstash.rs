//! Upstash Redis REST backend.
//!
//! Each store operation is one Redis command POSTed as a JSON array to the
//! REST endpoint with a bearer token; the reply is `{"result": ...}` or
//! `{"error": "..."}`. All commands issued here are idempotent, so transport
//! failures and 5xx replies are retried.

use super::retry::{retry_async, RetryConfig};
use super::traits::SessionStore;
use crate::config::StoreConfig;
use crate::error::{PairlinkError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct UpstashReply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// One failed command attempt, tagged with whether a retry may help.
struct CommandError {
    error: PairlinkError,
    retryable: bool,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl CommandError {
    fn permanent(error: PairlinkError) -> Self {
        Self {
            error,
            retryable: false,
        }
    }

    fn for_status(status: StatusCode, message: String) -> Self {
        Self {
            error: PairlinkError::storage(message),
            retryable: status.is_server_error(),
        }
    }
}

/// Session store backed by Upstash Redis over its REST API.
pub struct UpstashStore {
    client: Client,
    url: String,
    token: String,
    retry: RetryConfig,
}

impl UpstashStore {
    /// Create a client for the given REST endpoint and token.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, token, StoreConfig::REQUEST_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(
        url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let url = url.into().trim_end_matches('/').to_string();
        url::Url::parse(&url).map_err(|e| PairlinkError::Config {
            message: format!("invalid Upstash REST URL: {}", e),
        })?;

        let token = token.into();
        if token.is_empty() {
            return Err(PairlinkError::Config {
                message: "Upstash REST token is empty".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent("pairlink/0.3")
            .build()
            .map_err(|e| PairlinkError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            url,
            token,
            retry: RetryConfig::default(),
        })
    }

    /// Override the retry policy for store commands.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn command(&self, args: &[&str]) -> Result<Value> {
        debug!("Upstash {}", args.first().copied().unwrap_or_default());
        let should_retry = |e: &CommandError| e.retryable;
        retry_async(&self.retry, || self.send_once(args), should_retry)
            .await
            .map_err(|e| e.error)
    }

    async fn send_once(&self, args: &[&str]) -> std::result::Result<Value, CommandError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await
            .map_err(|e| {
                let error = PairlinkError::from(e);
                CommandError {
                    retryable: error.is_retryable(),
                    error,
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            let error = PairlinkError::from(e);
            CommandError {
                retryable: error.is_retryable(),
                error,
            }
        })?;

        let reply = match serde_json::from_str::<UpstashReply>(&body) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => {
                return Err(CommandError::for_status(
                    status,
                    format!("Upstash returned HTTP {}", status),
                ))
            }
            Err(e) => return Err(CommandError::permanent(e.into())),
        };

        if let Some(message) = reply.error {
            return Err(CommandError::for_status(status, message));
        }
        if !status.is_success() {
            return Err(CommandError::for_status(
                status,
                format!("Upstash returned HTTP {}", status),
            ));
        }
        Ok(reply.result)
    }
}

fn expect_integer(value: Value, command: &str) -> Result<i64> {
    value.as_i64().ok_or_else(|| {
        PairlinkError::storage(format!("{} returned non-integer {}", command, value))
    })
}

#[async_trait]
impl SessionStore for UpstashStore {
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let secs = ttl.as_secs().max(1).to_string();
        self.command(&["SET", key, value, "EX", secs.as_str()]).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.command(&["GET", key]).await? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            // Upstash may auto-decode numeric-looking strings
            Value::Number(n) => Ok(Some(n.to_string())),
            other => Err(PairlinkError::storage(format!(
                "GET returned unexpected {}",
                other
            ))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let count = expect_integer(self.command(&["EXISTS", key]).await?, "EXISTS")?;
        Ok(count == 1)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        // -2: missing, -1: no expiry
        let secs = expect_integer(self.command(&["TTL", key]).await?, "TTL")?;
        Ok(u64::try_from(secs).ok().map(Duration::from_secs))
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut args = Vec::with_capacity(keys.len() + 1);
        args.push("DEL");
        args.extend(keys.iter().map(String::as_str));
        let deleted = expect_integer(self.command(&args).await?, "DEL")?;
        Ok(deleted.max(0) as u64)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let pattern = format!("{}*", prefix);
        match self.command(&["KEYS", pattern.as_str()]).await? {
            Value::Array(items) => Ok(items
                .into_iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect()),
            Value::Null => Ok(Vec::new()),
            other => Err(PairlinkError::storage(format!(
                "KEYS returned unexpected {}",
                other
            ))),
        }
    }

    fn backend_name(&self) -> &'static str {
        "upstash"
    }
}

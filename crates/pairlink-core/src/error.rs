//! Error types for pairlink.
//!
//! Local validation failures (`InvalidFormat`, `EmptyLink`, `InvalidUrl`) are
//! produced before any store access. `Storage` wraps every failure of the backing
//! session store. Undelivered real-time pushes are not errors; see
//! [`crate::relay::Delivery`].

use thiserror::Error;

/// Main error type for the pairing core.
#[derive(Debug, Error)]
pub enum PairlinkError {
    // Validation errors
    #[error("Invalid {field} format")]
    InvalidFormat { field: &'static str },

    #[error("Invalid link")]
    EmptyLink,

    #[error("Invalid URL format")]
    InvalidUrl,

    // Session errors
    #[error("Code not found or expired: {code}")]
    NotFound { code: String },

    #[error("Connection is not paired with any code")]
    NotPaired,

    #[error("No unused code found after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },

    // Store errors
    #[error("Session store error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    // Access errors
    #[error("Unauthorized")]
    Unauthorized,

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for pairlink operations.
pub type Result<T> = std::result::Result<T, PairlinkError>;

impl From<reqwest::Error> for PairlinkError {
    fn from(err: reqwest::Error) -> Self {
        PairlinkError::Storage {
            message: if err.is_timeout() {
                "request timed out".to_string()
            } else {
                err.to_string()
            },
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for PairlinkError {
    fn from(err: serde_json::Error) -> Self {
        PairlinkError::Storage {
            message: format!("malformed store response: {}", err),
            source: None,
        }
    }
}

impl PairlinkError {
    /// Create a storage error from a plain message.
    pub fn storage(message: impl Into<String>) -> Self {
        PairlinkError::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Short message safe to hand to remote callers.
    ///
    /// Never includes store endpoints or other internal detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            PairlinkError::InvalidFormat { field: "code" } => "Invalid code format",
            PairlinkError::InvalidFormat { .. } => "Invalid request",
            PairlinkError::EmptyLink => "Invalid link",
            PairlinkError::InvalidUrl => "Invalid URL format",
            PairlinkError::NotFound { .. } => "Code not found or expired",
            PairlinkError::NotPaired => "Not paired. Please enter code again.",
            PairlinkError::Unauthorized => "Unauthorized: Invalid admin password",
            PairlinkError::ExhaustedRetries { .. } => "Failed to generate code",
            PairlinkError::Storage { .. } | PairlinkError::Config { .. } => {
                "Internal server error"
            }
        }
    }

    /// Whether the caller supplied bad input, as opposed to a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PairlinkError::InvalidFormat { .. }
                | PairlinkError::EmptyLink
                | PairlinkError::InvalidUrl
                | PairlinkError::NotFound { .. }
                | PairlinkError::NotPaired
                | PairlinkError::Unauthorized
        )
    }

    /// Whether a store operation failing with this error may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            PairlinkError::Storage {
                source: Some(err), ..
            } => err.is_timeout() || err.is_connect() || err.is_request(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PairlinkError::NotFound {
            code: "ABC123".into(),
        };
        assert_eq!(err.to_string(), "Code not found or expired: ABC123");
        assert_eq!(
            PairlinkError::ExhaustedRetries { attempts: 10 }.to_string(),
            "No unused code found after 10 attempts"
        );
    }

    #[test]
    fn test_public_messages_hide_internals() {
        let err = PairlinkError::storage("POST https://eu1-redis.upstash.io failed");
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(
            PairlinkError::InvalidFormat { field: "code" }.public_message(),
            "Invalid code format"
        );
    }

    #[test]
    fn test_client_errors() {
        assert!(PairlinkError::InvalidUrl.is_client_error());
        assert!(PairlinkError::EmptyLink.is_client_error());
        assert_eq!(PairlinkError::EmptyLink.public_message(), "Invalid link");
        assert!(PairlinkError::Unauthorized.is_client_error());
        assert!(!PairlinkError::storage("down").is_client_error());
        assert!(!PairlinkError::ExhaustedRetries { attempts: 10 }.is_client_error());
    }

    #[test]
    fn test_plain_storage_errors_are_not_retryable() {
        assert!(!PairlinkError::storage("bad response").is_retryable());
        assert!(!PairlinkError::NotPaired.is_retryable());
    }
}

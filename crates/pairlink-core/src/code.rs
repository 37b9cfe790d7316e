//! Pairing code generation and validation.

use crate::config::SessionConfig;
use crate::{PairlinkError, Result};
use rand::Rng;
use serde::Serialize;
use std::fmt;

/// A 6-character `[A-Z0-9]` session identifier.
///
/// Only constructible through [`PairingCode::generate`] or
/// [`PairingCode::parse`], so holding one means the format is valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PairingCode(String);

impl PairingCode {
    /// Generate a random code, uniformly over the code alphabet.
    ///
    /// Uniqueness against live sessions is the caller's concern.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let alphabet = SessionConfig::CODE_ALPHABET;
        let code = (0..SessionConfig::CODE_LENGTH)
            .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
            .collect();
        Self(code)
    }

    /// Parse untrusted input. Lowercase or padded input is rejected.
    pub fn parse(s: &str) -> Result<Self> {
        if is_valid_format(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(PairlinkError::InvalidFormat { field: "code" })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PairingCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// True iff `s` is exactly six characters from `[A-Z0-9]`.
pub fn is_valid_format(s: &str) -> bool {
    s.len() == SessionConfig::CODE_LENGTH
        && s
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

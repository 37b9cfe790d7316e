//! Session data model: connection identities, desktop bindings, store keys.

use crate::code::PairingCode;
use crate::config::SessionConfig;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identity of one live real-time connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ConnectionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Desktop side of a pair record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopBinding {
    /// Created over request/response; no push-capable connection yet.
    Pending,
    /// Attached to a live real-time connection.
    Live(ConnectionId),
}

impl DesktopBinding {
    const PENDING: &'static str = "pending";
    const LIVE_TAG: &'static str = "live:";

    /// Encode for storage in the pair record.
    pub fn encode(&self) -> String {
        match self {
            DesktopBinding::Pending => Self::PENDING.to_string(),
            DesktopBinding::Live(id) => format!("{}{}", Self::LIVE_TAG, id),
        }
    }

    /// Decode a stored pair record value. `None` for anything unrecognised.
    pub fn decode(value: &str) -> Option<Self> {
        if value == Self::PENDING {
            return Some(DesktopBinding::Pending);
        }
        value
            .strip_prefix(Self::LIVE_TAG)
            .and_then(|id| id.parse().ok())
            .map(DesktopBinding::Live)
    }

    /// The live connection, if any.
    pub fn connection(&self) -> Option<ConnectionId> {
        match self {
            DesktopBinding::Pending => None,
            DesktopBinding::Live(id) => Some(*id),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, DesktopBinding::Live(_))
    }
}

/// The three store keys of one pairing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    pub pair: String,
    pub link: String,
    pub mobile: String,
}

impl SessionKeys {
    pub fn for_code(code: &PairingCode) -> Self {
        Self {
            pair: format!("{}{}", SessionConfig::PAIR_PREFIX, code),
            link: format!("{}{}", SessionConfig::LINK_PREFIX, code),
            mobile: format!("{}{}", SessionConfig::MOBILE_PREFIX, code),
        }
    }

    pub fn all(&self) -> [String; 3] {
        [self.pair.clone(), self.link.clone(), self.mobile.clone()]
    }
}

/// Administrative view of one live session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub code: PairingCode,
    /// Seconds until the pair record expires.
    pub ttl_secs: u64,
    pub expires_in_minutes: u64,
    /// Whether the desktop is attached to a real-time connection.
    pub desktop_live: bool,
    pub has_mobile: bool,
    pub link: Option<String>,
}

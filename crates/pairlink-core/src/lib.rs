//! Pairlink Core - pairing session lifecycle for desktop/mobile link relay.
//!
//! A desktop obtains a short code, a mobile enters it, and the mobile then
//! hands a single URL to the desktop. This crate owns everything between
//! those steps: code generation, the TTL-bound session records in a shared
//! store, the in-process connection registry, and best-effort real-time
//! delivery. It has no HTTP or socket layer of its own.
//!
//! # Example
//!
//! ```rust,ignore
//! use pairlink_core::{ChannelRelay, DesktopBinding, MemoryStore, PairingManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> pairlink_core::Result<()> {
//!     let relay = Arc::new(ChannelRelay::new());
//!     let manager = PairingManager::new(Arc::new(MemoryStore::new()), relay.clone());
//!
//!     let session = manager
//!         .obtain_desktop_session(DesktopBinding::Pending, None)
//!         .await?;
//!     let delivery = manager
//!         .submit_link(session.code.as_str(), "https://example.com", None)
//!         .await?;
//!     println!("{} -> {:?}", session.code, delivery);
//!
//!     Ok(())
//! }
//! ```

pub mod code;
pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod registry;
pub mod relay;
pub mod session;
pub mod store;

pub use code::{is_valid_format, PairingCode};
pub use config::{PairingConfig, SessionConfig, StoreConfig};
pub use error::{PairlinkError, Result};
pub use events::{ClientEvent, EventParseError, ServerEvent};
pub use manager::{
    CodeStatus, DesktopSession, Disconnect, LinkDelivery, MobilePairing, PairingManager,
};
pub use registry::{ConnectionRegistry, RegistryCounts};
pub use relay::{ChannelRelay, Delivery, Relay};
pub use session::{ConnectionId, DesktopBinding, SessionKeys, SessionSummary};
pub use store::{MemoryStore, SessionRecords, SessionStore, UpstashStore};

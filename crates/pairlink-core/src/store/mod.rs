//! Session store abstraction.
//!
//! Provides the TTL key-value contract the pairing core relies on, with:
//! - `MemoryStore` for single-process deployments and tests
//! - `UpstashStore` for the shared Upstash Redis REST store
//! - `SessionRecords`, the typed pair/link/mobile view over either backend

mod memory;
mod records;
mod retry;
mod traits;
mod upstash;

pub use memory::MemoryStore;
pub use records::SessionRecords;
pub use retry::{retry_async, RetryConfig};
pub use traits::SessionStore;
pub use upstash::UpstashStore;

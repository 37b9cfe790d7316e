//! Pairlink Server - HTTP and WebSocket surface over `pairlink-core`.
//!
//! Desktops hold a WebSocket open to receive their code and any link sent to
//! it. Mobiles pair and submit links either over the same WebSocket protocol
//! or through the REST fallback under `/api/pairing`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;
pub mod ws;

pub use config::{Args, StoreBackend};
pub use error::ApiError;
pub use server::{create_router, start_server, AppState};

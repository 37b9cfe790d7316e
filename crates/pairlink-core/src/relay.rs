//! Best-effort push delivery to live connections.

use crate::events::ServerEvent;
use crate::session::ConnectionId;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Outcome of a push. Not reaching a connection is an expected result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Unreachable,
}

/// Delivers events to a specific live connection.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Push `event` to `to`. Never retries or queues.
    async fn deliver(&self, to: ConnectionId, event: ServerEvent) -> Delivery;
}

/// Relay backed by one unbounded channel per connection.
///
/// The transport registers a connection, drains the returned receiver into
/// its socket, and unregisters on close.
#[derive(Debug, Default)]
pub struct ChannelRelay {
    outboxes: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>>,
}

impl ChannelRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an outbox for `conn`, replacing any previous one.
    pub async fn register(&self, conn: ConnectionId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outboxes.write().await.insert(conn, tx);
        rx
    }

    pub async fn unregister(&self, conn: ConnectionId) {
        self.outboxes.write().await.remove(&conn);
    }

    pub async fn connection_count(&self) -> usize {
        self.outboxes.read().await.len()
    }
}

#[async_trait]
impl Relay for ChannelRelay {
    async fn deliver(&self, to: ConnectionId, event: ServerEvent) -> Delivery {
        let name = event.name();
        let sent = match self.outboxes.read().await.get(&to) {
            Some(tx) => tx.send(event).is_ok(),
            None => {
                debug!("No outbox for {}, dropping {}", to, name);
                return Delivery::Unreachable;
            }
        };

        if sent {
            debug!("Pushed {} to {}", name, to);
            Delivery::Delivered
        } else {
            // Receiver gone: the socket closed between lookup and send
            debug!("Outbox for {} closed, dropping {}", to, name);
            self.outboxes.write().await.remove(&to);
            Delivery::Unreachable
        }
    }
}

//! In-process index from live connections to the code they are bound to.
//!
//! The registry is a cache over the session store, scoped to the lifetime of
//! one server process. It starts empty on restart; clients re-establish
//! their association through the normal connect flow.

use crate::code::PairingCode;
use crate::session::ConnectionId;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Connection counts, for administrative display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryCounts {
    pub desktops: usize,
    pub mobiles: usize,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    desktop: RwLock<HashMap<ConnectionId, PairingCode>>,
    mobile: RwLock<HashMap<ConnectionId, PairingCode>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn bind_desktop(&self, conn: ConnectionId, code: PairingCode) {
        self.desktop.write().await.insert(conn, code);
    }

    pub async fn desktop_code(&self, conn: ConnectionId) -> Option<PairingCode> {
        self.desktop.read().await.get(&conn).cloned()
    }

    pub async fn unbind_desktop(&self, conn: ConnectionId) -> Option<PairingCode> {
        self.desktop.write().await.remove(&conn)
    }

    /// Bind a mobile connection, returning the code it was previously bound to.
    pub async fn bind_mobile(&self, conn: ConnectionId, code: PairingCode) -> Option<PairingCode> {
        self.mobile.write().await.insert(conn, code)
    }

    pub async fn mobile_code(&self, conn: ConnectionId) -> Option<PairingCode> {
        self.mobile.read().await.get(&conn).cloned()
    }

    pub async fn unbind_mobile(&self, conn: ConnectionId) -> Option<PairingCode> {
        self.mobile.write().await.remove(&conn)
    }

    pub async fn counts(&self) -> RegistryCounts {
        RegistryCounts {
            desktops: self.desktop.read().await.len(),
            mobiles: self.mobile.read().await.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> PairingCode {
        PairingCode::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_desktop_and_mobile_maps_are_independent() {
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::new();

        registry.bind_desktop(conn, code("AAAAAA")).await;
        assert_eq!(registry.desktop_code(conn).await, Some(code("AAAAAA")));
        assert_eq!(registry.mobile_code(conn).await, None);
        assert_eq!(registry.unbind_mobile(conn).await, None);

        assert_eq!(registry.unbind_desktop(conn).await, Some(code("AAAAAA")));
        assert_eq!(registry.desktop_code(conn).await, None);
    }

    #[tokio::test]
    async fn test_rebinding_mobile_returns_previous_code() {
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::new();

        assert_eq!(registry.bind_mobile(conn, code("AAAAAA")).await, None);
        assert_eq!(
            registry.bind_mobile(conn, code("BBBBBB")).await,
            Some(code("AAAAAA"))
        );
        assert_eq!(registry.mobile_code(conn).await, Some(code("BBBBBB")));
        assert_eq!(
            registry.counts().await,
            RegistryCounts {
                desktops: 0,
                mobiles: 1
            }
        );
    }
}

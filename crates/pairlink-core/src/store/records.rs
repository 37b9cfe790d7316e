//! Typed access to the three sub-records of a pairing session.

use super::traits::SessionStore;
use crate::code::PairingCode;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::session::{ConnectionId, DesktopBinding, SessionKeys, SessionSummary};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Session store client: key derivation plus uniform TTL refresh.
#[derive(Clone)]
pub struct SessionRecords {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionRecords {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Create or rebind the pair record at full TTL.
    pub async fn create_pair(&self, code: &PairingCode, binding: DesktopBinding) -> Result<()> {
        let key = SessionKeys::for_code(code).pair;
        self.store
            .set_with_expiry(&key, &binding.encode(), self.ttl)
            .await?;
        debug!("Stored {} (TTL: {}s)", key, self.ttl.as_secs());
        Ok(())
    }

    /// Desktop binding of the session, `None` if the session does not exist.
    pub async fn desktop_binding(&self, code: &PairingCode) -> Result<Option<DesktopBinding>> {
        let key = SessionKeys::for_code(code).pair;
        Ok(self.store.get(&key).await?.map(|value| {
            DesktopBinding::decode(&value).unwrap_or_else(|| {
                warn!("Unrecognised pair record for {}, treating as pending", code);
                DesktopBinding::Pending
            })
        }))
    }

    pub async fn code_exists(&self, code: &PairingCode) -> Result<bool> {
        self.store.exists(&SessionKeys::for_code(code).pair).await
    }

    /// Remaining lifetime of the pair record.
    pub async fn ttl(&self, code: &PairingCode) -> Result<Option<Duration>> {
        self.store.ttl(&SessionKeys::for_code(code).pair).await
    }

    /// Store the link, replacing any previous one.
    pub async fn store_link(&self, code: &PairingCode, link: &str) -> Result<()> {
        self.store
            .set_with_expiry(&SessionKeys::for_code(code).link, link, self.ttl)
            .await
    }

    pub async fn link(&self, code: &PairingCode) -> Result<Option<String>> {
        self.store.get(&SessionKeys::for_code(code).link).await
    }

    pub async fn link_mobile(&self, code: &PairingCode, mobile: ConnectionId) -> Result<()> {
        self.store
            .set_with_expiry(
                &SessionKeys::for_code(code).mobile,
                &mobile.to_string(),
                self.ttl,
            )
            .await
    }

    /// Mobile connection attached to the session.
    ///
    /// A value that is not a connection identifier reads as absent.
    pub async fn mobile(&self, code: &PairingCode) -> Result<Option<ConnectionId>> {
        let value = self.store.get(&SessionKeys::for_code(code).mobile).await?;
        Ok(value.and_then(|v| v.parse().ok()))
    }

    pub async fn remove_mobile(&self, code: &PairingCode) -> Result<u64> {
        self.store
            .delete_many(&[SessionKeys::for_code(code).mobile])
            .await
    }

    /// Delete pair, link and mobile records for the code.
    pub async fn cleanup(&self, code: &PairingCode) -> Result<u64> {
        let deleted = self
            .store
            .delete_many(&SessionKeys::for_code(code).all())
            .await?;
        info!("Cleaned up session {} ({} keys)", code, deleted);
        Ok(deleted)
    }

    /// Summaries of every session whose pair record is still present.
    pub async fn active_sessions(&self) -> Result<Vec<SessionSummary>> {
        let keys = self.store.list_keys(SessionConfig::PAIR_PREFIX).await?;
        let mut sessions = Vec::with_capacity(keys.len());

        for key in keys {
            let Some(code) = key
                .strip_prefix(SessionConfig::PAIR_PREFIX)
                .and_then(|raw| PairingCode::parse(raw).ok())
            else {
                debug!("Skipping foreign key {}", key);
                continue;
            };

            // Listing races with expiry; a session gone by now is skipped.
            let Some(binding) = self.desktop_binding(&code).await? else {
                continue;
            };
            let Some(ttl) = self.ttl(&code).await? else {
                continue;
            };
            let has_mobile = self.mobile(&code).await?.is_some();
            let link = self.link(&code).await?;

            sessions.push(SessionSummary {
                ttl_secs: ttl.as_secs(),
                expires_in_minutes: ttl.as_secs() / 60,
                desktop_live: binding.is_live(),
                has_mobile,
                link,
                code,
            });
        }

        Ok(sessions)
    }

    /// Delete every key in all three namespaces.
    pub async fn reset_all(&self) -> Result<u64> {
        let mut keys = Vec::new();
        for prefix in [
            SessionConfig::PAIR_PREFIX,
            SessionConfig::LINK_PREFIX,
            SessionConfig::MOBILE_PREFIX,
        ] {
            keys.extend(self.store.list_keys(prefix).await?);
        }
        let deleted = self.store.delete_many(&keys).await?;
        info!("Reset all sessions, deleted {} entries", deleted);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn records() -> SessionRecords {
        SessionRecords::new(Arc::new(MemoryStore::new()), SessionConfig::TTL)
    }

    fn code(s: &str) -> PairingCode {
        PairingCode::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_pair_lifecycle() {
        let records = records();
        let c = code("AAA111");
        assert_eq!(records.desktop_binding(&c).await.unwrap(), None);

        records.create_pair(&c, DesktopBinding::Pending).await.unwrap();
        assert!(records.code_exists(&c).await.unwrap());
        assert_eq!(
            records.desktop_binding(&c).await.unwrap(),
            Some(DesktopBinding::Pending)
        );

        let conn = ConnectionId::new();
        records
            .create_pair(&c, DesktopBinding::Live(conn))
            .await
            .unwrap();
        assert_eq!(
            records.desktop_binding(&c).await.unwrap(),
            Some(DesktopBinding::Live(conn))
        );
    }

    #[tokio::test]
    async fn test_cleanup_removes_all_sub_records() {
        let records = records();
        let c = code("BBB222");
        records.create_pair(&c, DesktopBinding::Pending).await.unwrap();
        records.store_link(&c, "https://example.com").await.unwrap();
        records.link_mobile(&c, ConnectionId::new()).await.unwrap();

        assert_eq!(records.cleanup(&c).await.unwrap(), 3);
        assert!(!records.code_exists(&c).await.unwrap());
        assert_eq!(records.link(&c).await.unwrap(), None);
        assert_eq!(records.mobile(&c).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unrecognised_pair_value_reads_as_pending() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_with_expiry("pair:CCC333", "REST-API-PLACEHOLDER", SessionConfig::TTL)
            .await
            .unwrap();
        let records = SessionRecords::new(store, SessionConfig::TTL);
        assert_eq!(
            records.desktop_binding(&code("CCC333")).await.unwrap(),
            Some(DesktopBinding::Pending)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_sessions_and_reset() {
        let records = records();
        let a = code("AAAAAA");
        let b = code("BBBBBB");
        records
            .create_pair(&a, DesktopBinding::Live(ConnectionId::new()))
            .await
            .unwrap();
        records.link_mobile(&a, ConnectionId::new()).await.unwrap();
        records.store_link(&a, "https://a.example").await.unwrap();
        records.create_pair(&b, DesktopBinding::Pending).await.unwrap();
        // orphan link without a pair record is not a session
        records.store_link(&code("CCCCCC"), "https://c.example").await.unwrap();

        let mut sessions = records.active_sessions().await.unwrap();
        sessions.sort_by(|x, y| x.code.as_str().cmp(y.code.as_str()));
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].code, a);
        assert!(sessions[0].desktop_live);
        assert!(sessions[0].has_mobile);
        assert_eq!(sessions[0].link.as_deref(), Some("https://a.example"));
        assert_eq!(sessions[0].expires_in_minutes, 60);
        assert!(!sessions[1].desktop_live);
        assert!(!sessions[1].has_mobile);

        assert_eq!(records.reset_all().await.unwrap(), 5);
        assert!(records.active_sessions().await.unwrap().is_empty());
        assert_eq!(records.reset_all().await.unwrap(), 0);
    }
}

//! Pairing session lifecycle.
//!
//! The session store is the single source of truth and the only
//! synchronization point: no lock is held across store calls, and
//! concurrent operations on one code may interleave. Each key write is
//! atomic at the store, so interleavings never corrupt per-key state.

use crate::code::PairingCode;
use crate::config::PairingConfig;
use crate::events::ServerEvent;
use crate::registry::ConnectionRegistry;
use crate::relay::{Delivery, Relay};
use crate::session::{ConnectionId, DesktopBinding, SessionSummary};
use crate::store::{SessionRecords, SessionStore};
use crate::{PairlinkError, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of associating a desktop with a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopSession {
    pub code: PairingCode,
    /// Link already waiting for this session, pushed on association.
    pub stored_link: Option<String>,
    /// Whether an existing session was reused instead of a new code allocated.
    pub resumed: bool,
}

/// Result of a mobile joining a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobilePairing {
    pub code: PairingCode,
    /// Whether the desktop was told about the join in real time.
    pub desktop_notified: bool,
}

/// Format and existence check result for a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeStatus {
    pub code: PairingCode,
    pub ttl_secs: u64,
    pub expires_in_minutes: u64,
}

/// How a submitted link reached (or will reach) the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDelivery {
    /// Pushed to the desktop's live connection.
    Delivered,
    /// Stored; handed over on the next desktop association.
    StoredOnly,
}

/// What a closed connection turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disconnect {
    /// Desktop gone: the whole session was torn down.
    Desktop { code: PairingCode, removed: u64 },
    /// Mobile gone: the session survives for another mobile.
    Mobile {
        code: PairingCode,
        desktop_notified: bool,
    },
    Unknown,
}

/// Orchestrates session creation, pairing, link submission and cleanup.
pub struct PairingManager {
    records: SessionRecords,
    registry: ConnectionRegistry,
    relay: Arc<dyn Relay>,
    config: PairingConfig,
}

impl PairingManager {
    pub fn new(store: Arc<dyn SessionStore>, relay: Arc<dyn Relay>) -> Self {
        Self::with_config(store, relay, PairingConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn SessionStore>,
        relay: Arc<dyn Relay>,
        config: PairingConfig,
    ) -> Self {
        Self {
            records: SessionRecords::new(store, config.session_ttl),
            registry: ConnectionRegistry::new(),
            relay,
            config,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn records(&self) -> &SessionRecords {
        &self.records
    }

    /// Obtain a code for a desktop, reusing its existing session if any.
    ///
    /// A live desktop already in the registry keeps its code. A live desktop
    /// naming a pending session in `resume` adopts it. Otherwise a fresh code
    /// is allocated. For live desktops the code, and any stored link, are
    /// pushed over the relay.
    pub async fn obtain_desktop_session(
        &self,
        binding: DesktopBinding,
        resume: Option<&str>,
    ) -> Result<DesktopSession> {
        if let DesktopBinding::Live(conn) = binding {
            if let Some(code) = self.registry.desktop_code(conn).await {
                self.records.create_pair(&code, binding).await?;
                info!("Desktop {} reconnected with code {}", conn, code);
                return Ok(self.announce(conn, code, true).await);
            }

            if let Some(code) = self.adoptable(resume).await? {
                self.records.create_pair(&code, binding).await?;
                self.registry.bind_desktop(conn, code.clone()).await;
                info!("Desktop {} adopted pending code {}", conn, code);
                return Ok(self.announce(conn, code, true).await);
            }
        }

        let code = self.allocate_code().await?;
        self.records.create_pair(&code, binding).await?;

        match binding {
            DesktopBinding::Live(conn) => {
                self.registry.bind_desktop(conn, code.clone()).await;
                info!("Desktop {} connected with code {}", conn, code);
                Ok(self.announce(conn, code, false).await)
            }
            DesktopBinding::Pending => {
                info!("Code generated and stored: {}", code);
                Ok(DesktopSession {
                    code,
                    stored_link: None,
                    resumed: false,
                })
            }
        }
    }

    /// Attach a mobile connection to an existing session.
    pub async fn validate_and_link_mobile(
        &self,
        code: &str,
        conn: ConnectionId,
    ) -> Result<MobilePairing> {
        let code = PairingCode::parse(code)?;
        let binding = self.require_session(&code).await?;

        // At most one mobile per code: displace whoever held it before.
        if let Some(previous) = self.records.mobile(&code).await? {
            if previous != conn && self.registry.unbind_mobile(previous).await.is_some() {
                debug!("Mobile {} displaced from {} by {}", previous, code, conn);
            }
        }

        self.records.link_mobile(&code, conn).await?;
        if let Some(old) = self.registry.bind_mobile(conn, code.clone()).await {
            if old != code {
                debug!("Mobile {} moved from {} to {}", conn, old, code);
                self.forget_mobile_record(&old, conn).await;
            }
        }
        info!("Mobile {} paired with code {}", conn, code);

        let desktop_notified = self
            .notify_desktop(
                binding,
                ServerEvent::MobileConnected {
                    code: code.to_string(),
                },
            )
            .await;

        Ok(MobilePairing {
            code,
            desktop_notified,
        })
    }

    /// Check that a code is well-formed and live, without attaching anything.
    pub async fn check_code(&self, code: &str) -> Result<CodeStatus> {
        let code = PairingCode::parse(code)?;
        let ttl = self
            .records
            .ttl(&code)
            .await?
            .ok_or_else(|| PairlinkError::NotFound {
                code: code.to_string(),
            })?;
        Ok(CodeStatus {
            code,
            ttl_secs: ttl.as_secs(),
            expires_in_minutes: ttl.as_secs() / 60,
        })
    }

    /// Store a link for the session and push it to a live desktop.
    pub async fn submit_link(
        &self,
        code: &str,
        link: &str,
        source: Option<ConnectionId>,
    ) -> Result<LinkDelivery> {
        let code = PairingCode::parse(code)?;
        let link = validate_link(link)?;
        let binding = self.require_session(&code).await?;

        self.records.store_link(&code, &link).await?;

        let delivered = self
            .notify_desktop(binding, ServerEvent::DesktopLink { link })
            .await;
        let via = source.map_or_else(|| "request".to_string(), |conn| conn.to_string());

        if delivered {
            info!("Link for {} from {} sent to desktop", code, via);
            Ok(LinkDelivery::Delivered)
        } else {
            info!(
                "Link for {} from {} stored, desktop will receive it when connected",
                code, via
            );
            Ok(LinkDelivery::StoredOnly)
        }
    }

    /// Submit a link on behalf of a paired mobile connection.
    pub async fn submit_link_from_mobile(
        &self,
        conn: ConnectionId,
        link: &str,
    ) -> Result<(PairingCode, LinkDelivery)> {
        let code = self
            .registry
            .mobile_code(conn)
            .await
            .ok_or(PairlinkError::NotPaired)?;
        let delivery = self.submit_link(code.as_str(), link, Some(conn)).await?;
        Ok((code, delivery))
    }

    /// Resolve a closed connection and clean up after it.
    ///
    /// A connection may hold a desktop code and be paired as a mobile with
    /// another code at once; both roles are released.
    pub async fn handle_disconnect(&self, conn: ConnectionId) -> Result<Disconnect> {
        // Release the mobile role first so a desktop cleanup failure cannot
        // leave the registry entry behind.
        let mobile = self.release_mobile(conn).await;

        if let Some(code) = self.registry.unbind_desktop(conn).await {
            let removed = match self.records.desktop_binding(&code).await? {
                Some(DesktopBinding::Live(current)) if current != conn => {
                    debug!("Code {} now held by {}, leaving it", code, current);
                    0
                }
                _ => self.records.cleanup(&code).await?,
            };
            info!("Desktop disconnected, cleaned up code: {}", code);
            return Ok(Disconnect::Desktop { code, removed });
        }

        Ok(match mobile {
            Some((code, desktop_notified)) => Disconnect::Mobile {
                code,
                desktop_notified,
            },
            None => Disconnect::Unknown,
        })
    }

    pub async fn list_active_sessions(&self) -> Result<Vec<SessionSummary>> {
        self.records.active_sessions().await
    }

    /// Delete every session. Operator use only.
    pub async fn reset_all(&self) -> Result<u64> {
        self.records.reset_all().await
    }

    pub async fn code_exists(&self, code: &PairingCode) -> Result<bool> {
        self.records.code_exists(code).await
    }

    pub async fn link(&self, code: &PairingCode) -> Result<Option<String>> {
        self.records.link(code).await
    }

    pub async fn mobile(&self, code: &PairingCode) -> Result<Option<ConnectionId>> {
        self.records.mobile(code).await
    }

    async fn allocate_code(&self) -> Result<PairingCode> {
        for attempt in 1..=self.config.max_code_attempts {
            let code = PairingCode::generate();
            if !self.records.code_exists(&code).await? {
                return Ok(code);
            }
            debug!("Code {} already live (attempt {})", code, attempt);
        }
        warn!(
            "No unused code after {} attempts",
            self.config.max_code_attempts
        );
        Err(PairlinkError::ExhaustedRetries {
            attempts: self.config.max_code_attempts,
        })
    }

    /// A resume claim that names a live-able pending session.
    async fn adoptable(&self, resume: Option<&str>) -> Result<Option<PairingCode>> {
        let Some(code) = resume.and_then(|raw| PairingCode::parse(raw).ok()) else {
            return Ok(None);
        };
        match self.records.desktop_binding(&code).await? {
            Some(DesktopBinding::Pending) => Ok(Some(code)),
            Some(DesktopBinding::Live(_)) => {
                debug!("Resume of {} refused, already held by a live desktop", code);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn require_session(&self, code: &PairingCode) -> Result<DesktopBinding> {
        self.records
            .desktop_binding(code)
            .await?
            .ok_or_else(|| PairlinkError::NotFound {
                code: code.to_string(),
            })
    }

    /// Push the code, then any stored link, to a newly associated desktop.
    async fn announce(
        &self,
        conn: ConnectionId,
        code: PairingCode,
        resumed: bool,
    ) -> DesktopSession {
        self.relay
            .deliver(
                conn,
                ServerEvent::DesktopCode {
                    code: code.to_string(),
                },
            )
            .await;

        let stored_link = match self.records.link(&code).await {
            Ok(link) => link,
            Err(e) => {
                warn!("Could not read stored link for {}: {}", code, e);
                None
            }
        };
        if let Some(link) = &stored_link {
            self.relay
                .deliver(conn, ServerEvent::DesktopLink { link: link.clone() })
                .await;
        }

        DesktopSession {
            code,
            stored_link,
            resumed,
        }
    }

    async fn notify_desktop(&self, binding: DesktopBinding, event: ServerEvent) -> bool {
        match binding.connection() {
            Some(desktop) => self.relay.deliver(desktop, event).await == Delivery::Delivered,
            None => false,
        }
    }

    /// Drop `conn`'s mobile binding and tell its desktop.
    async fn release_mobile(&self, conn: ConnectionId) -> Option<(PairingCode, bool)> {
        let code = self.registry.unbind_mobile(conn).await?;
        self.forget_mobile_record(&code, conn).await;

        let desktop_notified = match self.records.desktop_binding(&code).await {
            Ok(Some(binding)) => {
                self.notify_desktop(
                    binding,
                    ServerEvent::MobileDisconnected {
                        code: code.to_string(),
                    },
                )
                .await
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Could not resolve desktop for {}: {}", code, e);
                false
            }
        };
        info!("Mobile disconnected from code: {}", code);
        Some((code, desktop_notified))
    }

    /// Remove the mobile record only if it still names `conn`.
    async fn forget_mobile_record(&self, code: &PairingCode, conn: ConnectionId) {
        match self.records.mobile(code).await {
            Ok(Some(current)) if current == conn => {
                if let Err(e) = self.records.remove_mobile(code).await {
                    warn!("Failed to remove mobile record for {}: {}", code, e);
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Could not read mobile record for {}: {}", code, e),
        }
    }
}

/// Trim and check that a link is an absolute URL.
fn validate_link(link: &str) -> Result<String> {
    let trimmed = link.trim();
    if trimmed.is_empty() {
        return Err(PairlinkError::EmptyLink);
    }
    url::Url::parse(trimmed).map_err(|_| PairlinkError::InvalidUrl)?;
    Ok(trimmed.to_string())
}

//! Session management on top of the access gate

use pharma_common::{Error, Result, SessionToken, SharedClock};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::GateConfig;
use crate::fingerprint::DeviceProfile;
use crate::gate::{AccessDecision, AccessGate, GateStatus};
use crate::ip_lookup::{lookup_or_unknown, IpLookup};
use crate::session::Session;
use crate::store::CredentialStore;

/// Generate a random session token: SHA-256 over 32 random bytes
pub fn generate_session_token() -> SessionToken {
    let mut random = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random);

    let digest = Sha256::digest(random);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    SessionToken::new(bytes)
}

/// Owns the access gate and the current session
pub struct SessionManager {
    config: Arc<GateConfig>,
    clock: SharedClock,
    gate: Mutex<AccessGate>,
    store: Arc<dyn CredentialStore>,
    ip_lookup: Arc<dyn IpLookup>,
    device: DeviceProfile,
    current: Mutex<Option<Session>>,
}

impl SessionManager {
    pub fn new(
        config: Arc<GateConfig>,
        clock: SharedClock,
        store: Arc<dyn CredentialStore>,
        ip_lookup: Arc<dyn IpLookup>,
        device: DeviceProfile,
    ) -> Self {
        let gate = AccessGate::new(Arc::clone(&config), Arc::clone(&clock));
        Self {
            config,
            clock,
            gate: Mutex::new(gate),
            store,
            ip_lookup,
            device,
            current: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// See [`AccessGate::verify_access`]
    pub async fn verify_access(&self, address: &str) -> Result<AccessDecision> {
        self.gate.lock().await.verify_access(address)
    }

    pub async fn gate_status(&self) -> GateStatus {
        self.gate.lock().await.status()
    }

    /// Build, persist and activate a session for a connected wallet
    ///
    /// The IP lookup is best effort and never fails session creation.
    pub async fn create_session(
        &self,
        address: &str,
        public_key: &str,
        network: &str,
    ) -> Result<Session> {
        let session_token = generate_session_token();
        let device_id = self.device.fingerprint();
        let ip_address = lookup_or_unknown(self.ip_lookup.as_ref()).await;
        let now = self.clock.now();

        let session = Session {
            address: address.to_string(),
            public_key: public_key.to_string(),
            permissions: self.config.session_permissions(),
            network: network.to_string(),
            timestamp: now,
            security_level: self.config.required_security_level,
            last_activity_timestamp: now,
            device_id,
            ip_address,
            session_token,
        };

        self.store.save(&session).await?;
        *self.current.lock().await = Some(session.clone());

        info!(
            "Session created for {} on {} (ip: {})",
            pharma_common::address::shorten(address),
            network,
            session.ip_address
        );
        Ok(session)
    }

    /// Whether a session is usable right now
    ///
    /// Requires the credential to be unexpired, the session to be within the
    /// idle timeout, and the gate not to be locked out.
    pub async fn is_session_valid(&self, session: &Session) -> bool {
        let now = self.clock.now();

        if now >= self.config.credential_expiry {
            return false;
        }

        if session.is_idle(now, self.config.session_timeout) {
            return false;
        }

        !self.gate.lock().await.is_locked_out()
    }

    /// Drop the current session and its persisted record
    ///
    /// Safe to call when nothing is connected. When the record cannot be
    /// cleared the session stays current, so a later call can retry.
    pub async fn invalidate_session(&self) -> Result<()> {
        let mut current = self.current.lock().await;
        self.store.clear().await?;
        let previous = current.take();
        drop(current);

        match previous {
            Some(session) => info!(
                "Session invalidated for {}",
                pharma_common::address::shorten(&session.address)
            ),
            None => debug!("No session to invalidate"),
        }
        Ok(())
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.current.lock().await.clone()
    }

    /// Return the active session after recording activity on it
    ///
    /// # Returns
    /// * `Err(Error::NotConnected)` - no session
    /// * `Err(Error::SessionExpired)` - the session was no longer valid; it
    ///   has been invalidated
    pub async fn require_active_session(&self) -> Result<Session> {
        let session = self.current_session().await.ok_or(Error::NotConnected)?;

        if !self.is_session_valid(&session).await {
            warn!(
                "Session for {} is no longer valid",
                pharma_common::address::shorten(&session.address)
            );
            self.invalidate_session().await?;
            return Err(Error::SessionExpired);
        }

        self.touch_session().await
    }

    /// Record user activity on the current session
    pub async fn touch_session(&self) -> Result<Session> {
        let mut current = self.current.lock().await;
        let session = current.as_mut().ok_or(Error::NotConnected)?;

        session.touch(self.clock.now());
        self.store.save(session).await?;
        Ok(session.clone())
    }

    /// Whether the current session has passed the idle timeout
    pub async fn is_idle_expired(&self) -> bool {
        let now = self.clock.now();
        self.current
            .lock()
            .await
            .as_ref()
            .map(|s| s.is_idle(now, self.config.session_timeout))
            .unwrap_or(false)
    }

    /// Reload the persisted session from a previous run
    ///
    /// Records older than the persisted-session lifetime, or that fail to
    /// parse, are removed and nothing is restored.
    pub async fn restore_session(&self) -> Result<Option<Session>> {
        let session = match self.store.load().await {
            Ok(Some(session)) => session,
            Ok(None) => return Ok(None),
            Err(Error::JsonSerialization(e)) => {
                warn!("Discarding unreadable session record: {}", e);
                self.store.clear().await?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let now = self.clock.now();
        if session.is_older_than(now, self.config.persisted_session_ttl) {
            info!(
                "Discarding stale session for {} created at {}",
                pharma_common::address::shorten(&session.address),
                session.timestamp
            );
            self.store.clear().await?;
            return Ok(None);
        }

        *self.current.lock().await = Some(session.clone());
        info!(
            "Restored session for {}",
            pharma_common::address::shorten(&session.address)
        );
        Ok(Some(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip_lookup::StaticIpLookup;
    use crate::store::MemoryCredentialStore;
    use chrono::{Duration, TimeZone, Utc};
    use async_trait::async_trait;
    use pharma_common::{Clock, ManualClock};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory store whose `clear` can be made to fail
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryCredentialStore,
        fail_clear: AtomicBool,
    }

    #[async_trait]
    impl CredentialStore for FlakyStore {
        async fn save(&self, session: &Session) -> Result<()> {
            self.inner.save(session).await
        }

        async fn load(&self) -> Result<Option<Session>> {
            self.inner.load().await
        }

        async fn clear(&self) -> Result<()> {
            if self.fail_clear.load(Ordering::SeqCst) {
                return Err(Error::Storage("connection refused".to_string()));
            }
            self.inner.clear().await
        }
    }

    const ADMIN: &str = "0x19d3828d73b632f813cdc5c3ef2823268b7001011992a003cb0ca02916a2021b";

    struct Fixture {
        manager: SessionManager,
        clock: ManualClock,
        store: Arc<MemoryCredentialStore>,
    }

    fn fixture() -> Fixture {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
        let config = GateConfig {
            credential_expiry: clock.now() + Duration::days(365),
            ..GateConfig::default()
        };
        let store = Arc::new(MemoryCredentialStore::new());
        let manager = SessionManager::new(
            Arc::new(config),
            Arc::new(clock.clone()),
            store.clone(),
            Arc::new(StaticIpLookup("198.51.100.4".to_string())),
            DeviceProfile::detect(),
        );
        Fixture {
            manager,
            clock,
            store,
        }
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
        assert_eq!(a.to_hex().len(), 64);
    }

    #[tokio::test]
    async fn test_create_session_fields() {
        let f = fixture();
        let session = f.manager.create_session(ADMIN, "0xpub", "testnet").await.unwrap();

        assert_eq!(session.address, ADMIN);
        assert_eq!(session.network, "testnet");
        assert_eq!(session.ip_address, "198.51.100.4");
        assert_eq!(session.device_id.len(), 64);
        assert_eq!(session.timestamp, f.clock.now());
        assert_eq!(session.last_activity_timestamp, f.clock.now());
        assert!(session.has_permission("sign_transaction"));
        assert!(session.has_permission("MANAGE_SUPPLY_CHAIN"));

        // Persisted and active
        assert_eq!(f.store.load().await.unwrap(), Some(session.clone()));
        assert_eq!(f.manager.current_session().await, Some(session));
    }

    #[tokio::test]
    async fn test_session_validity_idle_timeout() {
        let f = fixture();
        let session = f.manager.create_session(ADMIN, "0xpub", "testnet").await.unwrap();
        assert!(f.manager.is_session_valid(&session).await);

        f.clock.advance(Duration::minutes(30));
        assert!(f.manager.is_session_valid(&session).await);

        f.clock.advance(Duration::seconds(1));
        assert!(!f.manager.is_session_valid(&session).await);
        assert!(f.manager.is_idle_expired().await);
    }

    #[tokio::test]
    async fn test_session_invalid_while_locked_out() {
        let f = fixture();
        let session = f.manager.create_session(ADMIN, "0xpub", "testnet").await.unwrap();

        for _ in 0..3 {
            f.manager.verify_access("0xbad").await.unwrap();
        }
        assert!(!f.manager.is_session_valid(&session).await);
    }

    #[tokio::test]
    async fn test_require_active_session_touches() {
        let f = fixture();
        f.manager.create_session(ADMIN, "0xpub", "testnet").await.unwrap();

        f.clock.advance(Duration::minutes(20));
        let session = f.manager.require_active_session().await.unwrap();
        assert_eq!(session.last_activity_timestamp, f.clock.now());

        // Activity pushed the idle deadline forward
        f.clock.advance(Duration::minutes(20));
        assert!(f.manager.require_active_session().await.is_ok());
    }

    #[tokio::test]
    async fn test_require_active_session_expired() {
        let f = fixture();
        f.manager.create_session(ADMIN, "0xpub", "testnet").await.unwrap();

        f.clock.advance(Duration::minutes(31));
        assert!(matches!(
            f.manager.require_active_session().await,
            Err(Error::SessionExpired)
        ));
        assert!(f.manager.current_session().await.is_none());
        assert!(f.store.load().await.unwrap().is_none());

        assert!(matches!(
            f.manager.require_active_session().await,
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let f = fixture();
        f.manager.create_session(ADMIN, "0xpub", "testnet").await.unwrap();

        f.manager.invalidate_session().await.unwrap();
        f.manager.invalidate_session().await.unwrap();
        assert!(f.manager.current_session().await.is_none());
        assert!(f.store.raw().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_clear_keeps_session_for_retry() {
        let f = fixture();
        let store = Arc::new(FlakyStore::default());
        let manager = SessionManager::new(
            Arc::new(f.manager.config().clone()),
            Arc::new(f.clock.clone()),
            store.clone(),
            Arc::new(StaticIpLookup("198.51.100.4".to_string())),
            DeviceProfile::detect(),
        );
        manager.create_session(ADMIN, "0xpub", "testnet").await.unwrap();

        store.fail_clear.store(true, Ordering::SeqCst);
        assert!(matches!(
            manager.invalidate_session().await,
            Err(Error::Storage(_))
        ));
        assert!(manager.current_session().await.is_some());
        assert!(store.load().await.unwrap().is_some());

        // Idle check still sees the session, so the watcher retries
        f.clock.advance(Duration::minutes(31));
        assert!(manager.is_idle_expired().await);

        store.fail_clear.store(false, Ordering::SeqCst);
        manager.invalidate_session().await.unwrap();
        assert!(manager.current_session().await.is_none());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_recent_session() {
        let f = fixture();
        let created = f.manager.create_session(ADMIN, "0xpub", "testnet").await.unwrap();

        let restarted = SessionManager::new(
            Arc::new(f.manager.config().clone()),
            Arc::new(f.clock.clone()),
            f.store.clone(),
            Arc::new(StaticIpLookup("198.51.100.4".to_string())),
            DeviceProfile::detect(),
        );
        f.clock.advance(Duration::hours(23));

        let restored = restarted.restore_session().await.unwrap().unwrap();
        assert_eq!(restored.session_token, created.session_token);
        assert_eq!(restarted.current_session().await, Some(restored));
    }

    #[tokio::test]
    async fn test_restore_discards_stale_session() {
        let f = fixture();
        f.manager.create_session(ADMIN, "0xpub", "testnet").await.unwrap();

        f.clock.advance(Duration::hours(24));
        assert!(f.manager.restore_session().await.unwrap().is_none());
        assert!(f.store.raw().await.is_none());
    }

    #[tokio::test]
    async fn test_restore_discards_malformed_record() {
        let f = fixture();
        f.store.put_raw("{\"address\": 42}").await;

        assert!(f.manager.restore_session().await.unwrap().is_none());
        assert!(f.store.raw().await.is_none());
    }
}

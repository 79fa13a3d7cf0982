//! Persisted session record
//!
//! A single JSON record of the last connected session, stored under a fixed
//! key. Redis holds it with a TTL matching the persisted-session lifetime;
//! the in-memory store is used when no Redis URL is configured.

use async_trait::async_trait;
use pharma_common::{Error, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::session::Session;

/// Key of the persisted session record
pub const CREDENTIALS_KEY: &str = "walletCredentials";

/// Storage for the last connected session
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Replace the stored record
    async fn save(&self, session: &Session) -> Result<()>;

    /// Load the stored record; a record that fails to parse is an error
    async fn load(&self) -> Result<Option<Session>>;

    /// Remove the stored record; succeeds when nothing is stored
    async fn clear(&self) -> Result<()>;
}

/// Process-local store
#[derive(Default)]
pub struct MemoryCredentialStore {
    record: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw JSON as-is, bypassing serialization
    pub async fn put_raw(&self, json: impl Into<String>) {
        *self.record.lock().await = Some(json.into());
    }

    pub async fn raw(&self) -> Option<String> {
        self.record.lock().await.clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session)?;
        *self.record.lock().await = Some(json);
        Ok(())
    }

    async fn load(&self) -> Result<Option<Session>> {
        match self.record.lock().await.as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    async fn clear(&self) -> Result<()> {
        *self.record.lock().await = None;
        Ok(())
    }
}

/// Redis-backed store
pub struct RedisCredentialStore {
    conn: ConnectionManager,
    ttl_secs: u64,
}

impl RedisCredentialStore {
    /// Connect to Redis
    ///
    /// # Arguments
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `ttl_secs` - Expiry applied to the record on every save
    pub async fn new(redis_url: &str, ttl_secs: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| Error::Storage(e.to_string()))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        info!("Connected to Redis at {}", redis_url);

        Ok(Self { conn, ttl_secs })
    }
}

#[async_trait]
impl CredentialStore for RedisCredentialStore {
    async fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session)?;
        let mut conn = self.conn.clone();

        let _: () = redis::cmd("SET")
            .arg(CREDENTIALS_KEY)
            .arg(json)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        debug!("Saved session record for {}", session.address);
        Ok(())
    }

    async fn load(&self) -> Result<Option<Session>> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn
            .get(CREDENTIALS_KEY)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        match json {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(CREDENTIALS_KEY)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }
}

//! Session/credential record for a connected wallet

use chrono::{DateTime, Duration, Utc};
use pharma_common::SessionToken;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Security level requested for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    High,
    Medium,
    Low,
}

impl FromStr for SecurityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(SecurityLevel::High),
            "medium" => Ok(SecurityLevel::Medium),
            "low" => Ok(SecurityLevel::Low),
            other => Err(format!("unknown security level: {}", other)),
        }
    }
}

/// A connected wallet session
///
/// Serialized in camelCase with millisecond timestamps; this is also the
/// layout of the persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub address: String,

    pub public_key: String,

    pub permissions: Vec<String>,

    pub network: String,

    /// When the session was created
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    pub security_level: SecurityLevel,

    /// Last user action on this session
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_activity_timestamp: DateTime<Utc>,

    /// SHA-256 device fingerprint (hex)
    pub device_id: String,

    /// Public IP at connect time, or `"unknown"`
    pub ip_address: String,

    pub session_token: SessionToken,
}

impl Session {
    /// Whether the session has been idle for longer than `timeout`
    pub fn is_idle(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_activity_timestamp > timeout
    }

    /// Whether the session is older than `ttl`
    pub fn is_older_than(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.timestamp >= ttl
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_timestamp = now;
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

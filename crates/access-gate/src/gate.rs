//! Admin authorization with failed-attempt lockout

use chrono::{DateTime, Utc};
use pharma_common::{address::shorten, Error, Result, SharedClock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::GateConfig;

/// Level of access granted to a wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Admin,
    User,
    None,
}

/// Outcome of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub authorized: bool,
    pub level: AccessLevel,
}

impl AccessDecision {
    fn denied() -> Self {
        Self {
            authorized: false,
            level: AccessLevel::None,
        }
    }

    fn admin() -> Self {
        Self {
            authorized: true,
            level: AccessLevel::Admin,
        }
    }
}

/// Lockout bookkeeping, as reported to operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStatus {
    pub failed_attempts: u32,
    pub last_login_timestamp: Option<DateTime<Utc>>,
    /// Set while access checks are being refused
    pub locked_until: Option<DateTime<Utc>>,
}

/// Access gate for the configured admin credential
pub struct AccessGate {
    config: Arc<GateConfig>,
    clock: SharedClock,
    failed_attempts: u32,
    last_login_timestamp: Option<DateTime<Utc>>,
}

impl AccessGate {
    pub fn new(config: Arc<GateConfig>, clock: SharedClock) -> Self {
        Self {
            config,
            clock,
            failed_attempts: 0,
            last_login_timestamp: None,
        }
    }

    /// Decide whether `address` may act as administrator
    ///
    /// # Returns
    /// * `Ok(decision)` - `authorized` with `Admin` level, or denied
    /// * `Err(Error::LockedOut)` - too many failed attempts; refused until
    ///   the lockout window since the last attempt has elapsed
    pub fn verify_access(&mut self, address: &str) -> Result<AccessDecision> {
        let now = self.clock.now();

        if self.failed_attempts >= self.config.max_retries {
            if let Some(until) = self.locked_until(now) {
                warn!(
                    "Access check for {} refused: locked until {}",
                    shorten(address),
                    until
                );
                return Err(Error::LockedOut { until });
            }
            // Lockout window elapsed
            self.failed_attempts = 0;
        }

        if !address.eq_ignore_ascii_case(self.config.authorized_address.trim()) {
            self.failed_attempts += 1;
            self.last_login_timestamp = Some(now);
            warn!(
                "Unauthorized wallet {} (attempt {}/{})",
                shorten(address),
                self.failed_attempts,
                self.config.max_retries
            );
            return Ok(AccessDecision::denied());
        }

        let not_expired = now < self.config.credential_expiry;
        let has_role = self.config.has_role(&self.config.required_role);

        if not_expired && has_role {
            self.failed_attempts = 0;
            self.last_login_timestamp = Some(now);
            info!(
                "Secure wallet access granted: {} (roles: {})",
                shorten(address),
                self.config.roles.join(", ")
            );
            return Ok(AccessDecision::admin());
        }

        warn!(
            "Wallet {} matched but credential is {}",
            shorten(address),
            if not_expired { "missing the required role" } else { "expired" }
        );
        Ok(AccessDecision::denied())
    }

    /// Whether access checks are currently refused
    pub fn is_locked_out(&self) -> bool {
        self.failed_attempts >= self.config.max_retries
            && self.locked_until(self.clock.now()).is_some()
    }

    pub fn status(&self) -> GateStatus {
        let locked_until = if self.failed_attempts >= self.config.max_retries {
            self.locked_until(self.clock.now())
        } else {
            None
        };

        GateStatus {
            failed_attempts: self.failed_attempts,
            last_login_timestamp: self.last_login_timestamp,
            locked_until,
        }
    }

    /// End of the lockout window, if `now` falls inside it
    fn locked_until(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let last = self.last_login_timestamp?;
        let until = last + self.config.lockout_duration;
        (now < until).then_some(until)
    }
}

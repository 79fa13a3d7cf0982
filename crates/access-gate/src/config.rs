//! Access policy and credential configuration
//!
//! Loaded once from environment variables and shared by the gate and the
//! session manager.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::env;

use crate::session::SecurityLevel;

/// Address allowed to administer the dashboard when none is configured
pub const DEFAULT_AUTHORIZED_ADDRESS: &str =
    "0x19d3828d73b632f813cdc5c3ef2823268b7001011992a003cb0ca02916a2021b";

/// Access policy configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// The one wallet address granted admin access
    pub authorized_address: String,

    /// Roles held by the authorized credential
    pub roles: Vec<String>,

    /// Role required for admin access
    pub required_role: String,

    /// Permissions granted by the credential
    pub permissions: Vec<String>,

    /// Permissions the dashboard requests from the wallet
    pub dapp_permissions: Vec<String>,

    /// Security level stamped on new sessions
    pub required_security_level: SecurityLevel,

    /// Failed attempts before lockout
    pub max_retries: u32,

    /// How long a lockout lasts, measured from the last failed attempt
    pub lockout_duration: Duration,

    /// Idle time after which a session is no longer usable
    pub session_timeout: Duration,

    /// How often the idle check runs
    pub session_check_interval: std::time::Duration,

    /// After this instant the credential grants nothing
    pub credential_expiry: DateTime<Utc>,

    /// Persisted sessions older than this are discarded on restore
    pub persisted_session_ttl: Duration,

    /// Endpoint returning `{"ip": "..."}`
    pub ip_lookup_url: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            authorized_address: DEFAULT_AUTHORIZED_ADDRESS.to_string(),
            roles: vec!["ADMIN".to_string(), "MANUFACTURER".to_string()],
            required_role: "ADMIN".to_string(),
            permissions: vec![
                "EXECUTE_TRANSACTIONS".to_string(),
                "VIEW_BALANCE".to_string(),
                "MANAGE_SUPPLY_CHAIN".to_string(),
                "ADMIN_ACCESS".to_string(),
            ],
            dapp_permissions: vec![
                "view_account".to_string(),
                "sign_transaction".to_string(),
                "sign_message".to_string(),
                "view_balance".to_string(),
            ],
            required_security_level: SecurityLevel::High,
            max_retries: 3,
            lockout_duration: Duration::minutes(15),
            session_timeout: Duration::minutes(30),
            session_check_interval: std::time::Duration::from_secs(60),
            credential_expiry: Utc::now() + Duration::days(365),
            persisted_session_ttl: Duration::hours(24),
            ip_lookup_url: "https://api.ipify.org?format=json".to_string(),
        }
    }
}

impl GateConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = GateConfig {
            authorized_address: env::var("AUTHORIZED_WALLET_ADDRESS")
                .unwrap_or(defaults.authorized_address),

            roles: env::var("WALLET_ROLES")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.roles),

            max_retries: env::var("MAX_LOGIN_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("Invalid MAX_LOGIN_RETRIES")?,

            lockout_duration: seconds_from_env("LOCKOUT_DURATION_SECS", "900")?,

            session_timeout: seconds_from_env("SESSION_TIMEOUT_SECS", "1800")?,

            session_check_interval: std::time::Duration::from_secs(
                env::var("SESSION_CHECK_INTERVAL_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .context("Invalid SESSION_CHECK_INTERVAL_SECS")?,
            ),

            credential_expiry: credential_expiry_after(
                Utc::now(),
                env::var("CREDENTIAL_EXPIRY_DAYS")
                    .unwrap_or_else(|_| "365".to_string())
                    .parse()
                    .context("Invalid CREDENTIAL_EXPIRY_DAYS")?,
            )?,

            ip_lookup_url: env::var("IP_LOOKUP_URL").unwrap_or(defaults.ip_lookup_url),

            ..defaults
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if pharma_common::Address::parse(&self.authorized_address).is_err() {
            anyhow::bail!(
                "AUTHORIZED_WALLET_ADDRESS is not a valid address: {}",
                self.authorized_address
            );
        }

        if self.max_retries == 0 {
            anyhow::bail!("MAX_LOGIN_RETRIES must be greater than 0");
        }

        if self.session_timeout <= Duration::zero() {
            anyhow::bail!("SESSION_TIMEOUT_SECS must be greater than 0");
        }

        if self.lockout_duration <= Duration::zero() {
            anyhow::bail!("LOCKOUT_DURATION_SECS must be greater than 0");
        }

        if self.persisted_session_ttl <= Duration::zero() {
            anyhow::bail!("Persisted session lifetime must be greater than 0");
        }

        if self.session_check_interval.is_zero() {
            anyhow::bail!("SESSION_CHECK_INTERVAL_SECS must be greater than 0");
        }

        Ok(())
    }

    /// Whether the credential holds `role`
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Permissions granted to a new session: requested first, then credential
    pub fn session_permissions(&self) -> Vec<String> {
        self.dapp_permissions
            .iter()
            .chain(self.permissions.iter())
            .cloned()
            .collect()
    }
}

fn seconds_from_env(name: &str, default: &str) -> Result<Duration> {
    let secs: i64 = env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("Invalid {}", name))?;

    Duration::try_seconds(secs).with_context(|| format!("{} is out of range: {}", name, secs))
}

fn credential_expiry_after(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|d| now.checked_add_signed(d))
        .with_context(|| format!("CREDENTIAL_EXPIRY_DAYS is out of range: {}", days))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GateConfig::default();
        config.validate().unwrap();

        assert_eq!(config.max_retries, 3);
        assert_eq!(config.lockout_duration, Duration::minutes(15));
        assert_eq!(config.session_timeout, Duration::minutes(30));
        assert!(config.has_role("ADMIN"));
        assert!(!config.has_role("PHARMACY"));
    }

    #[test]
    fn test_session_permissions_order() {
        let config = GateConfig::default();
        let permissions = config.session_permissions();

        assert_eq!(permissions.len(), 8);
        assert_eq!(permissions[0], "view_account");
        assert_eq!(permissions[4], "EXECUTE_TRANSACTIONS");
    }

    #[test]
    fn test_invalid_address_rejected() {
        let config = GateConfig {
            authorized_address: "admin".to_string(),
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_retries_rejected() {
        let config = GateConfig {
            max_retries: 0,
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_lockout_rejected() {
        let config = GateConfig {
            lockout_duration: Duration::seconds(-1),
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GateConfig {
            lockout_duration: Duration::zero(),
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_persisted_ttl_rejected() {
        let config = GateConfig {
            persisted_session_ttl: Duration::zero(),
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credential_expiry_out_of_range() {
        let now = Utc::now();
        assert_eq!(
            credential_expiry_after(now, 30).unwrap(),
            now + Duration::days(30)
        );
        assert!(credential_expiry_after(now, i64::MAX).is_err());
        assert!(credential_expiry_after(now, 1_000_000_000).is_err());
    }

    #[test]
    fn test_seconds_from_env_out_of_range() {
        std::env::set_var("PHARMA_TEST_HUGE_SECS", i64::MAX.to_string());
        assert!(seconds_from_env("PHARMA_TEST_HUGE_SECS", "1").is_err());

        std::env::set_var("PHARMA_TEST_LOCKOUT_SECS", "900");
        assert_eq!(
            seconds_from_env("PHARMA_TEST_LOCKOUT_SECS", "1").unwrap(),
            Duration::minutes(15)
        );

        assert_eq!(
            seconds_from_env("PHARMA_TEST_UNSET_SECS", "60").unwrap(),
            Duration::minutes(1)
        );
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("ADMIN, MANUFACTURER,,"), vec!["ADMIN", "MANUFACTURER"]);
        assert!(split_list("").is_empty());
    }
}

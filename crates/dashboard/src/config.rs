//! Configuration management for the dashboard service
//!
//! Loads configuration from environment variables with sensible defaults.

use access_gate::GateConfig;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Address of the deployed `supply_chain` module
pub const DEFAULT_CONTRACT_ADDRESS: &str =
    "0x2c599a0825f51f62c54da3f56a623568d91437bf084e63daf2204a0d63800584";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// Contract address used to build entry-function names
    pub contract_address: String,

    /// Wallet provider requested on connect
    pub wallet_provider: String,

    /// How long to wait for the user to approve a wallet connection
    pub wallet_connect_timeout: Duration,

    /// Account the mock wallet connects as
    pub mock_wallet_address: String,

    /// Redis URL for the persisted session; in-memory when unset
    pub redis_url: Option<String>,

    /// Access policy
    pub gate: GateConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let gate = GateConfig::from_env().context("Failed to load access policy")?;

        let config = Config {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid API_PORT")?,

            contract_address: env::var("CONTRACT_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_CONTRACT_ADDRESS.to_string()),

            wallet_provider: env::var("WALLET_PROVIDER").unwrap_or_else(|_| "petra".to_string()),

            wallet_connect_timeout: Duration::from_secs(
                env::var("WALLET_CONNECT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("Invalid WALLET_CONNECT_TIMEOUT_SECS")?,
            ),

            // Defaults to the authorized admin so mock mode can connect
            mock_wallet_address: env::var("MOCK_WALLET_ADDRESS")
                .unwrap_or_else(|_| gate.authorized_address.clone()),

            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),

            gate,
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API_PORT must be greater than 0");
        }

        if pharma_common::Address::parse(&self.contract_address).is_err() {
            anyhow::bail!(
                "CONTRACT_ADDRESS is not a valid address: {}",
                self.contract_address
            );
        }

        if self.wallet_provider.trim().is_empty() {
            anyhow::bail!("WALLET_PROVIDER must not be empty");
        }

        if self.wallet_connect_timeout.is_zero() {
            anyhow::bail!("WALLET_CONNECT_TIMEOUT_SECS must be greater than 0");
        }

        self.gate.validate()
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        let gate = GateConfig::default();
        Self {
            api_host: "127.0.0.1".to_string(),
            api_port: 8080,
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            wallet_provider: "petra".to_string(),
            wallet_connect_timeout: Duration::from_secs(30),
            mock_wallet_address: gate.authorized_address.clone(),
            redis_url: None,
            gate,
        }
    }
}

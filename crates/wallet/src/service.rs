use async_trait::async_trait;
use pharma_common::WalletError;
use serde::{Deserialize, Serialize};

use crate::payload::TransactionPayload;

/// Account exposed by the wallet after a successful connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub address: String,
    pub public_key: String,
    pub network: String,
}

/// Result of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub hash: String,
}

/// External wallet holding the user's keys
#[async_trait]
pub trait WalletService: Send + Sync {
    /// Ask the named wallet provider for an account
    async fn connect(&self, provider: &str) -> Result<WalletAccount, WalletError>;

    /// Sign and submit a transaction, resolving once it is accepted
    async fn sign_and_submit(
        &self,
        payload: &TransactionPayload,
    ) -> Result<TransactionReceipt, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Whether an account is currently connected
    async fn is_connected(&self) -> bool;
}

//! Mock wallet for development and testing
//!
//! Simulates a browser wallet extension without any keys or network access.
//! Failures can be scripted to exercise the error paths.

use async_trait::async_trait;
use pharma_common::WalletError;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::payload::TransactionPayload;
use crate::service::{TransactionReceipt, WalletAccount, WalletService};

/// Mock wallet client
pub struct MockWallet {
    /// Account returned on connect
    account: WalletAccount,

    /// Whether the extension is "installed"
    installed: bool,

    /// Simulated confirmation delay for each transaction
    latency: Duration,

    /// Time the simulated user takes to approve a connection
    approval_delay: Duration,

    connected: Mutex<bool>,

    /// Errors returned by upcoming `connect` calls, in order
    connect_failures: Mutex<VecDeque<WalletError>>,

    /// Errors returned by upcoming `sign_and_submit` calls, in order
    submit_failures: Mutex<VecDeque<WalletError>>,

    /// Every payload that was accepted
    submitted: Mutex<Vec<TransactionPayload>>,

    tx_counter: AtomicU64,
}

impl MockWallet {
    /// Create a mock wallet that connects as `address`
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        let public_key = format!("0x{}", hex::encode(Sha256::digest(address.as_bytes())));

        Self {
            account: WalletAccount {
                address,
                public_key,
                network: "testnet".to_string(),
            },
            installed: true,
            latency: Duration::ZERO,
            approval_delay: Duration::ZERO,
            connected: Mutex::new(false),
            connect_failures: Mutex::new(VecDeque::new()),
            submit_failures: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            tx_counter: AtomicU64::new(0),
        }
    }

    /// Simulate a wallet that was never installed
    pub fn not_installed(mut self) -> Self {
        self.installed = false;
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.account.network = network.into();
        self
    }

    /// Delay each transaction by `latency` before it resolves
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Delay each `connect` by `delay` before it resolves
    pub fn with_approval_delay(mut self, delay: Duration) -> Self {
        self.approval_delay = delay;
        self
    }

    /// Make the next `connect` call fail with `error`
    pub async fn fail_next_connect(&self, error: WalletError) {
        self.connect_failures.lock().await.push_back(error);
    }

    /// Make the next `sign_and_submit` call fail with `error`
    pub async fn fail_next_submit(&self, error: WalletError) {
        self.submit_failures.lock().await.push_back(error);
    }

    /// Payloads accepted so far
    pub async fn submitted(&self) -> Vec<TransactionPayload> {
        self.submitted.lock().await.clone()
    }

    pub fn account(&self) -> &WalletAccount {
        &self.account
    }

    /// Deterministic transaction hash derived from the payload and a counter
    fn transaction_hash(&self, payload: &TransactionPayload, sequence: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload.function.as_bytes());
        for arg in &payload.arguments {
            hasher.update(b"|");
            hasher.update(arg.as_bytes());
        }
        hasher.update(sequence.to_le_bytes());
        format!("0x{}", hex::encode(hasher.finalize()))
    }
}

#[async_trait]
impl WalletService for MockWallet {
    async fn connect(&self, provider: &str) -> Result<WalletAccount, WalletError> {
        if !self.installed {
            return Err(WalletError::NotInstalled);
        }

        if let Some(err) = self.connect_failures.lock().await.pop_front() {
            debug!("Mock wallet: connect({}) -> {}", provider, err);
            return Err(err);
        }

        if !self.approval_delay.is_zero() {
            tokio::time::sleep(self.approval_delay).await;
        }

        *self.connected.lock().await = true;
        debug!("Mock wallet: connect({}) -> {}", provider, self.account.address);
        Ok(self.account.clone())
    }

    async fn sign_and_submit(
        &self,
        payload: &TransactionPayload,
    ) -> Result<TransactionReceipt, WalletError> {
        if !*self.connected.lock().await {
            return Err(WalletError::NotConnected);
        }

        if let Some(err) = self.submit_failures.lock().await.pop_front() {
            debug!("Mock wallet: {} rejected with {}", payload.entry_name(), err);
            return Err(err);
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let sequence = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        let hash = self.transaction_hash(payload, sequence);
        self.submitted.lock().await.push(payload.clone());

        debug!(
            "Mock wallet: {}({}) -> {}",
            payload.entry_name(),
            payload.arguments.join(", "),
            hash
        );
        Ok(TransactionReceipt { hash })
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        *self.connected.lock().await = false;
        debug!("Mock wallet: disconnected");
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        *self.connected.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = "0x2c59";

    #[tokio::test]
    async fn test_connect_returns_account() {
        let wallet = MockWallet::new("0xabc").with_network("mainnet");
        let account = wallet.connect("petra").await.unwrap();

        assert_eq!(account.address, "0xabc");
        assert_eq!(account.network, "mainnet");
        assert!(account.public_key.starts_with("0x"));
        assert!(wallet.is_connected().await);
    }

    #[tokio::test]
    async fn test_not_installed() {
        let wallet = MockWallet::new("0xabc").not_installed();
        assert_eq!(wallet.connect("petra").await, Err(WalletError::NotInstalled));
        assert!(!wallet.is_connected().await);
    }

    #[tokio::test]
    async fn test_submit_requires_connection() {
        let wallet = MockWallet::new("0xabc");
        let payload = TransactionPayload::verify_compliance(CONTRACT, "P1");
        assert_eq!(
            wallet.sign_and_submit(&payload).await,
            Err(WalletError::NotConnected)
        );
    }

    #[tokio::test]
    async fn test_scripted_failures_are_consumed_in_order() {
        let wallet = MockWallet::new("0xabc");
        wallet.connect("petra").await.unwrap();
        wallet.fail_next_submit(WalletError::UserRejected).await;
        wallet.fail_next_submit(WalletError::InsufficientFunds).await;

        let payload = TransactionPayload::verify_compliance(CONTRACT, "P1");
        assert_eq!(wallet.sign_and_submit(&payload).await, Err(WalletError::UserRejected));
        assert_eq!(
            wallet.sign_and_submit(&payload).await,
            Err(WalletError::InsufficientFunds)
        );
        assert!(wallet.sign_and_submit(&payload).await.is_ok());
        assert_eq!(wallet.submitted().await.len(), 1);
    }

    #[tokio::test]
    async fn test_hashes_differ_per_transaction() {
        let wallet = MockWallet::new("0xabc");
        wallet.connect("petra").await.unwrap();

        let payload = TransactionPayload::verify_compliance(CONTRACT, "P1");
        let first = wallet.sign_and_submit(&payload).await.unwrap();
        let second = wallet.sign_and_submit(&payload).await.unwrap();

        assert_eq!(first.hash.len(), 66);
        assert_ne!(first.hash, second.hash);
    }

    #[tokio::test]
    async fn test_disconnect() {
        let wallet = MockWallet::new("0xabc");
        wallet.connect("petra").await.unwrap();
        wallet.disconnect().await.unwrap();
        assert!(!wallet.is_connected().await);

        // Disconnecting twice is fine
        wallet.disconnect().await.unwrap();
    }
}

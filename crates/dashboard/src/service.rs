//! Dashboard operations
//!
//! Every product mutation follows the same path: active session check,
//! in-flight claim on the product, input pre-checks, wallet transaction,
//! and only once the wallet has accepted it, the ledger write.

use access_gate::{GateStatus, Session, SessionManager};
use pharma_common::{address::shorten, Error, Result, WalletError};
use std::sync::Arc;
use std::time::Duration;
use supply_ledger::{LedgerStats, NewProduct, Product, ProductLedger, Temperature};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use wallet::{TransactionPayload, TransactionReceipt, WalletService};

use crate::config::Config;
use crate::inflight::InFlightGuard;

/// Result of a confirmed product operation
#[derive(Debug, Clone)]
pub struct OperationOutcome {
    pub transaction_hash: String,
    pub product: Product,
}

/// Supply chain operations gated by the connected wallet
pub struct SupplyChainService {
    contract_address: String,
    wallet_provider: String,
    connect_timeout: Duration,
    wallet: Arc<dyn WalletService>,
    sessions: Arc<SessionManager>,
    ledger: RwLock<ProductLedger>,
    inflight: InFlightGuard,
}

impl SupplyChainService {
    pub fn new(
        config: &Config,
        wallet: Arc<dyn WalletService>,
        sessions: Arc<SessionManager>,
        ledger: ProductLedger,
    ) -> Self {
        Self {
            contract_address: config.contract_address.clone(),
            wallet_provider: config.wallet_provider.clone(),
            connect_timeout: config.wallet_connect_timeout,
            wallet,
            sessions,
            ledger: RwLock::new(ledger),
            inflight: InFlightGuard::new(),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn inflight(&self) -> &InFlightGuard {
        &self.inflight
    }

    /// Connect the wallet and open a session for it
    ///
    /// A wallet that fails the access check is disconnected again before
    /// the error is returned.
    pub async fn connect(&self, provider: Option<&str>) -> Result<Session> {
        let provider = provider.unwrap_or(&self.wallet_provider);
        info!("Connecting to {} wallet", provider);

        let account = tokio::time::timeout(self.connect_timeout, self.wallet.connect(provider))
            .await
            .map_err(|_| {
                warn!("Wallet approval timed out after {:?}", self.connect_timeout);
                WalletError::ApprovalTimeout
            })??;

        let decision = match self.sessions.verify_access(&account.address).await {
            Ok(decision) => decision,
            Err(e) => {
                self.release_wallet().await;
                return Err(e);
            }
        };

        if !decision.authorized {
            self.release_wallet().await;
            return Err(Error::Unauthorized);
        }

        self.sessions
            .create_session(&account.address, &account.public_key, &account.network)
            .await
    }

    /// Close the session and the wallet connection; safe to repeat
    ///
    /// The wallet is disconnected even when the session record could not be
    /// cleared; the first error is returned.
    pub async fn disconnect(&self) -> Result<()> {
        let session = self.sessions.current_session().await;
        let invalidated = self.sessions.invalidate_session().await;
        let released = self.wallet.disconnect().await;

        invalidated?;
        released?;

        if let Some(session) = session {
            info!("Disconnected {}", shorten(&session.address));
        }
        Ok(())
    }

    /// Reopen the session persisted by a previous run
    ///
    /// The wallet is reconnected, must still report the same account and
    /// must pass the access gate again; otherwise the record is dropped.
    pub async fn restore(&self) -> Result<Option<Session>> {
        let Some(session) = self.sessions.restore_session().await? else {
            return Ok(None);
        };

        let account = match self.wallet.connect(&self.wallet_provider).await {
            Ok(account) => account,
            Err(e) => {
                warn!("Could not reconnect wallet for restored session: {}", e);
                self.sessions.invalidate_session().await?;
                return Ok(None);
            }
        };

        if !account.address.eq_ignore_ascii_case(&session.address) {
            warn!(
                "Wallet now reports {}, dropping session for {}",
                shorten(&account.address),
                shorten(&session.address)
            );
            self.disconnect().await?;
            return Ok(None);
        }

        match self.sessions.verify_access(&account.address).await {
            Ok(decision) if decision.authorized => {}
            Ok(_) => {
                warn!(
                    "{} is no longer authorized, dropping restored session",
                    shorten(&account.address)
                );
                self.disconnect().await?;
                return Ok(None);
            }
            Err(e) => {
                warn!("Access check failed for restored session: {}", e);
                self.disconnect().await?;
                return Ok(None);
            }
        }

        Ok(Some(session))
    }

    /// Disconnect if the current session has been idle too long
    ///
    /// Returns whether a disconnect happened.
    pub async fn expire_idle_session(&self) -> Result<bool> {
        if !self.sessions.is_idle_expired().await {
            return Ok(false);
        }

        info!("Session idle timeout reached, disconnecting");
        self.disconnect().await?;
        Ok(true)
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.sessions.current_session().await
    }

    pub async fn gate_status(&self) -> GateStatus {
        self.sessions.gate_status().await
    }

    pub async fn create_product(&self, product: NewProduct) -> Result<OperationOutcome> {
        let session = self.sessions.require_active_session().await?;
        let _ticket = self.inflight.acquire(&product.id)?;
        self.ledger.read().await.validate_new_product(&product)?;

        let payload = TransactionPayload::create_product(
            &self.contract_address,
            &product.id,
            &product.name,
            &product.batch_number,
            product.manufacturing_date,
            product.expiry_date,
        );
        let receipt = self.submit(&payload).await?;

        let id = product.id.clone();
        let snapshot = self
            .ledger
            .write()
            .await
            .create_product(product, &session.address)
            .inspect_err(|e| self.log_unapplied(&receipt, e))?;

        self.outcome(receipt, snapshot.get(&id).cloned(), &id)
    }

    pub async fn transfer_product(&self, id: &str, new_holder: &str) -> Result<OperationOutcome> {
        require_fields(&[id, new_holder])?;
        self.sessions.require_active_session().await?;
        let _ticket = self.inflight.acquire(id)?;
        let holder = self.ledger.read().await.ensure_transferable(id, new_holder)?;

        let payload =
            TransactionPayload::transfer_product(&self.contract_address, id, holder.as_str());
        let receipt = self.submit(&payload).await?;

        let snapshot = self
            .ledger
            .write()
            .await
            .transfer_product(id, holder.as_str())
            .inspect_err(|e| self.log_unapplied(&receipt, e))?;

        self.outcome(receipt, snapshot.get(id).cloned(), id)
    }

    /// Log a reading given in degrees Celsius
    pub async fn log_temperature(
        &self,
        id: &str,
        celsius: f64,
        location: &str,
    ) -> Result<OperationOutcome> {
        require_fields(&[id, location])?;
        let temperature = Temperature::from_celsius(celsius)?;
        self.sessions.require_active_session().await?;
        let _ticket = self.inflight.acquire(id)?;
        self.ledger.read().await.get_product(id)?;

        let payload = TransactionPayload::log_temperature(
            &self.contract_address,
            id,
            temperature.hundredths(),
            location,
        );
        let receipt = self.submit(&payload).await?;

        let snapshot = self
            .ledger
            .write()
            .await
            .log_temperature(id, temperature, location)
            .inspect_err(|e| self.log_unapplied(&receipt, e))?;

        self.outcome(receipt, snapshot.get(id).cloned(), id)
    }

    pub async fn verify_compliance(&self, id: &str) -> Result<OperationOutcome> {
        require_fields(&[id])?;
        self.sessions.require_active_session().await?;
        let _ticket = self.inflight.acquire(id)?;
        self.ledger.read().await.get_product(id)?;

        let payload = TransactionPayload::verify_compliance(&self.contract_address, id);
        let receipt = self.submit(&payload).await?;

        let snapshot = self
            .ledger
            .write()
            .await
            .verify_compliance(id)
            .inspect_err(|e| self.log_unapplied(&receipt, e))?;

        self.outcome(receipt, snapshot.get(id).cloned(), id)
    }

    /// Products matching `filter`, see [`ProductLedger::list_products`]
    pub async fn list_products(&self, filter: &str) -> Vec<Product> {
        self.ledger.read().await.list_products(filter)
    }

    pub async fn get_product(&self, id: &str) -> Result<Product> {
        self.ledger.read().await.get_product(id).cloned()
    }

    pub async fn stats(&self) -> LedgerStats {
        self.ledger.read().await.stats()
    }

    async fn submit(&self, payload: &TransactionPayload) -> Result<TransactionReceipt> {
        debug!(
            "Submitting {}({})",
            payload.entry_name(),
            payload.arguments.join(", ")
        );

        match self.wallet.sign_and_submit(payload).await {
            Ok(receipt) => {
                info!("{} confirmed: {}", payload.entry_name(), receipt.hash);
                Ok(receipt)
            }
            Err(e) => {
                warn!("{} failed: {}", payload.entry_name(), e);
                Err(e.into())
            }
        }
    }

    fn outcome(
        &self,
        receipt: TransactionReceipt,
        product: Option<Product>,
        id: &str,
    ) -> Result<OperationOutcome> {
        let product = product.ok_or_else(|| Error::NotFound(id.to_string()))?;
        Ok(OperationOutcome {
            transaction_hash: receipt.hash,
            product,
        })
    }

    fn log_unapplied(&self, receipt: &TransactionReceipt, e: &Error) {
        error!(
            "Transaction {} confirmed but not applied to the ledger: {}",
            receipt.hash, e
        );
    }

    async fn release_wallet(&self) {
        if let Err(e) = self.wallet.disconnect().await {
            warn!("Failed to disconnect rejected wallet: {}", e);
        }
    }
}

fn require_fields(values: &[&str]) -> Result<()> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(Error::Validation("Please fill in all fields".to_string()));
    }
    Ok(())
}

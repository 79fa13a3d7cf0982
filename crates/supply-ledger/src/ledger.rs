//! In-memory product ledger
//!
//! The ledger is the single owner of product state. Mutations are applied
//! only after the matching wallet transaction has been accepted, and each
//! one hands back a [`LedgerSnapshot`] of the new state.

use pharma_common::{Address, Error, Result, SharedClock, SystemClock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::{LedgerStats, NewProduct, Product, ProductStatus, Temperature, TemperatureReading};

/// Read-only view of the ledger at one point in time
///
/// Cloning is cheap; snapshots are never affected by later mutations.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    products: Arc<Vec<Product>>,
}

impl LedgerSnapshot {
    /// All products in insertion order
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Products whose id, name or batch number contain `text`, ignoring case
    pub fn filter(&self, text: &str) -> Vec<Product> {
        let needle = text.to_lowercase();
        self.products
            .iter()
            .filter(|p| needle.is_empty() || p.matches_lowercase(&needle))
            .cloned()
            .collect()
    }

    /// Dashboard counters
    pub fn stats(&self) -> LedgerStats {
        let mut stats = LedgerStats {
            total: self.products.len(),
            ..LedgerStats::default()
        };

        for product in self.products.iter() {
            match product.status {
                ProductStatus::Manufactured => stats.manufactured += 1,
                ProductStatus::InTransit => stats.in_transit += 1,
                ProductStatus::Delivered => stats.delivered += 1,
                ProductStatus::Dispensed => stats.dispensed += 1,
            }
            if product.compliance_verified {
                stats.compliant += 1;
            } else {
                stats.non_compliant += 1;
            }
        }

        stats
    }
}

/// Owned store of all known products
pub struct ProductLedger {
    products: Arc<Vec<Product>>,
    index: HashMap<String, usize>,
    clock: SharedClock,
}

impl Default for ProductLedger {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ProductLedger {
    /// Create an empty ledger
    pub fn new(clock: SharedClock) -> Self {
        Self {
            products: Arc::new(Vec::new()),
            index: HashMap::new(),
            clock,
        }
    }

    /// Create a ledger pre-populated with products, e.g. loaded from chain state
    pub fn with_products(clock: SharedClock, products: Vec<Product>) -> Result<Self> {
        let mut ledger = Self::new(clock);
        for product in products {
            if ledger.index.contains_key(&product.id) {
                return Err(Error::DuplicateId(product.id));
            }
            ledger.index.insert(product.id.clone(), ledger.products.len());
            Arc::make_mut(&mut ledger.products).push(product);
        }
        Ok(ledger)
    }

    /// Current state
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            products: Arc::clone(&self.products),
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get_product(&self, id: &str) -> Result<&Product> {
        self.index
            .get(id)
            .map(|&i| &self.products[i])
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Filtered view, see [`LedgerSnapshot::filter`]
    pub fn list_products(&self, filter: &str) -> Vec<Product> {
        self.snapshot().filter(filter)
    }

    pub fn stats(&self) -> LedgerStats {
        self.snapshot().stats()
    }

    /// Checks `create_product` would run, without mutating
    pub fn validate_new_product(&self, product: &NewProduct) -> Result<()> {
        product.validate()?;
        if self.index.contains_key(&product.id) {
            return Err(Error::DuplicateId(product.id.clone()));
        }
        Ok(())
    }

    /// Checks `transfer_product` would run, without mutating
    pub fn ensure_transferable(&self, id: &str, new_holder: &str) -> Result<Address> {
        self.get_product(id)?;
        Address::parse(new_holder)
    }

    /// Insert a new product with status `Manufactured`
    pub fn create_product(&mut self, product: NewProduct, manufacturer: &str) -> Result<LedgerSnapshot> {
        self.validate_new_product(&product)?;

        let id = product.id.clone();
        let record = product.into_product(manufacturer);

        self.index.insert(id.clone(), self.products.len());
        Arc::make_mut(&mut self.products).push(record);

        info!("Created product {} (manufacturer: {})", id, manufacturer);
        Ok(self.snapshot())
    }

    /// Hand a product to a new custodian
    ///
    /// The status is forced to `InTransit` whatever it was before, so a
    /// delivered product that is transferred again goes back in transit.
    pub fn transfer_product(&mut self, id: &str, new_holder: &str) -> Result<LedgerSnapshot> {
        let holder = self.ensure_transferable(id, new_holder)?;

        let product = self.product_mut(id)?;
        let previous = product.status;
        product.status = ProductStatus::InTransit;
        product.current_holder = holder.to_string();

        info!(
            "Transferred product {} to {} ({} -> {})",
            id,
            holder.short(),
            previous,
            ProductStatus::InTransit
        );
        Ok(self.snapshot())
    }

    /// Append a temperature reading stamped with the current time
    ///
    /// Readings are never rejected based on their value.
    pub fn log_temperature(
        &mut self,
        id: &str,
        temperature: Temperature,
        location: &str,
    ) -> Result<LedgerSnapshot> {
        let timestamp = self.clock.now();
        let product = self.product_mut(id)?;

        product.temperature_log.push(TemperatureReading {
            timestamp,
            temperature,
            location: location.to_string(),
        });

        debug!(
            "Logged {} at {} for product {} ({} readings)",
            temperature,
            location,
            id,
            product.temperature_log.len()
        );
        Ok(self.snapshot())
    }

    /// Record the operator's compliance attestation
    pub fn verify_compliance(&mut self, id: &str) -> Result<LedgerSnapshot> {
        let product = self.product_mut(id)?;
        if product.compliance_verified {
            debug!("Product {} already verified", id);
        }
        product.compliance_verified = true;

        info!("Compliance verified for product {}", id);
        Ok(self.snapshot())
    }

    fn product_mut(&mut self, id: &str) -> Result<&mut Product> {
        let i = *self
            .index
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        Ok(&mut Arc::make_mut(&mut self.products)[i])
    }
}

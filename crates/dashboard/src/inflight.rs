//! Per-product in-flight guard
//!
//! At most one wallet transaction per product may be pending. A second
//! request for the same product is refused instead of queued, so no
//! duplicate transaction is ever dispatched.

use pharma_common::{Error, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Set of product ids with a pending transaction
#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    pending: Arc<Mutex<HashSet<String>>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id` for the duration of the returned ticket
    ///
    /// # Returns
    /// * `Err(Error::OperationInFlight)` - another operation holds `id`
    pub fn acquire(&self, id: &str) -> Result<InFlightTicket> {
        if !self.lock().insert(id.to_string()) {
            debug!("Rejected concurrent operation on {}", id);
            return Err(Error::OperationInFlight(id.to_string()));
        }

        Ok(InFlightTicket {
            guard: self.clone(),
            id: id.to_string(),
        })
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Releases its product id when dropped
#[derive(Debug)]
pub struct InFlightTicket {
    guard: InFlightGuard,
    id: String,
}

impl InFlightTicket {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        self.guard.lock().remove(&self.id);
    }
}

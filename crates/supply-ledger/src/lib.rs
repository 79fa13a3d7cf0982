//! Product Ledger
//!
//! Keeps the set of known products and applies lifecycle transitions
//! (create, transfer, log temperature, verify compliance) once the
//! corresponding wallet transaction has been accepted.
//!
//! **Lifecycle:**
//! `Manufactured` → `InTransit` → `Delivered` → `Dispensed`
//!
//! Only the first step is driven by an operation; a transfer always puts the
//! product in transit with its new holder.

pub mod ledger;
pub mod models;

pub use ledger::{LedgerSnapshot, ProductLedger};
pub use models::{LedgerStats, NewProduct, Product, ProductStatus, Temperature, TemperatureReading};

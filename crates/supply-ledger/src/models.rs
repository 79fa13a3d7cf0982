//! Data models for the product ledger

use chrono::{DateTime, Utc};
use pharma_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a product in the supply chain
///
/// Ordered by position in the chain. Only the `Manufactured -> InTransit`
/// step is driven by an operation today; `Delivered` and `Dispensed` are
/// reserved for receiving and dispensing flows that have not been built yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Manufactured,
    InTransit,
    Delivered,
    Dispensed,
}

impl ProductStatus {
    /// Numeric status code used by the on-chain module
    pub fn code(&self) -> u8 {
        match self {
            ProductStatus::Manufactured => 1,
            ProductStatus::InTransit => 2,
            ProductStatus::Delivered => 3,
            ProductStatus::Dispensed => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ProductStatus::Manufactured),
            2 => Some(ProductStatus::InTransit),
            3 => Some(ProductStatus::Delivered),
            4 => Some(ProductStatus::Dispensed),
            _ => None,
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            ProductStatus::Manufactured => "Manufactured",
            ProductStatus::InTransit => "In Transit",
            ProductStatus::Delivered => "Delivered",
            ProductStatus::Dispensed => "Dispensed",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Temperature in hundredths of a degree Celsius
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Temperature(i32);

impl Temperature {
    pub fn from_hundredths(hundredths: i32) -> Self {
        Self(hundredths)
    }

    /// Convert a reading in degrees, rounding to the nearest hundredth
    pub fn from_celsius(celsius: f64) -> Result<Self> {
        if !celsius.is_finite() {
            return Err(Error::Validation("Temperature must be a number".to_string()));
        }
        let hundredths = (celsius * 100.0).round();
        if hundredths < i32::MIN as f64 || hundredths > i32::MAX as f64 {
            return Err(Error::Validation("Temperature is out of range".to_string()));
        }
        Ok(Self(hundredths as i32))
    }

    pub fn hundredths(&self) -> i32 {
        self.0
    }

    pub fn celsius(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°C", self.celsius())
    }
}

/// One entry in a product's temperature log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub timestamp: DateTime<Utc>,
    pub temperature: Temperature,
    pub location: String,
}

/// A tracked product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier
    pub id: String,

    pub name: String,

    pub batch_number: String,

    pub manufacturing_date: DateTime<Utc>,

    pub expiry_date: DateTime<Utc>,

    /// Address that created the product
    pub manufacturer: String,

    /// Address currently holding the product
    pub current_holder: String,

    pub status: ProductStatus,

    /// Append-only, in the order readings were logged
    pub temperature_log: Vec<TemperatureReading>,

    pub compliance_verified: bool,
}

impl Product {
    /// Whether `text` (already lowercased) appears in the id, name or batch number
    pub(crate) fn matches_lowercase(&self, text: &str) -> bool {
        self.id.to_lowercase().contains(text)
            || self.name.to_lowercase().contains(text)
            || self.batch_number.to_lowercase().contains(text)
    }

    /// Most recent temperature reading, if any
    pub fn latest_reading(&self) -> Option<&TemperatureReading> {
        self.temperature_log.last()
    }
}

/// Input for creating a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: String,
    pub name: String,
    pub batch_number: String,
    pub manufacturing_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
}

impl NewProduct {
    /// Check required fields and the date ordering
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("Product ID", &self.id),
            ("Name", &self.name),
            ("Batch number", &self.batch_number),
        ];
        for (label, value) in fields {
            if value.trim().is_empty() {
                return Err(Error::Validation(format!("{} is required", label)));
            }
        }

        if self.manufacturing_date >= self.expiry_date {
            return Err(Error::Validation(
                "Manufacturing date must be before expiry date".to_string(),
            ));
        }

        Ok(())
    }

    pub(crate) fn into_product(self, manufacturer: &str) -> Product {
        Product {
            id: self.id,
            name: self.name,
            batch_number: self.batch_number,
            manufacturing_date: self.manufacturing_date,
            expiry_date: self.expiry_date,
            manufacturer: manufacturer.to_string(),
            current_holder: manufacturer.to_string(),
            status: ProductStatus::Manufactured,
            temperature_log: Vec::new(),
            compliance_verified: false,
        }
    }
}

/// Counters shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total: usize,
    pub manufactured: usize,
    pub in_transit: usize,
    pub delivered: usize,
    pub dispensed: usize,
    pub compliant: usize,
    pub non_compliant: usize,
}

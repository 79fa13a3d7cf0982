//! Entry-function payloads for the on-chain `supply_chain` module

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// On-chain module holding the supply chain entry functions
pub const MODULE_NAME: &str = "supply_chain";

/// Entry functions exposed by the module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryFunction {
    CreateProduct,
    TransferProduct,
    LogTemperature,
    VerifyCompliance,
}

impl EntryFunction {
    pub fn name(&self) -> &'static str {
        match self {
            EntryFunction::CreateProduct => "create_product",
            EntryFunction::TransferProduct => "transfer_product",
            EntryFunction::LogTemperature => "log_temperature",
            EntryFunction::VerifyCompliance => "verify_compliance",
        }
    }
}

impl fmt::Display for EntryFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Transaction payload handed to the wallet for signing
///
/// Arguments are stringified and their order is fixed per entry function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    #[serde(rename = "type")]
    pub payload_type: String,

    /// Fully qualified function: `<contract>::supply_chain::<entry>`
    pub function: String,

    pub arguments: Vec<String>,

    pub type_arguments: Vec<String>,
}

impl TransactionPayload {
    fn entry(contract_address: &str, entry: EntryFunction, arguments: Vec<String>) -> Self {
        Self {
            payload_type: "entry_function_payload".to_string(),
            function: format!("{}::{}::{}", contract_address, MODULE_NAME, entry.name()),
            arguments,
            type_arguments: Vec::new(),
        }
    }

    /// `create_product(id, name, batch, mfg_seconds, exp_seconds)`
    pub fn create_product(
        contract_address: &str,
        id: &str,
        name: &str,
        batch_number: &str,
        manufacturing_date: DateTime<Utc>,
        expiry_date: DateTime<Utc>,
    ) -> Self {
        Self::entry(
            contract_address,
            EntryFunction::CreateProduct,
            vec![
                id.to_string(),
                name.to_string(),
                batch_number.to_string(),
                manufacturing_date.timestamp().to_string(),
                expiry_date.timestamp().to_string(),
            ],
        )
    }

    /// `transfer_product(id, new_holder)`
    pub fn transfer_product(contract_address: &str, id: &str, new_holder: &str) -> Self {
        Self::entry(
            contract_address,
            EntryFunction::TransferProduct,
            vec![id.to_string(), new_holder.to_string()],
        )
    }

    /// `log_temperature(id, temp_hundredths, location)`
    pub fn log_temperature(
        contract_address: &str,
        id: &str,
        temperature_hundredths: i32,
        location: &str,
    ) -> Self {
        Self::entry(
            contract_address,
            EntryFunction::LogTemperature,
            vec![
                id.to_string(),
                temperature_hundredths.to_string(),
                location.to_string(),
            ],
        )
    }

    /// `verify_compliance(id)`
    pub fn verify_compliance(contract_address: &str, id: &str) -> Self {
        Self::entry(
            contract_address,
            EntryFunction::VerifyCompliance,
            vec![id.to_string()],
        )
    }

    /// Entry function name, the last path segment of `function`
    pub fn entry_name(&self) -> &str {
        self.function.rsplit("::").next().unwrap_or(&self.function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const CONTRACT: &str = "0x2c599a0825f51f62c54da3f56a623568d91437bf084e63daf2204a0d63800584";

    #[test]
    fn test_create_product_arguments() {
        let mfg = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let exp = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let payload = TransactionPayload::create_product(CONTRACT, "P1", "Aspirin", "B1", mfg, exp);

        assert_eq!(payload.function, format!("{}::supply_chain::create_product", CONTRACT));
        assert_eq!(
            payload.arguments,
            vec!["P1", "Aspirin", "B1", "1704067200", "1735689600"]
        );
        assert!(payload.type_arguments.is_empty());
        assert_eq!(payload.entry_name(), "create_product");
    }

    #[test]
    fn test_log_temperature_uses_hundredths() {
        let payload = TransactionPayload::log_temperature(CONTRACT, "P1", 2250, "Warehouse");
        assert_eq!(payload.arguments, vec!["P1", "2250", "Warehouse"]);
        assert_eq!(payload.entry_name(), "log_temperature");
    }

    #[test]
    fn test_payload_json_shape() {
        let payload = TransactionPayload::verify_compliance(CONTRACT, "P1");
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["type"], "entry_function_payload");
        assert_eq!(json["function"], format!("{}::supply_chain::verify_compliance", CONTRACT));
        assert_eq!(json["arguments"], serde_json::json!(["P1"]));
        assert_eq!(json["typeArguments"], serde_json::json!([]));
    }
}

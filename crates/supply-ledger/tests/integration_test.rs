//! Lifecycle scenarios against the public ledger API

use chrono::{Duration, TimeZone, Utc};
use pharma_common::ManualClock;
use std::sync::Arc;
use supply_ledger::{NewProduct, ProductLedger, ProductStatus, Temperature};

#[test]
fn test_create_transfer_log_scenario() {
    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let clock = ManualClock::new(t0);
    let mut ledger = ProductLedger::new(Arc::new(clock.clone()));

    ledger
        .create_product(
            NewProduct {
                id: "P1".to_string(),
                name: "Aspirin".to_string(),
                batch_number: "B1".to_string(),
                manufacturing_date: t0,
                expiry_date: t0 + Duration::seconds(1000),
            },
            "0x1234567890abcdef",
        )
        .expect("create");

    ledger.transfer_product("P1", "0xABC").expect("transfer");

    clock.advance(Duration::seconds(5));
    let temperature = Temperature::from_celsius(22.5).unwrap();
    let snapshot = ledger
        .log_temperature("P1", temperature, "Warehouse")
        .expect("log temperature");

    let product = snapshot.get("P1").expect("product present");
    assert_eq!(product.status, ProductStatus::InTransit);
    assert_eq!(product.current_holder, "0xABC");
    assert_eq!(product.temperature_log.len(), 1);

    let reading = &product.temperature_log[0];
    assert_eq!(reading.temperature.hundredths(), 2250);
    assert_eq!(reading.location, "Warehouse");
    assert_eq!(reading.timestamp, t0 + Duration::seconds(5));
}

#[test]
fn test_product_json_shape() {
    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let mut ledger = ProductLedger::new(Arc::new(ManualClock::new(t0)));
    let snapshot = ledger
        .create_product(
            NewProduct {
                id: "PROD001".to_string(),
                name: "Aspirin 500mg".to_string(),
                batch_number: "BATCH001".to_string(),
                manufacturing_date: t0,
                expiry_date: t0 + Duration::days(365),
            },
            "0x1234567890abcdef",
        )
        .unwrap();

    let json = serde_json::to_value(snapshot.get("PROD001").unwrap()).unwrap();
    assert_eq!(json["batch_number"], "BATCH001");
    assert_eq!(json["current_holder"], "0x1234567890abcdef");
    assert_eq!(json["status"], "manufactured");
    assert_eq!(json["compliance_verified"], false);
    assert!(json["temperature_log"].as_array().unwrap().is_empty());
}

//! Wallet Service
//!
//! The wallet holds the user's keys and signs transactions on their behalf.
//! This crate defines what the dashboard needs from it:
//!
//! - `payload`: entry-function payloads for the `supply_chain` module
//! - `service`: the [`WalletService`] trait and its result types
//! - `mock`: in-process wallet for development and tests

pub mod mock;
pub mod payload;
pub mod service;

pub use mock::MockWallet;
pub use payload::{EntryFunction, TransactionPayload};
pub use service::{TransactionReceipt, WalletAccount, WalletService};

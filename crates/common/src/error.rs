use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failures reported by the external wallet
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Wallet extension is not installed")]
    NotInstalled,

    #[error("Request rejected by user")]
    UserRejected,

    #[error("Insufficient funds to pay for the transaction")]
    InsufficientFunds,

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Wallet approval timed out")]
    ApprovalTimeout,

    #[error("Transaction failed: {0}")]
    Transaction(String),
}

impl WalletError {
    /// Notification text shown to the user for this failure
    pub fn user_message(&self) -> String {
        match self {
            WalletError::NotInstalled => {
                "Wallet is not installed. Please install the wallet extension and try again."
                    .to_string()
            }
            WalletError::UserRejected => "Transaction was cancelled by user".to_string(),
            WalletError::InsufficientFunds => {
                "Insufficient funds to complete the transaction".to_string()
            }
            WalletError::NotConnected => "Please connect your wallet first".to_string(),
            WalletError::ApprovalTimeout => {
                "Connection approval timed out. Please try again.".to_string()
            }
            WalletError::Transaction(msg) => format!("Transaction failed: {}", msg),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Product already exists: {0}")]
    DuplicateId(String),

    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Account temporarily locked until {until}")]
    LockedOut { until: DateTime<Utc> },

    #[error("Session expired")]
    SessionExpired,

    #[error("No wallet session is active")]
    NotConnected,

    #[error("Wallet address is not authorized")]
    Unauthorized,

    #[error("Another operation is already in progress for {0}")]
    OperationInFlight(String),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Stable discriminant used by API clients
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::DuplicateId(_) => "duplicate_id",
            Error::NotFound(_) => "not_found",
            Error::InvalidAddress(_) => "invalid_address",
            Error::LockedOut { .. } => "locked_out",
            Error::SessionExpired => "session_expired",
            Error::NotConnected => "not_connected",
            Error::Unauthorized => "unauthorized",
            Error::OperationInFlight(_) => "operation_in_flight",
            Error::Wallet(WalletError::NotInstalled) => "wallet_not_installed",
            Error::Wallet(WalletError::UserRejected) => "user_rejected",
            Error::Wallet(WalletError::InsufficientFunds) => "insufficient_funds",
            Error::Wallet(WalletError::NotConnected) => "not_connected",
            Error::Wallet(WalletError::ApprovalTimeout) => "approval_timeout",
            Error::Wallet(WalletError::Transaction(_)) => "transaction_error",
            Error::Storage(_) => "storage_error",
            Error::JsonSerialization(_) => "serialization_error",
            Error::Other(_) => "internal_error",
        }
    }

    /// Notification text shown to the user
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            Error::DuplicateId(id) => format!("A product with ID {} already exists", id),
            Error::NotFound(id) => format!("Product {} was not found", id),
            Error::InvalidAddress(addr) => format!("{} is not a valid wallet address", addr),
            Error::LockedOut { .. } => {
                "Account temporarily locked due to too many failed attempts".to_string()
            }
            Error::SessionExpired => "Your session has expired. Please reconnect.".to_string(),
            Error::NotConnected => "Please connect your wallet first!".to_string(),
            Error::Unauthorized => "Unauthorized wallet address. Access denied.".to_string(),
            Error::OperationInFlight(id) => {
                format!("A transaction for {} is already being processed", id)
            }
            Error::Wallet(e) => e.user_message(),
            Error::Storage(_) | Error::JsonSerialization(_) | Error::Other(_) => {
                "Unexpected error, please try again".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

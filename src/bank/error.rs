//! Errors returned by the ledger engine.
use thiserror::Error;

use crate::bank::{AccountNumber, CustomerId};

/// Errors that can occur while applying a ledger operation.
///
/// Every variant except [`LedgerError::Snapshot`] is an expected outcome of caller input.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Password must be at least 8 characters and contain letters and digits")]
    WeakCredential,
    #[error("Invalid customer id or password")]
    AuthFailed,
    #[error("No active session")]
    NoSession,
    #[error("Account {0} not found")]
    NotFound(AccountNumber),
    #[error("Account {0} belongs to another customer")]
    Forbidden(AccountNumber),
    #[error("Amount must be positive")]
    InvalidAmount,
    #[error("Insufficient funds for transaction")]
    InsufficientFunds,
    #[error("Source and destination account are the same")]
    SameAccount,
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Errors raised while reading or writing the snapshot file.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Customer {0} appears more than once")]
    DuplicateCustomer(CustomerId),
    #[error("Account {0} appears more than once")]
    DuplicateAccount(AccountNumber),
    #[error("Account {account} refers to unknown customer {customer}")]
    OrphanAccount {
        account: AccountNumber,
        customer: CustomerId,
    },
    #[error("Account {0} has a negative balance")]
    NegativeBalance(AccountNumber),
}

/// Errors raised while reading configuration overrides.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Errors raised while interpreting a scripted command.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Missing {0} column")]
    MissingField(&'static str),
    #[error("Invalid amount {0:?}")]
    InvalidAmount(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

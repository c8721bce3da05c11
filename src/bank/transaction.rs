//! Transaction records kept in account histories and transfers awaiting application.
use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bank::{
    AccountNumber, LedgerError,
    types::{Money, deserialize_money, serialize_money},
};

/// Enum representing the kind of a history record.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
}

/// One entry in an account's history. Immutable once appended.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    #[serde(rename = "type")]
    kind: TransactionKind,

    /// Signed: negative for money leaving the account.
    #[serde(serialize_with = "serialize_money", deserialize_with = "deserialize_money")]
    amount: Money,

    description: String,

    timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(kind: TransactionKind, amount: Money, description: impl Into<String>) -> Self {
        TransactionRecord {
            kind,
            amount,
            description: description.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn deposit(amount: Money) -> Self {
        Self::new(TransactionKind::Deposit, amount, "Cash deposit")
    }

    pub fn withdrawal(amount: Money) -> Self {
        Self::new(TransactionKind::Withdrawal, -amount, "Cash withdrawal")
    }

    pub fn transfer_out(amount: Money, to: &str) -> Self {
        Self::new(TransactionKind::TransferOut, -amount, format!("Transfer to {to}"))
    }

    pub fn transfer_in(amount: Money, from: &str) -> Self {
        Self::new(TransactionKind::TransferIn, amount, format!("Transfer from {from}"))
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Sequence number handed out when a transfer is submitted.
pub type Ticket = u64;

/// A transfer waiting in the priority heap or the FIFO queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransfer {
    /// Submission order, used to break ties between equal amounts.
    pub ticket: Ticket,
    /// The debited account.
    pub from: AccountNumber,
    /// The credited account.
    pub to: AccountNumber,
    /// The amount to move, always positive.
    pub amount: Money,
    /// Whether the amount exceeded the priority threshold at submission.
    pub priority: bool,
}

/// Larger amounts first; equal amounts by submission order.
impl Ord for PendingTransfer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.amount
            .cmp(&other.amount)
            .then_with(|| other.ticket.cmp(&self.ticket))
    }
}

impl PartialOrd for PendingTransfer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// What happened to one pending transfer when the backlog was drained.
#[derive(Debug)]
pub struct TransferOutcome {
    /// The transfer as it was submitted.
    pub transfer: PendingTransfer,
    /// `Ok` if the transfer was applied; otherwise why it was skipped.
    pub result: Result<(), LedgerError>,
}

impl TransferOutcome {
    pub fn is_applied(&self) -> bool {
        self.result.is_ok()
    }
}

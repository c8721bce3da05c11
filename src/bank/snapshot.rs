//! JSON snapshot of the full ledger state.
//!
//! The document has two collections, `customers` and `accounts`. It is rewritten in
//! full after every successful mutation: the new content goes to a sibling temporary
//! file which then replaces the snapshot, so a crash mid-write leaves the previous
//! snapshot intact.
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bank::{
    Account, AccountNumber, Customer, CustomerId, SnapshotError, TransactionRecord,
    types::{Money, deserialize_money, serialize_money},
};

/// A persisted customer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    /// The unique customer identifier.
    pub customer_id: CustomerId,

    /// The display name.
    pub name: String,

    /// Hex-encoded SHA-256 of the password.
    pub password_hash: String,
}

/// A persisted account with its full history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AccountRecord {
    /// The unique account number.
    pub account_number: AccountNumber,

    /// The owning customer, which must appear in the customer list.
    pub customer_id: CustomerId,

    /// The balance at the time of the write.
    #[serde(serialize_with = "serialize_money", deserialize_with = "deserialize_money")]
    pub balance: Money,

    /// Transaction records, oldest first.
    #[serde(default)]
    pub transaction_history: Vec<TransactionRecord>,
}

/// The whole snapshot document.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Every registered customer.
    #[serde(default)]
    pub customers: Vec<CustomerRecord>,

    /// Every account, across all customers.
    #[serde(default)]
    pub accounts: Vec<AccountRecord>,
}

impl Snapshot {
    /// Builds a snapshot from entities, sorted by identifier so output is stable.
    pub fn capture<'a>(
        customers: impl IntoIterator<Item = &'a Customer>,
        accounts: impl IntoIterator<Item = &'a Account>,
    ) -> Self {
        let mut customers: Vec<CustomerRecord> = customers
            .into_iter()
            .map(|customer| CustomerRecord {
                customer_id: customer.customer_id().clone(),
                name: customer.name().to_string(),
                password_hash: customer.password_hash().to_string(),
            })
            .collect();
        customers.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));

        let mut accounts: Vec<AccountRecord> = accounts
            .into_iter()
            .map(|account| AccountRecord {
                account_number: account.account_number().clone(),
                customer_id: account.customer_id().clone(),
                balance: account.balance(),
                transaction_history: account.history().cloned().collect(),
            })
            .collect();
        accounts.sort_by(|a, b| a.account_number.cmp(&b.account_number));

        Snapshot {
            customers,
            accounts,
        }
    }

    /// Reads the snapshot at `path`. A missing file yields `Ok(None)`.
    ///
    /// Only the document shape is checked here; see [`Snapshot::validate`].
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        debug!(
            path = %path.display(),
            customers = snapshot.customers.len(),
            accounts = snapshot.accounts.len(),
            "Snapshot loaded"
        );
        Ok(Some(snapshot))
    }

    /// Writes the snapshot to `path`, replacing any previous content.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        let tmp = temporary_path(path);
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "Snapshot written");
        Ok(())
    }

    /// Checks identifier uniqueness, ownership references and balance sign.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut customers: HashSet<&CustomerId> = HashSet::with_capacity(self.customers.len());
        for record in &self.customers {
            if !customers.insert(&record.customer_id) {
                return Err(SnapshotError::DuplicateCustomer(record.customer_id.clone()));
            }
        }

        let mut accounts: HashSet<&AccountNumber> = HashSet::with_capacity(self.accounts.len());
        for record in &self.accounts {
            if !accounts.insert(&record.account_number) {
                return Err(SnapshotError::DuplicateAccount(record.account_number.clone()));
            }
            if !customers.contains(&record.customer_id) {
                return Err(SnapshotError::OrphanAccount {
                    account: record.account_number.clone(),
                    customer: record.customer_id.clone(),
                });
            }
            if record.balance < 0 {
                return Err(SnapshotError::NegativeBalance(record.account_number.clone()));
            }
        }
        Ok(())
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

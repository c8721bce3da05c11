//! Customers, accounts and the balance rules applied to them.
use serde::Serialize;

use crate::bank::{
    AccountNumber, CustomerId, FifoQueue, LedgerError, Money, TransactionRecord,
    auth::{hash_password, verify_password},
    types::serialize_money,
};

/// A registered customer.
#[derive(Debug, Clone)]
pub struct Customer {
    customer_id: CustomerId,
    name: String,
    password_hash: String,
    /// Account numbers owned by this customer, in creation order.
    accounts: Vec<AccountNumber>,
}

impl Customer {
    /// Creates a customer, hashing the plaintext password.
    pub fn new(customer_id: CustomerId, name: impl Into<String>, password: &str) -> Self {
        Self::with_hash(customer_id, name, hash_password(password))
    }

    /// Creates a customer from an already hashed password.
    pub fn with_hash(
        customer_id: CustomerId,
        name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Customer {
            customer_id,
            name: name.into(),
            password_hash: password_hash.into(),
            accounts: Vec::new(),
        }
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn accounts(&self) -> &[AccountNumber] {
        &self.accounts
    }

    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }

    pub(crate) fn add_account(&mut self, account_number: AccountNumber) {
        if !self.accounts.contains(&account_number) {
            self.accounts.push(account_number);
        }
    }
}

/// Represents a bank account owned by a customer.
///
/// Serializes as an `account,customer,balance` summary row.
#[derive(Serialize, Debug, Clone)]
pub struct Account {
    /// The unique account number.
    #[serde(rename = "account")]
    account_number: AccountNumber,

    /// The owning customer. Never changes after creation.
    #[serde(rename = "customer")]
    customer_id: CustomerId,

    /// The current balance, never negative.
    #[serde(serialize_with = "serialize_money")]
    balance: Money,

    /// Transaction records, oldest first.
    #[serde(skip)]
    history: FifoQueue<TransactionRecord>,
}

impl Account {
    /// Creates an empty account for the given customer.
    pub fn new(account_number: AccountNumber, customer_id: CustomerId) -> Self {
        Account {
            account_number,
            customer_id,
            balance: 0,
            history: FifoQueue::new(),
        }
    }

    /// Restores an account as persisted.
    pub(crate) fn restore(
        account_number: AccountNumber,
        customer_id: CustomerId,
        balance: Money,
        history: impl IntoIterator<Item = TransactionRecord>,
    ) -> Self {
        Account {
            account_number,
            customer_id,
            balance,
            history: history.into_iter().collect(),
        }
    }

    pub fn account_number(&self) -> &AccountNumber {
        &self.account_number
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    /// History in chronological order.
    pub fn history(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Deposits `amount` and records it. Returns the new balance.
    pub fn deposit(&mut self, amount: Money) -> Result<Money, LedgerError> {
        self.credit(amount)?;
        self.history.enqueue(TransactionRecord::deposit(amount));
        Ok(self.balance)
    }

    /// Withdraws `amount` and records it. Returns an error if there are insufficient funds.
    pub fn withdraw(&mut self, amount: Money) -> Result<Money, LedgerError> {
        self.debit(amount)?;
        self.history.enqueue(TransactionRecord::withdrawal(amount));
        Ok(self.balance)
    }

    /// Checks that `amount` can be debited without touching the balance.
    pub(crate) fn check_debit(&self, amount: Money) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if self.balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        Ok(())
    }

    /// Checks that `amount` can be credited without overflowing.
    pub(crate) fn check_credit(&self, amount: Money) -> Result<(), LedgerError> {
        if amount <= 0 || self.balance.checked_add(amount).is_none() {
            return Err(LedgerError::InvalidAmount);
        }
        Ok(())
    }

    fn credit(&mut self, amount: Money) -> Result<(), LedgerError> {
        self.check_credit(amount)?;
        self.balance += amount;
        Ok(())
    }

    fn debit(&mut self, amount: Money) -> Result<(), LedgerError> {
        self.check_debit(amount)?;
        self.balance -= amount;
        Ok(())
    }

    /// Debit half of a transfer. The caller must already have checked both halves.
    pub(crate) fn transfer_out(&mut self, amount: Money, to: &str) -> Result<(), LedgerError> {
        self.debit(amount)?;
        self.history.enqueue(TransactionRecord::transfer_out(amount, to));
        Ok(())
    }

    /// Credit half of a transfer. The caller must already have checked both halves.
    pub(crate) fn transfer_in(&mut self, amount: Money, from: &str) -> Result<(), LedgerError> {
        self.credit(amount)?;
        self.history.enqueue(TransactionRecord::transfer_in(amount, from));
        Ok(())
    }
}

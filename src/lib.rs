//! In-memory banking ledger with snapshot persistence.
pub mod bank;
